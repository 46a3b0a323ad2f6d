//! Stage 4: report synthesis
//!
//! Fuses the three upstream results plus optional deployment context into
//! the final RCA report. Unlike stages 1-3, a failure here is terminal:
//! it becomes the error-shaped report returned to the caller, not a
//! re-run.

use crate::traits::ReasoningEngine;
use chrono::Utc;
use std::fmt::Write as _;
use std::sync::Arc;
use triage_core::error::TriageError;
use triage_core::types::{
    AnalysisContext, CommitAnalysis, LogAnalysis, RcaReport, RunbookMatch,
};

const STANDARD_SYSTEM_PROMPT: &str = r#"You are a senior SRE conducting root cause analysis.

Synthesize all evidence to determine:
1. Root cause of the failure
2. Contributing factors
3. Recommended fixes
4. Confidence level

Be precise, technical, and actionable. Cite specific log lines, commits, or runbook sections.

Return ONLY valid JSON:
{
    "root_cause": "primary cause",
    "confidence": "high|medium|low",
    "contributing_factors": ["factor1", "factor2"],
    "evidence": {
        "logs": "key log evidence",
        "commits": "relevant commits",
        "runbooks": "applicable runbooks"
    },
    "recommended_actions": ["action1", "action2"],
    "timeline": "estimated sequence of events"
}"#;

const DEPLOYMENT_SYSTEM_PROMPT: &str = r#"You are a senior SRE analyzing a DEPLOYMENT REGRESSION.

This error occurred within minutes of a code deployment.

Your primary task is to:
1. Analyze the COMMIT DIFF to find the exact code change that caused the failure
2. Compare the stacktrace with the modified files and lines
3. Determine if this is definitely caused by the deployment or coincidental
4. Provide a clear ROLLBACK RECOMMENDATION

Reference specific file names, line numbers, and error messages that match the changed code.

Return ONLY valid JSON:
{
    "root_cause": "specific code change that caused the failure",
    "is_deployment_caused": true,
    "confidence": "high|medium|low",
    "contributing_factors": ["factor1", "factor2"],
    "evidence": {
        "logs": "key log evidence",
        "diff": "relevant code changes",
        "runbooks": "applicable runbooks"
    },
    "recommended_actions": [
        "IMMEDIATE: action",
        "ROLLBACK: git revert command or steps",
        "FIX: how to fix the issue"
    ],
    "timeline": "estimated sequence of events"
}"#;

/// Synthesizer stage
pub struct Synthesizer {
    engine: Arc<dyn ReasoningEngine>,
}

impl Synthesizer {
    /// Create the stage
    #[must_use]
    pub fn new(engine: Arc<dyn ReasoningEngine>) -> Self {
        Self { engine }
    }

    /// Produce the final report from all upstream evidence
    ///
    /// On engine or parse failure this returns [`RcaReport::failed`]; the
    /// failure never propagates as an error.
    pub async fn synthesize(
        &self,
        service: &str,
        log_analysis: &LogAnalysis,
        commit_analysis: &CommitAnalysis,
        runbooks: &[RunbookMatch],
        context: &AnalysisContext,
    ) -> RcaReport {
        let system_prompt = if context.deployment.is_some() {
            DEPLOYMENT_SYSTEM_PROMPT
        } else {
            STANDARD_SYSTEM_PROMPT
        };
        let user_prompt = build_user_prompt(service, log_analysis, commit_analysis, runbooks, context);

        let outcome = self
            .engine
            .invoke_structured(system_prompt, &user_prompt)
            .await
            .and_then(|value| {
                serde_json::from_value::<RcaReport>(value)
                    .map_err(|e| TriageError::StructuredResponse(e.to_string()))
            });

        let mut report = match outcome {
            Ok(mut report) => {
                // The deployment classification is only trustworthy on a
                // parsed report; a failed synthesis confirms nothing.
                if let Some(deployment) = &context.deployment {
                    report.is_deployment_regression = true;
                    report.suspect_commit = Some(deployment.suspect_commit.clone());
                }
                report
            }
            Err(e) => {
                tracing::error!(error = %e, "synthesis failed");
                RcaReport::failed(service, e.to_string())
            }
        };

        report.service = service.to_string();
        report.analyzed_at = Utc::now();
        report.environment = context.environment.clone();
        report.request_id = context.request_id.clone();
        report.ingestion_mode = context.ingestion_mode;

        if !report.is_failure() {
            tracing::info!(confidence = %report.confidence, "rca synthesis completed");
        }
        report
    }
}

fn build_user_prompt(
    service: &str,
    log_analysis: &LogAnalysis,
    commit_analysis: &CommitAnalysis,
    runbooks: &[RunbookMatch],
    context: &AnalysisContext,
) -> String {
    let mut prompt = format!("Service: {service}\n");

    let metadata = format_metadata(context);
    if !metadata.is_empty() {
        let _ = write!(prompt, "\nERROR CONTEXT (AUTOMATED CAPTURE):\n{metadata}\n");
    }

    let _ = write!(
        prompt,
        "\nLOG ANALYSIS:\n{}\n\nRECENT COMMITS:\n{}\n\nRUNBOOK MATCHES:\n{}\n\nProvide root cause analysis in JSON format.",
        format_log_analysis(log_analysis),
        format_commits(commit_analysis),
        format_runbooks(runbooks),
    );
    prompt
}

fn format_metadata(context: &AnalysisContext) -> String {
    let mut lines = Vec::new();
    if let Some(timestamp) = context.error_timestamp {
        lines.push(format!("Timestamp: {timestamp}"));
    }
    if let Some(environment) = &context.environment {
        lines.push(format!("Environment: {environment}"));
    }
    if let Some(endpoint) = &context.endpoint {
        let method = context.method.as_deref().unwrap_or("UNKNOWN");
        lines.push(format!("Endpoint: {method} {endpoint}"));
    }
    if let Some(user_id) = &context.user_id {
        lines.push(format!("Affected User: {user_id}"));
    }
    if let Some(request_id) = &context.request_id {
        lines.push(format!("Request ID: {request_id}"));
    }
    lines.join("\n")
}

fn format_log_analysis(analysis: &LogAnalysis) -> String {
    format!(
        "Error Signals: {}\nKey Errors: {}\nPatterns: {}",
        analysis.error_signals.join(", "),
        analysis.key_errors.join(", "),
        analysis.patterns.join(", "),
    )
}

fn format_commits(analysis: &CommitAnalysis) -> String {
    if analysis.commits.is_empty() {
        return "No commits available".to_string();
    }
    analysis
        .commits
        .iter()
        .take(5)
        .map(|c| format!("- {}: {} ({})", c.sha, c.message, c.author))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_runbooks(runbooks: &[RunbookMatch]) -> String {
    if runbooks.is_empty() {
        return "No matching runbooks".to_string();
    }
    runbooks
        .iter()
        .map(|r| {
            let snippet: String = r.snippet.chars().take(200).collect();
            format!("- {}: {}", r.title, snippet)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
