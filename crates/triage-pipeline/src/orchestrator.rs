//! Pipeline orchestrator
//!
//! Sequences the four analysis stages and triggers asynchronous
//! escalation based on the final report's classification. Stage order is
//! fixed: runbook matching consumes stage 1's error signals, and synthesis
//! consumes everything. Escalation is fire-and-forget; its latency and its
//! failures never reach the caller.

use crate::stages::{CommitContextFetcher, RunbookMatcher, SignalExtractor, Synthesizer};
use crate::traits::{EscalationChannel, ReasoningEngine, RunbookIndex, SourceControl};
use std::sync::Arc;
use triage_core::config::TriageConfig;
use triage_core::types::{AnalysisContext, RcaReport};

/// The multi-stage analysis pipeline
pub struct PipelineOrchestrator {
    signals: SignalExtractor,
    commits: CommitContextFetcher,
    runbooks: RunbookMatcher,
    synthesizer: Synthesizer,
    escalation: Arc<dyn EscalationChannel>,
}

impl PipelineOrchestrator {
    /// Wire the pipeline to its collaborators
    #[must_use]
    pub fn new(
        engine: Arc<dyn ReasoningEngine>,
        source: Arc<dyn SourceControl>,
        index: Arc<dyn RunbookIndex>,
        escalation: Arc<dyn EscalationChannel>,
        config: &TriageConfig,
    ) -> Self {
        Self {
            signals: SignalExtractor::new(Arc::clone(&engine), config.prefilter_context_lines),
            commits: CommitContextFetcher::new(source, config.commit_fetch_limit),
            runbooks: RunbookMatcher::new(index, config.runbook_top_k),
            synthesizer: Synthesizer::new(engine),
            escalation,
        }
    }

    /// Run the full RCA pipeline and return the synthesized report
    ///
    /// Always returns a report; stages 1-3 degrade in place and a
    /// synthesis failure yields the terminal error-shaped report. When the
    /// report confirms a deployment regression, a voice alert is
    /// dispatched on a detached task before this returns.
    pub async fn analyze(
        &self,
        service: &str,
        repo: &str,
        log_text: &str,
        context: &AnalysisContext,
    ) -> RcaReport {
        tracing::info!(service, repo, "starting rca pipeline");

        tracing::debug!("stage 1: analyzing logs");
        let log_analysis = self.signals.analyze(log_text).await;

        tracing::debug!("stage 2: fetching commits");
        let commit_analysis = self.commits.analyze(repo).await;

        tracing::debug!("stage 3: searching runbooks");
        let runbook_matches = self.runbooks.search(&log_analysis.error_signals).await;

        tracing::debug!("stage 4: synthesizing root cause");
        let report = self
            .synthesizer
            .synthesize(service, &log_analysis, &commit_analysis, &runbook_matches, context)
            .await;

        if report.is_deployment_classified() {
            self.dispatch_escalation(service, &report);
        }

        tracing::info!(service, status_failure = report.is_failure(), "rca pipeline completed");
        report
    }

    /// Spawn the escalation call without awaiting it
    fn dispatch_escalation(&self, service: &str, report: &RcaReport) {
        let message = alert_message(service, report);
        let channel = Arc::clone(&self.escalation);
        tokio::spawn(async move {
            match channel.send_voice_alert(&message).await {
                Ok(true) => tracing::info!("escalation voice alert dispatched"),
                Ok(false) => tracing::warn!("escalation channel declined the alert"),
                Err(e) => tracing::error!(error = %e, "escalation dispatch failed"),
            }
        });
    }
}

/// Short natural-language alert for the voice channel
#[must_use]
pub fn alert_message(service: &str, report: &RcaReport) -> String {
    let commit = report
        .suspect_commit
        .as_ref()
        .map_or_else(|| "unknown".to_string(), |c| c.sha.clone());
    format!(
        "Critical alert. Deployment regression detected in service {service}. \
         Suspect commit {commit}. Root cause: {}.",
        report.root_cause
    )
}
