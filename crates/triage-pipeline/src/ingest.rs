//! Ingestion service
//!
//! The entrypoint for inbound error events and deployment announcements.
//! An error event first consults the watch registry; if a deployment is
//! under watch its commit diff is fetched and folded into the log text
//! and metadata, the error is recorded against the watch, and the
//! pipeline runs with deployment context. Every call returns an outcome
//! with a status and a processing-time measurement, even on total
//! failure; outcomes land in a bounded report history.

use crate::orchestrator::PipelineOrchestrator;
use crate::traits::{EscalationChannel, ReasoningEngine, RunbookIndex, SourceControl};
use chrono::Utc;
use parking_lot::Mutex;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;
use triage_core::config::TriageConfig;
use triage_core::error::TriageError;
use triage_core::types::{
    AnalysisContext, AnnouncementReceipt, CommitDiff, DeploymentAnnouncement, DeploymentContext,
    DeploymentRecord, ErrorEvent, IngestOutcome, IngestStatus, SuspectCommit, WatchedError,
};
use triage_watch::history::BoundedHistory;
use triage_watch::registry::{DeploymentWatchRegistry, WatchStatus};

/// Ingestion service owning the process-wide triage state
///
/// Created once at process start; the registry and both history stores
/// live for the process lifetime and reset on restart.
pub struct IngestService {
    config: TriageConfig,
    registry: Arc<DeploymentWatchRegistry>,
    pipeline: PipelineOrchestrator,
    source: Arc<dyn SourceControl>,
    reports: Mutex<BoundedHistory<IngestOutcome>>,
}

impl IngestService {
    /// Wire the service to its collaborators
    #[must_use]
    pub fn new(
        config: TriageConfig,
        engine: Arc<dyn ReasoningEngine>,
        source: Arc<dyn SourceControl>,
        index: Arc<dyn RunbookIndex>,
        escalation: Arc<dyn EscalationChannel>,
    ) -> Self {
        let registry = Arc::new(DeploymentWatchRegistry::new(
            config.watch_duration(),
            config.deployment_history_capacity,
        ));
        Self::with_registry(config, registry, engine, source, index, escalation)
    }

    /// Wire the service to an externally constructed registry
    ///
    /// Used by tests that drive the registry clock manually.
    #[must_use]
    pub fn with_registry(
        config: TriageConfig,
        registry: Arc<DeploymentWatchRegistry>,
        engine: Arc<dyn ReasoningEngine>,
        source: Arc<dyn SourceControl>,
        index: Arc<dyn RunbookIndex>,
        escalation: Arc<dyn EscalationChannel>,
    ) -> Self {
        let pipeline = PipelineOrchestrator::new(
            engine,
            Arc::clone(&source),
            index,
            escalation,
            &config,
        );
        let reports = Mutex::new(BoundedHistory::new(config.report_history_capacity));
        Self {
            config,
            registry,
            pipeline,
            source,
            reports,
        }
    }

    /// Ingest an error event and run the full triage pipeline
    pub async fn ingest(&self, event: ErrorEvent) -> IngestOutcome {
        let started = Instant::now();
        let request_id = event
            .request_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()[..8].to_string());

        tracing::info!(
            request_id,
            service = event.service,
            environment = event.env,
            "error ingested"
        );

        let active = self.registry.get_active();
        let deployment = match &active {
            Some(record) => Some(self.correlate_deployment(record, &event, &request_id).await),
            None => None,
        };

        let mut log_text = build_log_text(&event);
        let mut context = AnalysisContext::from_event(&event, &request_id);
        if let Some(deployment) = &deployment {
            log_text.push_str(&deployment_block(deployment));
            context = context.with_deployment(deployment.clone());
        }

        let repo = active
            .as_ref()
            .map_or_else(|| self.config.default_repo.clone(), |a| a.repository.clone());

        let report = self
            .pipeline
            .analyze(&event.service, &repo, &log_text, &context)
            .await;

        let status = if report.is_failure() {
            IngestStatus::Error
        } else if deployment.is_some() {
            IngestStatus::DeploymentRegression
        } else {
            IngestStatus::Analyzed
        };

        // Escalation runs detached, so this measures only the pipeline.
        let processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        match status {
            IngestStatus::DeploymentRegression => tracing::warn!(
                request_id,
                processing_time_ms,
                "deployment regression detected"
            ),
            _ => tracing::info!(request_id, processing_time_ms, status = %status, "rca completed"),
        }

        let outcome = IngestOutcome {
            status,
            request_id,
            service: event.service,
            error: event.error,
            environment: event.env,
            report,
            is_deployment_related: deployment.is_some(),
            deployment,
            analyzed_at: Utc::now(),
            processing_time_ms,
        };
        self.reports.lock().push(outcome.clone());
        outcome
    }

    /// Register a deployment announcement and open its watch window
    ///
    /// Rejects announcements with no identifiable commit or repository
    /// before any registry interaction.
    pub fn announce(
        &self,
        announcement: DeploymentAnnouncement,
    ) -> Result<AnnouncementReceipt, TriageError> {
        if announcement.commit_sha.trim().is_empty() {
            return Err(TriageError::DeploymentPayload(
                "announcement carries no commit SHA".to_string(),
            ));
        }
        if announcement.repository.trim().is_empty() {
            return Err(TriageError::DeploymentPayload(
                "announcement carries no repository".to_string(),
            ));
        }

        let record = self.registry.register(announcement);
        Ok(AnnouncementReceipt {
            deployment_id: record.id,
            commit_sha: record.commit_sha,
            watch_until: record.watch_until,
        })
    }

    /// Current watch state
    #[must_use]
    pub fn watch_status(&self) -> WatchStatus {
        self.registry.status()
    }

    /// Recent deployment announcements, newest first
    #[must_use]
    pub fn deployment_history(&self, limit: usize) -> Vec<DeploymentRecord> {
        self.registry.history(limit)
    }

    /// Recent ingestion outcomes, newest first
    #[must_use]
    pub fn report_history(&self, limit: usize) -> Vec<IngestOutcome> {
        self.reports.lock().list(limit)
    }

    /// The registry backing this service
    #[must_use]
    pub fn registry(&self) -> &DeploymentWatchRegistry {
        &self.registry
    }

    /// Fetch the suspect commit's diff and record the error on the watch
    async fn correlate_deployment(
        &self,
        record: &DeploymentRecord,
        event: &ErrorEvent,
        request_id: &str,
    ) -> DeploymentContext {
        tracing::warn!(
            request_id,
            deployment = %record.id,
            commit = record.short_sha(),
            author = record.author,
            "error during active deployment watch"
        );

        let diff = match self
            .source
            .commit_diff(&record.repository, &record.commit_sha)
            .await
        {
            Ok(diff) => diff,
            Err(e) => {
                tracing::error!(error = %e, "commit diff fetch failed");
                CommitDiff::failed(e.to_string())
            }
        };

        self.registry.record_error(
            record.id,
            WatchedError {
                error: event.error.clone(),
                request_id: request_id.to_string(),
                observed_at: Utc::now(),
            },
        );

        DeploymentContext {
            deployment_id: record.id,
            suspect_commit: SuspectCommit {
                sha: record.short_sha().to_string(),
                full_sha: record.commit_sha.clone(),
                author: record.author.clone(),
                message: record.message.clone(),
                branch: record.branch.clone(),
                deployed_at: record.registered_at,
            },
            files_changed: diff.files,
            commit_stats: diff.stats,
        }
    }
}

/// Assemble the single log-text blob handed to the pipeline
#[must_use]
pub fn build_log_text(event: &ErrorEvent) -> String {
    let mut text = format!(
        "=== ERROR: {} ===\nService: {}\nEnvironment: {}\nTimestamp: {}\n",
        event.error, event.service, event.env, event.timestamp
    );
    if let Some(endpoint) = &event.endpoint {
        let method = event.method.as_deref().unwrap_or("UNKNOWN");
        let _ = writeln!(text, "Endpoint: {method} {endpoint}");
    }
    text.push('\n');

    if let Some(stacktrace) = &event.stacktrace {
        let _ = write!(text, "=== STACKTRACE ===\n{stacktrace}\n\n");
    }
    if let Some(recent_logs) = &event.recent_logs {
        text.push_str("=== RECENT LOGS ===\n");
        text.push_str(&recent_logs.join("\n"));
    }
    text
}

/// Deployment-context block appended to the log text for the pipeline
fn deployment_block(context: &DeploymentContext) -> String {
    let commit = &context.suspect_commit;
    let mut block = format!(
        "\n\n=== DEPLOYMENT CONTEXT (ERROR DURING ACTIVE DEPLOYMENT) ===\n\
         THIS ERROR OCCURRED WITHIN THE DEPLOYMENT WATCH WINDOW\n\
         \nSUSPECT COMMIT: {}\nAuthor: {}\nMessage: {}\nBranch: {}\nDeployed at: {}\n\
         \n--- FILES CHANGED IN THIS COMMIT ---\n",
        commit.sha, commit.author, commit.message, commit.branch, commit.deployed_at
    );

    for file in &context.files_changed {
        let _ = write!(
            block,
            "\nFile: {} ({})\n  +{} -{} lines\n",
            file.filename, file.status, file.additions, file.deletions
        );
        if !file.patch.is_empty() {
            let preview: String = file.patch.chars().take(500).collect();
            let _ = writeln!(block, "  Patch Preview:\n{preview}");
        }
    }

    block.push_str("\n=== END DEPLOYMENT CONTEXT ===");
    block
}
