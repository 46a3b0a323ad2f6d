//! Core types for the triage engine
//!
//! Defines the fundamental types shared across the workspace:
//! - Inbound error events and deployment announcements
//! - Deployment records and watch-window context
//! - Per-stage analysis results
//! - The synthesized RCA report and ingestion outcome

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ulid::Ulid;

/// Unique deployment identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeploymentId(pub Ulid);

impl DeploymentId {
    /// Generate new deployment ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for DeploymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "deploy-{}", self.0)
    }
}

/// Runtime error event reported by an instrumented service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Name of the service that errored
    pub service: String,
    /// Error message or exception type
    pub error: String,
    /// Full stacktrace, if captured
    #[serde(default)]
    pub stacktrace: Option<String>,
    /// Recent log lines surrounding the error
    #[serde(default)]
    pub recent_logs: Option<Vec<String>>,
    /// Environment tag (production, staging, ...)
    pub env: String,
    /// When the error occurred
    pub timestamp: DateTime<Utc>,
    /// Request correlation id supplied by the caller
    #[serde(default)]
    pub request_id: Option<String>,
    /// HTTP endpoint that failed
    #[serde(default)]
    pub endpoint: Option<String>,
    /// HTTP method of the failing request
    #[serde(default)]
    pub method: Option<String>,
    /// Affected user, if known
    #[serde(default)]
    pub user_id: Option<String>,
    /// Free-form extra context
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ErrorEvent {
    /// Create a new error event
    #[inline]
    #[must_use]
    pub fn new(
        service: impl Into<String>,
        error: impl Into<String>,
        env: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            error: error.into(),
            stacktrace: None,
            recent_logs: None,
            env: env.into(),
            timestamp: Utc::now(),
            request_id: None,
            endpoint: None,
            method: None,
            user_id: None,
            extra: HashMap::new(),
        }
    }

    /// With stacktrace
    #[inline]
    #[must_use]
    pub fn with_stacktrace(mut self, stacktrace: impl Into<String>) -> Self {
        self.stacktrace = Some(stacktrace.into());
        self
    }

    /// With recent log lines
    #[inline]
    #[must_use]
    pub fn with_recent_logs(mut self, lines: Vec<String>) -> Self {
        self.recent_logs = Some(lines);
        self
    }

    /// With request correlation id
    #[inline]
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// With endpoint and method
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, method: impl Into<String>, endpoint: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// Deployment announcement supplied by the source-control webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentAnnouncement {
    /// Commit SHA that was pushed
    pub commit_sha: String,
    /// Repository in `owner/repo` form
    pub repository: String,
    /// Commit author
    pub author: String,
    /// Commit message
    pub message: String,
    /// Branch that was pushed to
    pub branch: String,
}

/// Error summary appended to a deployment while its watch window is active
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchedError {
    /// Error message
    pub error: String,
    /// Correlation id of the triggering request
    pub request_id: String,
    /// When the error was observed
    pub observed_at: DateTime<Utc>,
}

/// A registered deployment and its watch window
///
/// The watch-expiry time is fixed at registration and never extended.
/// Error summaries accumulate only while the record is in the active set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// Deployment id
    pub id: DeploymentId,
    /// Commit SHA
    pub commit_sha: String,
    /// Repository in `owner/repo` form
    pub repository: String,
    /// Commit author
    pub author: String,
    /// Commit message
    pub message: String,
    /// Branch
    pub branch: String,
    /// Registration time
    pub registered_at: DateTime<Utc>,
    /// End of the watch window
    pub watch_until: DateTime<Utc>,
    /// Errors observed during the watch window (audit only)
    pub errors_during_watch: Vec<WatchedError>,
}

impl DeploymentRecord {
    /// Whether the watch window is still open at `now`
    #[inline]
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now <= self.watch_until
    }

    /// Abbreviated commit SHA (first 7 characters)
    ///
    /// Truncates on character boundaries; announcement payloads are not
    /// guaranteed to carry ASCII SHAs.
    #[inline]
    #[must_use]
    pub fn short_sha(&self) -> &str {
        abbreviate(&self.commit_sha)
    }
}

/// First 7 characters of a commit SHA, clamped to a character boundary
#[must_use]
pub fn abbreviate(sha: &str) -> &str {
    sha.char_indices()
        .nth(7)
        .map_or(sha, |(idx, _)| &sha[..idx])
}

/// Receipt returned to the announcement caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementReceipt {
    /// Assigned deployment id
    pub deployment_id: DeploymentId,
    /// Commit SHA now under watch
    pub commit_sha: String,
    /// End of the watch window
    pub watch_until: DateTime<Utc>,
}

/// Stage 1 result: structured signals extracted from the log excerpt
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogAnalysis {
    /// Error types found, in order of appearance
    #[serde(default)]
    pub error_signals: Vec<String>,
    /// Extracted stack traces
    #[serde(default)]
    pub stack_traces: Vec<String>,
    /// Most critical error messages
    #[serde(default)]
    pub key_errors: Vec<String>,
    /// Timing issues, deadlocks, and similar patterns
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl LogAnalysis {
    /// Defaulted result substituted when extraction fails
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error_signals: vec!["analysis_failed".to_string()],
            stack_traces: Vec::new(),
            key_errors: vec![message.into()],
            patterns: Vec::new(),
        }
    }
}

/// One commit in the recent-history window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitSummary {
    /// Abbreviated SHA
    pub sha: String,
    /// Commit message
    pub message: String,
    /// Author name
    pub author: String,
    /// Author date, as reported by the provider
    pub date: String,
    /// Number of files changed
    #[serde(default)]
    pub files_changed: usize,
}

/// Stage 2 result: recent source-control history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitAnalysis {
    /// Repository analyzed
    pub repo: String,
    /// Recent commits, newest first
    #[serde(default)]
    pub commits: Vec<CommitSummary>,
    /// Number of commits analyzed
    #[serde(default)]
    pub total_analyzed: usize,
    /// Failure reason when the fetch degraded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommitAnalysis {
    /// Empty result substituted when the fetch fails
    #[must_use]
    pub fn failed(repo: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            commits: Vec::new(),
            total_analyzed: 0,
            error: Some(message.into()),
        }
    }
}

/// Stage 3 result: one matched runbook document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunbookMatch {
    /// Runbook title
    pub title: String,
    /// Source filename
    pub filename: String,
    /// Leading excerpt (at most 500 characters)
    pub snippet: String,
    /// Full document content
    #[serde(default)]
    pub full_content: String,
}

/// One changed file in a commit diff
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffFile {
    /// File path
    pub filename: String,
    /// Change status (added, modified, removed)
    #[serde(default)]
    pub status: String,
    /// Lines added
    #[serde(default)]
    pub additions: usize,
    /// Lines removed
    #[serde(default)]
    pub deletions: usize,
    /// Unified-diff patch, truncated to 2000 characters
    #[serde(default)]
    pub patch: String,
}

/// Aggregate diff statistics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DiffStats {
    /// Total lines added
    #[serde(default)]
    pub additions: usize,
    /// Total lines removed
    #[serde(default)]
    pub deletions: usize,
    /// Total lines changed
    #[serde(default)]
    pub total: usize,
}

/// Full diff for a single commit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitDiff {
    /// Commit SHA
    #[serde(default)]
    pub sha: String,
    /// Commit message
    #[serde(default)]
    pub message: String,
    /// Author name
    #[serde(default)]
    pub author: String,
    /// Author date
    #[serde(default)]
    pub date: String,
    /// Changed files with patches
    #[serde(default)]
    pub files: Vec<DiffFile>,
    /// Aggregate statistics
    #[serde(default)]
    pub stats: DiffStats,
    /// Failure reason when the fetch degraded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommitDiff {
    /// Empty diff substituted when the fetch fails
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

/// The commit suspected of causing a deployment regression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspectCommit {
    /// Abbreviated SHA
    pub sha: String,
    /// Full SHA
    pub full_sha: String,
    /// Commit author
    pub author: String,
    /// Commit message
    pub message: String,
    /// Branch
    pub branch: String,
    /// When the deployment was announced
    pub deployed_at: DateTime<Utc>,
}

/// Deployment correlation context attached when an error arrives inside a watch window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentContext {
    /// Deployment under watch
    pub deployment_id: DeploymentId,
    /// Suspect commit details
    pub suspect_commit: SuspectCommit,
    /// Files changed in the suspect commit
    pub files_changed: Vec<DiffFile>,
    /// Aggregate commit statistics
    pub commit_stats: DiffStats,
}

/// How the error entered the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionMode {
    /// Reported by instrumented middleware
    Automated,
    /// Submitted by a human operator
    Manual,
}

impl Default for IngestionMode {
    fn default() -> Self {
        Self::Automated
    }
}

/// Metadata threaded through the pipeline alongside the log text
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisContext {
    /// Ingestion mode
    #[serde(default)]
    pub ingestion_mode: IngestionMode,
    /// When the error occurred
    #[serde(default)]
    pub error_timestamp: Option<DateTime<Utc>>,
    /// Environment tag
    #[serde(default)]
    pub environment: Option<String>,
    /// Request correlation id
    #[serde(default)]
    pub request_id: Option<String>,
    /// Failing endpoint
    #[serde(default)]
    pub endpoint: Option<String>,
    /// HTTP method
    #[serde(default)]
    pub method: Option<String>,
    /// Affected user
    #[serde(default)]
    pub user_id: Option<String>,
    /// Free-form extra context
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
    /// Deployment correlation, when the error arrived inside a watch window
    #[serde(default)]
    pub deployment: Option<DeploymentContext>,
}

impl AnalysisContext {
    /// Build pipeline metadata from an inbound event
    #[must_use]
    pub fn from_event(event: &ErrorEvent, request_id: impl Into<String>) -> Self {
        Self {
            ingestion_mode: IngestionMode::Automated,
            error_timestamp: Some(event.timestamp),
            environment: Some(event.env.clone()),
            request_id: Some(request_id.into()),
            endpoint: event.endpoint.clone(),
            method: event.method.clone(),
            user_id: event.user_id.clone(),
            extra: event.extra.clone(),
            deployment: None,
        }
    }

    /// With deployment correlation context
    #[inline]
    #[must_use]
    pub fn with_deployment(mut self, deployment: DeploymentContext) -> Self {
        self.deployment = Some(deployment);
        self
    }
}

/// Confidence level of a synthesized report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Strong, corroborated evidence
    High,
    /// Plausible but partially corroborated
    Medium,
    /// Weak or degraded evidence
    Low,
}

impl Default for Confidence {
    fn default() -> Self {
        Self::Low
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Evidence sections cited by the synthesized report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Evidence {
    /// Key log evidence
    #[serde(default)]
    pub logs: String,
    /// Relevant commits
    #[serde(default)]
    pub commits: String,
    /// Applicable runbooks
    #[serde(default)]
    pub runbooks: String,
    /// Relevant code changes, for deployment regressions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

/// Marker value used for the root cause of a failed synthesis
pub const ANALYSIS_FAILED: &str = "analysis_failed";

/// The synthesized root-cause report
///
/// Immutable once produced; stored verbatim in the report history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RcaReport {
    /// Service the report concerns
    #[serde(default)]
    pub service: String,
    /// Primary root cause
    #[serde(default)]
    pub root_cause: String,
    /// Confidence level
    #[serde(default)]
    pub confidence: Confidence,
    /// Contributing factors
    #[serde(default)]
    pub contributing_factors: Vec<String>,
    /// Cited evidence
    #[serde(default)]
    pub evidence: Evidence,
    /// Recommended actions, most urgent first
    #[serde(default)]
    pub recommended_actions: Vec<String>,
    /// Estimated sequence of events
    #[serde(default)]
    pub timeline: Option<String>,
    /// Whether the reasoning engine judged the deployment to be the cause
    #[serde(default)]
    pub is_deployment_caused: bool,
    /// Whether the error arrived inside an active watch window
    #[serde(default)]
    pub is_deployment_regression: bool,
    /// Suspect commit, for deployment-correlated reports
    #[serde(default)]
    pub suspect_commit: Option<SuspectCommit>,
    /// When the report was synthesized
    #[serde(default = "Utc::now")]
    pub analyzed_at: DateTime<Utc>,
    /// Environment tag carried from the event
    #[serde(default)]
    pub environment: Option<String>,
    /// Request correlation id
    #[serde(default)]
    pub request_id: Option<String>,
    /// Ingestion mode
    #[serde(default)]
    pub ingestion_mode: IngestionMode,
    /// Failure reason, when synthesis itself failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RcaReport {
    /// Terminal error-shaped report produced when synthesis fails
    #[must_use]
    pub fn failed(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            root_cause: ANALYSIS_FAILED.to_string(),
            confidence: Confidence::Low,
            analyzed_at: Utc::now(),
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Whether synthesis itself failed
    #[inline]
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.root_cause == ANALYSIS_FAILED
    }

    /// Whether the report confirms a deployment regression
    #[inline]
    #[must_use]
    pub fn is_deployment_classified(&self) -> bool {
        self.is_deployment_caused || self.is_deployment_regression
    }
}

/// Caller-visible status of an ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    /// Report produced, no deployment correlation
    Analyzed,
    /// Report produced inside an active watch window
    DeploymentRegression,
    /// Synthesis failed; the report is error-shaped
    Error,
}

impl std::fmt::Display for IngestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Analyzed => write!(f, "analyzed"),
            Self::DeploymentRegression => write!(f, "deployment_regression"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Outcome of one ingestion call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestOutcome {
    /// Caller-visible status
    pub status: IngestStatus,
    /// Request correlation id
    pub request_id: String,
    /// Service that reported the error
    pub service: String,
    /// Original error message
    pub error: String,
    /// Environment tag
    pub environment: String,
    /// The synthesized report
    pub report: RcaReport,
    /// Whether the error was correlated with a deployment
    pub is_deployment_related: bool,
    /// Deployment correlation context, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentContext>,
    /// When the analysis completed
    pub analyzed_at: DateTime<Utc>,
    /// End-to-end processing time, excluding escalation dispatch
    pub processing_time_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_id_generation() {
        let id1 = DeploymentId::new();
        let id2 = DeploymentId::new();
        assert_ne!(id1, id2);
        assert!(id1.to_string().starts_with("deploy-"));
    }

    #[test]
    fn error_event_builder() {
        let event = ErrorEvent::new("checkout", "NullPointerException", "production")
            .with_stacktrace("at com.example.Checkout.pay")
            .with_endpoint("POST", "/api/pay")
            .with_request_id("req-1");

        assert_eq!(event.service, "checkout");
        assert_eq!(event.method.as_deref(), Some("POST"));
        assert_eq!(event.request_id.as_deref(), Some("req-1"));
    }

    #[test]
    fn deployment_record_activity() {
        let now = Utc::now();
        let record = DeploymentRecord {
            id: DeploymentId::new(),
            commit_sha: "abc123def456".to_string(),
            repository: "acme/shop".to_string(),
            author: "dev".to_string(),
            message: "fix checkout".to_string(),
            branch: "main".to_string(),
            registered_at: now,
            watch_until: now + chrono::Duration::minutes(5),
            errors_during_watch: Vec::new(),
        };

        assert!(record.is_active(now));
        assert!(record.is_active(now + chrono::Duration::minutes(5)));
        assert!(!record.is_active(now + chrono::Duration::minutes(6)));
        assert_eq!(record.short_sha(), "abc123d");
    }

    #[test]
    fn sha_abbreviation_respects_char_boundaries() {
        assert_eq!(abbreviate("abc123def456"), "abc123d");
        assert_eq!(abbreviate("abc"), "abc");
        assert_eq!(abbreviate(""), "");
        // Multibyte input must truncate on characters, not bytes.
        assert_eq!(abbreviate("ééééé"), "ééééé");
        assert_eq!(abbreviate("éééééééé"), "ééééééé");
    }

    #[test]
    fn log_analysis_failure_default() {
        let analysis = LogAnalysis::failed("engine unreachable");
        assert_eq!(analysis.error_signals, vec!["analysis_failed"]);
        assert_eq!(analysis.key_errors, vec!["engine unreachable"]);
        assert!(analysis.stack_traces.is_empty());
    }

    #[test]
    fn report_failure_shape() {
        let report = RcaReport::failed("checkout", "invalid JSON");
        assert!(report.is_failure());
        assert_eq!(report.confidence, Confidence::Low);
        assert!(!report.is_deployment_classified());
    }

    #[test]
    fn report_deserializes_from_partial_json() {
        let value = serde_json::json!({
            "root_cause": "connection pool exhausted",
            "confidence": "high",
            "is_deployment_caused": true,
            "recommended_actions": ["increase pool size"]
        });

        let report: RcaReport = serde_json::from_value(value).unwrap();
        assert_eq!(report.root_cause, "connection pool exhausted");
        assert_eq!(report.confidence, Confidence::High);
        assert!(report.is_deployment_classified());
        assert!(report.contributing_factors.is_empty());
    }

    #[test]
    fn ingest_status_display() {
        assert_eq!(IngestStatus::Analyzed.to_string(), "analyzed");
        assert_eq!(
            IngestStatus::DeploymentRegression.to_string(),
            "deployment_regression"
        );
        assert_eq!(IngestStatus::Error.to_string(), "error");
    }
}
