//! Collaborator seams consumed by the pipeline stages
//!
//! Each trait wraps exactly one external system. Concrete implementations
//! live in `triage-clients`; the stages only see these contracts, which is
//! what makes the per-stage failure isolation enforceable and testable.

use async_trait::async_trait;
use triage_core::error::TriageError;
use triage_core::types::{CommitDiff, CommitSummary, RunbookMatch};

/// Natural-language reasoning engine
///
/// Turns a prompt pair into a structured JSON judgment. Output that cannot
/// be parsed as JSON surfaces as [`TriageError::StructuredResponse`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Invoke the engine and parse its output as a JSON object
    async fn invoke_structured(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<serde_json::Value, TriageError>;
}

/// Source-control provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Fetch up to `limit` recent commits, newest first
    async fn recent_commits(
        &self,
        repo: &str,
        limit: usize,
    ) -> Result<Vec<CommitSummary>, TriageError>;

    /// Fetch the diff for a single commit, patches truncated per file
    async fn commit_diff(&self, repo: &str, sha: &str) -> Result<CommitDiff, TriageError>;
}

/// Vector-similarity runbook index
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RunbookIndex: Send + Sync {
    /// Search for runbooks matching `query`, best first
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<RunbookMatch>, TriageError>;
}

/// Out-of-band escalation channel (voice call)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EscalationChannel: Send + Sync {
    /// Dispatch a spoken alert; returns whether the call was placed
    async fn send_voice_alert(&self, message: &str) -> Result<bool, TriageError>;
}
