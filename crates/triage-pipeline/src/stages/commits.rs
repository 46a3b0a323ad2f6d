//! Stage 2: recent commit context
//!
//! Fetches recent source-control history for the repository under
//! analysis. Independent of stage 1; a fetch failure degrades to an empty
//! commit list carrying the failure reason.

use crate::traits::SourceControl;
use std::sync::Arc;
use triage_core::types::{abbreviate, CommitAnalysis, CommitSummary};

/// Commit context fetcher stage
pub struct CommitContextFetcher {
    source: Arc<dyn SourceControl>,
    fetch_limit: usize,
}

impl CommitContextFetcher {
    /// Create the stage
    #[must_use]
    pub fn new(source: Arc<dyn SourceControl>, fetch_limit: usize) -> Self {
        Self {
            source,
            fetch_limit,
        }
    }

    /// Fetch and summarize recent commits for `repo`
    pub async fn analyze(&self, repo: &str) -> CommitAnalysis {
        match self.source.recent_commits(repo, self.fetch_limit).await {
            Ok(commits) => {
                let commits: Vec<CommitSummary> = commits
                    .into_iter()
                    .map(|commit| CommitSummary {
                        sha: abbreviate(&commit.sha).to_string(),
                        ..commit
                    })
                    .collect();
                tracing::info!(count = commits.len(), repo, "analyzed recent commits");
                CommitAnalysis {
                    repo: repo.to_string(),
                    total_analyzed: commits.len(),
                    commits,
                    error: None,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, repo, "commit analysis failed");
                CommitAnalysis::failed(repo, e.to_string())
            }
        }
    }
}
