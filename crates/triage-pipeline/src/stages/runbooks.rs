//! Stage 3: runbook retrieval
//!
//! Joins stage 1's error signals into a similarity query against the
//! runbook index. Empty signals or a search failure degrade to no matches.

use crate::traits::RunbookIndex;
use std::sync::Arc;
use triage_core::types::RunbookMatch;

/// Runbook matcher stage
pub struct RunbookMatcher {
    index: Arc<dyn RunbookIndex>,
    top_k: usize,
}

impl RunbookMatcher {
    /// Create the stage
    #[must_use]
    pub fn new(index: Arc<dyn RunbookIndex>, top_k: usize) -> Self {
        Self { index, top_k }
    }

    /// Search runbooks relevant to the extracted error signals
    pub async fn search(&self, error_signals: &[String]) -> Vec<RunbookMatch> {
        if error_signals.is_empty() {
            return Vec::new();
        }

        let query = error_signals.join(" ");
        match self.index.search(&query, self.top_k).await {
            Ok(matches) => {
                tracing::info!(count = matches.len(), "found relevant runbooks");
                matches
            }
            Err(e) => {
                tracing::error!(error = %e, "runbook search failed");
                Vec::new()
            }
        }
    }
}
