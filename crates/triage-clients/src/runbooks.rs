//! Runbook index client
//!
//! Thin wrapper over the vector-search sidecar's query endpoint. Results
//! come back as scored documents; snippets are capped at 500 characters
//! while `full_content` keeps the whole document for synthesis. Any
//! failure degrades to no matches.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use triage_core::error::TriageError;
use triage_core::types::RunbookMatch;
use triage_pipeline::RunbookIndex;

const SNIPPET_LIMIT: usize = 500;

/// Vector-search runbook index client
pub struct RunbookClient {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    top_k: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    filename: String,
    #[serde(default)]
    content: String,
}

impl RunbookClient {
    /// Create a client for the given search endpoint
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    /// Create a client from the `RUNBOOK_SEARCH_URL` environment variable
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("RUNBOOK_SEARCH_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
        )
    }
}

#[async_trait]
impl RunbookIndex for RunbookClient {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<RunbookMatch>, TriageError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/search", self.base_url);
        let response = match self
            .http
            .post(&url)
            .json(&SearchRequest { query, top_k })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "runbook search request failed");
                return Ok(Vec::new());
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, "runbook search returned error");
            return Ok(Vec::new());
        }

        let parsed: SearchResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!(error = %e, "runbook search decode failed");
                return Ok(Vec::new());
            }
        };

        Ok(parsed.results.into_iter().map(to_match).collect())
    }
}

fn to_match(hit: SearchHit) -> RunbookMatch {
    RunbookMatch {
        title: if hit.title.is_empty() {
            "Untitled".to_string()
        } else {
            hit.title
        },
        filename: hit.filename,
        snippet: hit.content.chars().take(SNIPPET_LIMIT).collect(),
        full_content: hit.content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_query_short_circuits() {
        // No listener on this port; a request would error, a short-circuit
        // returns cleanly.
        let client = RunbookClient::new("http://127.0.0.1:9");
        let matches = client.search("   ", 3).await.expect("ok");
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn unreachable_index_degrades_to_empty() {
        let client = RunbookClient::new("http://127.0.0.1:9");
        let matches = client.search("ConnectionError", 3).await.expect("ok");
        assert!(matches.is_empty());
    }

    #[test]
    fn hits_map_with_snippet_cap() {
        let matched = to_match(SearchHit {
            title: String::new(),
            filename: "db.md".to_string(),
            content: "y".repeat(600),
        });
        assert_eq!(matched.title, "Untitled");
        assert_eq!(matched.filename, "db.md");
        assert_eq!(matched.snippet.len(), 500);
        assert_eq!(matched.full_content.len(), 600);
    }
}
