//! Source-control client (GitHub REST v3)
//!
//! Commit history is advisory context for the pipeline, so this client
//! degrades rather than fails: a non-2xx response or transport error
//! yields an empty commit list or an error-tagged diff, logged but never
//! propagated as `Err`. The trait's `Result` stays reserved for callers
//! that construct their own adapters.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use triage_core::error::TriageError;
use triage_core::types::{CommitDiff, CommitSummary, DiffFile, DiffStats};
use triage_pipeline::SourceControl;

const PATCH_LIMIT: usize = 2000;

/// GitHub API client
pub struct GitHubClient {
    token: String,
    base_url: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct ApiCommit {
    sha: String,
    commit: ApiCommitDetail,
    #[serde(default)]
    files: Vec<ApiFile>,
    #[serde(default)]
    stats: Option<ApiStats>,
}

#[derive(Deserialize)]
struct ApiCommitDetail {
    message: String,
    author: ApiAuthor,
}

#[derive(Deserialize)]
struct ApiAuthor {
    name: String,
    date: String,
}

#[derive(Deserialize)]
struct ApiFile {
    filename: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    additions: usize,
    #[serde(default)]
    deletions: usize,
    #[serde(default)]
    patch: Option<String>,
}

#[derive(Deserialize)]
struct ApiStats {
    #[serde(default)]
    additions: usize,
    #[serde(default)]
    deletions: usize,
    #[serde(default)]
    total: usize,
}

impl GitHubClient {
    /// Create a client with the given API token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, "https://api.github.com")
    }

    /// Create a client against a non-default API host
    #[must_use]
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("triage-engine")
            .build()
            .unwrap_or_default();
        Self {
            token: token.into(),
            base_url: base_url.into(),
            http,
        }
    }

    /// Create a client from the `GITHUB_TOKEN` environment variable
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(std::env::var("GITHUB_TOKEN").unwrap_or_default())
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, TriageError> {
        self.http
            .get(url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await
            .map_err(|e| TriageError::upstream("github", e.to_string()))
    }
}

#[async_trait]
impl SourceControl for GitHubClient {
    async fn recent_commits(
        &self,
        repo: &str,
        limit: usize,
    ) -> Result<Vec<CommitSummary>, TriageError> {
        let repo = normalize_repo(repo);
        let url = format!("{}/repos/{repo}/commits?per_page={limit}", self.base_url);

        let response = match self.get(&url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, repo, "commit fetch failed");
                return Ok(Vec::new());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body, repo, "github api error");
            return Ok(Vec::new());
        }

        let commits: Vec<ApiCommit> = match response.json().await {
            Ok(commits) => commits,
            Err(e) => {
                tracing::error!(error = %e, repo, "commit list decode failed");
                return Ok(Vec::new());
            }
        };

        Ok(commits
            .into_iter()
            .map(|c| CommitSummary {
                sha: c.sha,
                message: c.commit.message,
                author: c.commit.author.name,
                date: c.commit.author.date,
                files_changed: c.files.len(),
            })
            .collect())
    }

    async fn commit_diff(&self, repo: &str, sha: &str) -> Result<CommitDiff, TriageError> {
        let repo = normalize_repo(repo);
        let url = format!("{}/repos/{repo}/commits/{sha}", self.base_url);

        let response = match self.get(&url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, repo, sha, "commit diff fetch failed");
                return Ok(CommitDiff::failed(e.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body, repo, sha, "github api error");
            return Ok(CommitDiff::failed(format!("status {status}")));
        }

        let commit: ApiCommit = match response.json().await {
            Ok(commit) => commit,
            Err(e) => {
                tracing::error!(error = %e, repo, sha, "commit diff decode failed");
                return Ok(CommitDiff::failed(e.to_string()));
            }
        };

        let files = commit
            .files
            .into_iter()
            .map(|f| DiffFile {
                filename: f.filename,
                status: f.status,
                additions: f.additions,
                deletions: f.deletions,
                patch: truncate_patch(f.patch.unwrap_or_default()),
            })
            .collect();
        let stats = commit.stats.map_or_else(DiffStats::default, |s| DiffStats {
            additions: s.additions,
            deletions: s.deletions,
            total: s.total,
        });

        Ok(CommitDiff {
            sha: commit.sha,
            message: commit.commit.message,
            author: commit.commit.author.name,
            date: commit.commit.author.date,
            files,
            stats,
            error: None,
        })
    }
}

/// Accept `owner/repo` or a full GitHub URL
fn normalize_repo(repo: &str) -> &str {
    repo.strip_prefix("https://github.com/").unwrap_or(repo)
}

fn truncate_patch(patch: String) -> String {
    if patch.chars().count() <= PATCH_LIMIT {
        patch
    } else {
        patch.chars().take(PATCH_LIMIT).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalizes_full_urls() {
        assert_eq!(normalize_repo("https://github.com/acme/shop"), "acme/shop");
        assert_eq!(normalize_repo("acme/shop"), "acme/shop");
    }

    #[test]
    fn patch_truncation_caps_length() {
        let long = "x".repeat(PATCH_LIMIT + 100);
        assert_eq!(truncate_patch(long).len(), PATCH_LIMIT);

        let short = "@@ -1 +1 @@".to_string();
        assert_eq!(truncate_patch(short.clone()), short);
    }

    #[test]
    fn api_commit_decodes_without_files_or_stats() {
        // The list endpoint omits `files` and `stats` entirely.
        let raw = serde_json::json!({
            "sha": "abc123",
            "commit": {
                "message": "fix pool sizing",
                "author": {"name": "dev", "date": "2026-08-01T00:00:00Z"}
            }
        });
        let commit: ApiCommit = serde_json::from_value(raw).expect("decodes");
        assert_eq!(commit.sha, "abc123");
        assert!(commit.files.is_empty());
        assert!(commit.stats.is_none());
    }
}
