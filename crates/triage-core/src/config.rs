//! Triage engine configuration
//!
//! Process-wide tunables with builder-style overrides and optional
//! environment-variable initialization.

use serde::{Deserialize, Serialize};

/// Triage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    /// How long a deployment stays under watch, in seconds
    pub watch_duration_secs: i64,
    /// Capacity of the deployment history store
    pub deployment_history_capacity: usize,
    /// Capacity of the RCA report history store
    pub report_history_capacity: usize,
    /// How many recent commits the commit stage fetches
    pub commit_fetch_limit: usize,
    /// How many runbook matches the runbook stage requests
    pub runbook_top_k: usize,
    /// Context lines kept around each signal line by the log pre-filter
    pub prefilter_context_lines: usize,
    /// Repository analyzed when no deployment is under watch
    pub default_repo: String,
}

impl TriageConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from `TRIAGE_*` environment variables
    ///
    /// Unset or unparseable variables keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(secs) = env_parse("TRIAGE_WATCH_DURATION_SECS") {
            config.watch_duration_secs = secs;
        }
        if let Some(capacity) = env_parse("TRIAGE_DEPLOYMENT_HISTORY_CAPACITY") {
            config.deployment_history_capacity = capacity;
        }
        if let Some(capacity) = env_parse("TRIAGE_REPORT_HISTORY_CAPACITY") {
            config.report_history_capacity = capacity;
        }
        if let Some(limit) = env_parse("TRIAGE_COMMIT_FETCH_LIMIT") {
            config.commit_fetch_limit = limit;
        }
        if let Some(top_k) = env_parse("TRIAGE_RUNBOOK_TOP_K") {
            config.runbook_top_k = top_k;
        }
        if let Ok(repo) = std::env::var("TRIAGE_DEFAULT_REPO") {
            config.default_repo = repo;
        }
        config
    }

    /// With watch duration
    #[inline]
    #[must_use]
    pub fn with_watch_duration_secs(mut self, secs: i64) -> Self {
        self.watch_duration_secs = secs;
        self
    }

    /// With deployment history capacity
    #[inline]
    #[must_use]
    pub fn with_deployment_history_capacity(mut self, capacity: usize) -> Self {
        self.deployment_history_capacity = capacity;
        self
    }

    /// With report history capacity
    #[inline]
    #[must_use]
    pub fn with_report_history_capacity(mut self, capacity: usize) -> Self {
        self.report_history_capacity = capacity;
        self
    }

    /// With default repository
    #[inline]
    #[must_use]
    pub fn with_default_repo(mut self, repo: impl Into<String>) -> Self {
        self.default_repo = repo.into();
        self
    }

    /// Watch duration as a chrono interval
    #[inline]
    #[must_use]
    pub fn watch_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.watch_duration_secs)
    }
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            watch_duration_secs: 300,
            deployment_history_capacity: 100,
            report_history_capacity: 50,
            commit_fetch_limit: 10,
            runbook_top_k: 3,
            prefilter_context_lines: 5,
            default_repo: String::new(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = TriageConfig::new();
        assert_eq!(config.watch_duration_secs, 300);
        assert_eq!(config.deployment_history_capacity, 100);
        assert_eq!(config.report_history_capacity, 50);
        assert_eq!(config.commit_fetch_limit, 10);
        assert_eq!(config.runbook_top_k, 3);
        assert_eq!(config.prefilter_context_lines, 5);
    }

    #[test]
    fn builder_overrides() {
        let config = TriageConfig::new()
            .with_watch_duration_secs(60)
            .with_deployment_history_capacity(10)
            .with_default_repo("acme/shop");

        assert_eq!(config.watch_duration(), chrono::Duration::seconds(60));
        assert_eq!(config.deployment_history_capacity, 10);
        assert_eq!(config.default_repo, "acme/shop");
    }
}
