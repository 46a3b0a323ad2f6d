//! Deployment watch registry
//!
//! Tracks active and historical deployment announcements, resolves the
//! single "current" deployment, and records errors observed during its
//! watch window. Expiry is lazy: records leave the active set when a read
//! observes their window closed, never via a background timer. Expired
//! records remain in history.
//!
//! All operations are non-suspending and take one short-lived lock, so the
//! registry is safe under both cooperative and preemptive scheduling.

use crate::clock::{Clock, SystemClock};
use crate::history::BoundedHistory;
use chrono::Duration;
use parking_lot::Mutex;
use std::sync::Arc;
use triage_core::types::{
    DeploymentAnnouncement, DeploymentId, DeploymentRecord, WatchedError,
};

/// Snapshot of the current watch state
#[derive(Debug, Clone)]
pub enum WatchStatus {
    /// A deployment is under watch
    Watching {
        /// The currently selected deployment
        deployment: DeploymentRecord,
        /// Errors recorded against it so far
        errors_detected: usize,
    },
    /// No active deployment
    Idle,
}

#[derive(Debug)]
struct RegistryInner {
    active: Vec<DeploymentRecord>,
    history: BoundedHistory<DeploymentRecord>,
}

/// Deployment watch registry
///
/// Process-wide singleton with lifecycle = process lifetime; state resets
/// on restart and is never shared across processes.
#[derive(Debug)]
pub struct DeploymentWatchRegistry {
    watch_duration: Duration,
    clock: Arc<dyn Clock>,
    inner: Mutex<RegistryInner>,
}

impl DeploymentWatchRegistry {
    /// Create a registry with the given watch duration and history capacity
    #[must_use]
    pub fn new(watch_duration: Duration, history_capacity: usize) -> Self {
        Self::with_clock(watch_duration, history_capacity, Arc::new(SystemClock))
    }

    /// Create a registry with an explicit clock (used by tests)
    #[must_use]
    pub fn with_clock(
        watch_duration: Duration,
        history_capacity: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            watch_duration,
            clock,
            inner: Mutex::new(RegistryInner {
                active: Vec::new(),
                history: BoundedHistory::new(history_capacity),
            }),
        }
    }

    /// Register a deployment and open its watch window
    ///
    /// The record enters both the active set and the front of the bounded
    /// history. The watch-expiry time is fixed here and never extended.
    pub fn register(&self, announcement: DeploymentAnnouncement) -> DeploymentRecord {
        self.register_with_watch(announcement, self.watch_duration)
    }

    /// Register a deployment with an explicit watch duration
    pub fn register_with_watch(
        &self,
        announcement: DeploymentAnnouncement,
        watch_duration: Duration,
    ) -> DeploymentRecord {
        let now = self.clock.now();
        let record = DeploymentRecord {
            id: DeploymentId::new(),
            commit_sha: announcement.commit_sha,
            repository: announcement.repository,
            author: announcement.author,
            message: announcement.message,
            branch: announcement.branch,
            registered_at: now,
            watch_until: now + watch_duration,
            errors_during_watch: Vec::new(),
        };

        tracing::info!(
            deployment = %record.id,
            commit = record.short_sha(),
            watch_until = %record.watch_until,
            "registered deployment, watch mode active"
        );

        let mut inner = self.inner.lock();
        inner.active.push(record.clone());
        inner.history.push(record.clone());
        record
    }

    /// Resolve the current deployment, if any
    ///
    /// Purges expired records from the active set first, then returns the
    /// most recently registered survivor. Among overlapping windows the
    /// newest registration wins; older concurrent windows stay active but
    /// non-selected until it expires.
    pub fn get_active(&self) -> Option<DeploymentRecord> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        inner.active.retain(|record| {
            let active = record.is_active(now);
            if !active {
                tracing::info!(deployment = %record.id, "watch mode expired");
            }
            active
        });

        inner
            .active
            .iter()
            .max_by_key(|record| (record.registered_at, record.id))
            .cloned()
    }

    /// Record an error summary against a deployment still under watch
    ///
    /// A no-op when the id is no longer in the active set: expired
    /// deployments do not accumulate further evidence. The history copy of
    /// an active record is updated as well, so the audit trail shows errors
    /// observed during each watch.
    pub fn record_error(&self, deployment_id: DeploymentId, error: WatchedError) {
        let mut inner = self.inner.lock();

        let Some(record) = inner
            .active
            .iter_mut()
            .find(|record| record.id == deployment_id)
        else {
            tracing::debug!(deployment = %deployment_id, "error dropped, watch no longer active");
            return;
        };
        record.errors_during_watch.push(error.clone());

        if let Some(historical) = inner
            .history
            .iter_mut()
            .find(|record| record.id == deployment_id)
        {
            historical.errors_during_watch.push(error);
        }

        tracing::warn!(deployment = %deployment_id, "error recorded during deployment watch");
    }

    /// Up to `limit` most recent history entries, newest first
    ///
    /// History retains expired deployments; only the active set forgets
    /// them.
    #[must_use]
    pub fn history(&self, limit: usize) -> Vec<DeploymentRecord> {
        self.inner.lock().history.list(limit)
    }

    /// Total number of deployments retained in history
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.inner.lock().history.len()
    }

    /// Snapshot of the current watch state
    pub fn status(&self) -> WatchStatus {
        match self.get_active() {
            Some(deployment) => {
                let errors_detected = deployment.errors_during_watch.len();
                WatchStatus::Watching {
                    deployment,
                    errors_detected,
                }
            }
            None => WatchStatus::Idle,
        }
    }
}
