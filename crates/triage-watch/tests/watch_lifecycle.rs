//! End-to-end watch lifecycle over the public API

use chrono::Duration;
use std::sync::Arc;
use triage_watch::{Clock, DeploymentWatchRegistry, ManualClock, WatchStatus};
use triage_core::types::{DeploymentAnnouncement, WatchedError};

fn announcement(sha: &str) -> DeploymentAnnouncement {
    DeploymentAnnouncement {
        commit_sha: sha.to_string(),
        repository: "acme/shop".to_string(),
        author: "dev".to_string(),
        message: "ship it".to_string(),
        branch: "main".to_string(),
    }
}

#[test]
fn full_watch_lifecycle() {
    let clock = Arc::new(ManualClock::new());
    let registry = DeploymentWatchRegistry::with_clock(
        Duration::minutes(5),
        100,
        Arc::clone(&clock) as Arc<dyn Clock>,
    );

    // Idle before any announcement.
    assert!(matches!(registry.status(), WatchStatus::Idle));
    assert!(registry.get_active().is_none());

    // Announce: watch opens for 5 minutes.
    let record = registry.register(announcement("abc123def456"));
    let active = registry.get_active().expect("watching");
    assert_eq!(active.id, record.id);
    assert_eq!(active.short_sha(), "abc123d");

    // An error observed mid-window is recorded on the watch.
    clock.advance(Duration::minutes(2));
    registry.record_error(
        record.id,
        WatchedError {
            error: "NullPointerException".to_string(),
            request_id: "req-1".to_string(),
            observed_at: clock.now(),
        },
    );
    match registry.status() {
        WatchStatus::Watching {
            errors_detected, ..
        } => assert_eq!(errors_detected, 1),
        WatchStatus::Idle => panic!("watch should still be open"),
    }

    // Window closes lazily on the next read.
    clock.advance(Duration::minutes(4));
    assert!(registry.get_active().is_none());
    assert!(matches!(registry.status(), WatchStatus::Idle));

    // History survives expiry, error included.
    let history = registry.history(10);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].errors_during_watch.len(), 1);
    assert_eq!(history[0].errors_during_watch[0].request_id, "req-1");
}
