//! Triage Core - shared data model for the triage engine
//!
//! Defines the types exchanged between the watch registry, the analysis
//! pipeline, and the external-collaborator clients:
//! - Inbound error events and deployment announcements
//! - Deployment records and their watch windows
//! - Per-stage analysis results and the synthesized RCA report
//! - The error taxonomy and process-wide configuration

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod types;

pub use config::TriageConfig;
pub use error::TriageError;
pub use types::{
    abbreviate, AnalysisContext, AnnouncementReceipt, CommitAnalysis, CommitDiff, CommitSummary,
    Confidence,
    DeploymentAnnouncement, DeploymentContext, DeploymentId, DeploymentRecord, DiffFile, DiffStats,
    ErrorEvent, Evidence, IngestOutcome, IngestStatus, IngestionMode, LogAnalysis, RcaReport,
    RunbookMatch, SuspectCommit, WatchedError, ANALYSIS_FAILED,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the triage data model
    pub use crate::{
        AnalysisContext, CommitAnalysis, DeploymentAnnouncement, DeploymentContext, DeploymentId,
        DeploymentRecord, ErrorEvent, IngestOutcome, IngestStatus, LogAnalysis, RcaReport,
        RunbookMatch, TriageConfig, TriageError,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
