//! Triage Pipeline - the multi-stage RCA analysis engine
//!
//! Turns a raw error event into a root-cause-analysis report:
//! - Log pre-filtering and signal extraction
//! - Recent commit context from source control
//! - Runbook retrieval keyed on the extracted signals
//! - Report synthesis, deployment-aware when a watch is active
//!
//! The [`ingest::IngestService`] is the entrypoint; it correlates events
//! against the deployment watch registry before handing them to the
//! [`orchestrator::PipelineOrchestrator`]. External collaborators are
//! reached through the traits in [`traits`], so the whole pipeline runs
//! against mocks in tests.

#![warn(unreachable_pub)]

pub mod ingest;
pub mod orchestrator;
pub mod prefilter;
pub mod stages;
pub mod traits;

pub use ingest::{build_log_text, IngestService};
pub use orchestrator::{alert_message, PipelineOrchestrator};
pub use prefilter::filter_log_text;
pub use traits::{EscalationChannel, ReasoningEngine, RunbookIndex, SourceControl};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running the analysis pipeline
    pub use crate::ingest::IngestService;
    pub use crate::orchestrator::PipelineOrchestrator;
    pub use crate::traits::{EscalationChannel, ReasoningEngine, RunbookIndex, SourceControl};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
