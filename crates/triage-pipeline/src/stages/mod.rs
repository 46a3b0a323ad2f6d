//! The four analysis stages
//!
//! Each stage wraps exactly one collaborator call and never raises
//! outward: stages 1-3 convert any failure into a typed default, and
//! stage 4 converts its failure into the terminal error-shaped report.
//! A single upstream outage degrades report quality but never aborts a
//! run.

mod commits;
mod runbooks;
mod signals;
mod synthesis;

pub use commits::CommitContextFetcher;
pub use runbooks::RunbookMatcher;
pub use signals::SignalExtractor;
pub use synthesis::Synthesizer;
