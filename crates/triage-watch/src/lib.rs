//! Triage Watch - deployment watch registry and bounded history stores
//!
//! The deployment-regression correlation core:
//! - A watch registry that tracks announced deployments and lazily expires
//!   their watch windows
//! - A generic bounded history store used for deployments and RCA reports
//! - A clock seam so expiry is testable without timers or sleeps
//!
//! All registry and store operations are purely in-memory and
//! non-suspending; mutations take a short-lived [`parking_lot::Mutex`] so
//! the atomicity contract holds under preemptive scheduling as well.

#![warn(unreachable_pub)]

pub mod clock;
pub mod history;
pub mod registry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use history::BoundedHistory;
pub use registry::{DeploymentWatchRegistry, WatchStatus};
