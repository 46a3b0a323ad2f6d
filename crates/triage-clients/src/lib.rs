//! Triage Clients - concrete collaborator implementations
//!
//! Implements the pipeline's collaborator traits against real services:
//! - [`engine`]: OpenAI-compatible chat-completions reasoning engine
//! - [`github`]: GitHub REST source-control client
//! - [`runbooks`]: vector-search runbook index client
//! - [`voice`]: Twilio-style voice escalation channel
//!
//! plus [`webhook`] for deployment-announcement signature verification
//! and push-event parsing.

#![warn(unreachable_pub)]

pub mod engine;
pub mod github;
pub mod runbooks;
pub mod voice;
pub mod webhook;

pub use engine::{EngineClient, EngineConfig};
pub use github::GitHubClient;
pub use runbooks::RunbookClient;
pub use voice::{VoiceClient, VoiceConfig};
pub use webhook::{parse_push_event, verify_signature, PushEvent};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
