//! Error taxonomy for the triage engine
//!
//! Distinguishes failures that are absorbed at the stage-adapter boundary
//! (upstream calls, malformed structured responses) from the two classes
//! that reject a request before any pipeline or registry interaction
//! (payload and authentication failures). Escalation dispatch failures are
//! logged and discarded, never surfaced.

/// Main triage error type
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    /// An external collaborator call failed
    #[error("upstream call failed ({collaborator}): {message}")]
    Upstream {
        /// Which collaborator failed
        collaborator: &'static str,
        /// Failure detail
        message: String,
    },

    /// The reasoning engine returned output that could not be parsed as JSON
    #[error("structured response error: {0}")]
    StructuredResponse(String),

    /// The deployment announcement carried no identifiable commit
    #[error("invalid deployment payload: {0}")]
    DeploymentPayload(String),

    /// Signature or credential mismatch on the announcement channel
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The escalation channel could not dispatch the alert
    #[error("escalation dispatch failed: {0}")]
    EscalationDispatch(String),
}

impl TriageError {
    /// Upstream failure for a named collaborator
    #[inline]
    pub fn upstream(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            collaborator,
            message: message.into(),
        }
    }

    /// Whether this error rejects the request outright
    ///
    /// Rejections are surfaced to the caller before any pipeline or
    /// registry interaction; everything else degrades in place.
    #[inline]
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::DeploymentPayload(_) | Self::Authentication(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_display() {
        let err = TriageError::upstream("source-control", "503 unavailable");
        assert!(err.to_string().contains("source-control"));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn rejection_classification() {
        assert!(TriageError::DeploymentPayload("no commit".to_string()).is_rejection());
        assert!(TriageError::Authentication("bad signature".to_string()).is_rejection());
        assert!(!TriageError::upstream("engine", "timeout").is_rejection());
        assert!(!TriageError::StructuredResponse("not json".to_string()).is_rejection());
    }
}
