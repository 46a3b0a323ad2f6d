//! Deployment-announcement webhook handling
//!
//! Push events arrive as GitHub webhook payloads. Verification and
//! parsing happen before any registry interaction: the HMAC signature
//! over the raw body is checked against `X-Hub-Signature-256`, then the
//! payload is reduced to a [`DeploymentAnnouncement`].
//!
//! `head_commit` can be null for empty pushes, so commit identification
//! falls back through the `commits` list and finally the `after` SHA.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use triage_core::error::TriageError;
use triage_core::types::DeploymentAnnouncement;

type HmacSha256 = Hmac<Sha256>;

const ZERO_SHA: &str = "0000000000000000000000000000000000000000";

/// Verify a webhook body against its `X-Hub-Signature-256` header
///
/// The header carries `sha256=<hex digest>` of the raw body keyed with
/// the shared secret. Comparison is constant-time via [`Mac::verify_slice`].
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> Result<(), TriageError> {
    if secret.is_empty() {
        return Err(TriageError::Authentication(
            "webhook secret not configured".to_string(),
        ));
    }
    let hex_digest = signature.strip_prefix("sha256=").ok_or_else(|| {
        TriageError::Authentication("malformed signature header".to_string())
    })?;
    let expected = hex::decode(hex_digest)
        .map_err(|_| TriageError::Authentication("malformed signature header".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| TriageError::Authentication("invalid webhook secret".to_string()))?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| TriageError::Authentication("signature mismatch".to_string()))
}

/// A recognized webhook event
#[derive(Debug)]
pub enum PushEvent {
    /// GitHub connectivity ping, no deployment to register
    Ping,
    /// A push carrying a deployable commit
    Deployment(DeploymentAnnouncement),
}

#[derive(Deserialize)]
struct RawPayload {
    #[serde(default)]
    zen: Option<String>,
    #[serde(default)]
    repository: Option<RawRepository>,
    #[serde(default, rename = "ref")]
    git_ref: String,
    #[serde(default)]
    head_commit: Option<RawCommit>,
    #[serde(default)]
    commits: Vec<RawCommit>,
    #[serde(default)]
    after: String,
    #[serde(default)]
    pusher: Option<RawPusher>,
}

#[derive(Deserialize)]
struct RawRepository {
    #[serde(default)]
    full_name: String,
}

#[derive(Deserialize, Clone)]
struct RawCommit {
    #[serde(default)]
    id: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    author: Option<RawAuthor>,
}

#[derive(Deserialize, Clone)]
struct RawAuthor {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct RawPusher {
    #[serde(default)]
    name: String,
}

/// Parse a GitHub push-event body into an announcement
///
/// Ping events (`zen` present) are recognized and skipped. A push with
/// no identifiable commit after the full fallback chain is rejected with
/// [`TriageError::DeploymentPayload`].
pub fn parse_push_event(body: &[u8]) -> Result<PushEvent, TriageError> {
    let payload: RawPayload = serde_json::from_slice(body)
        .map_err(|e| TriageError::DeploymentPayload(format!("invalid push payload: {e}")))?;

    if payload.zen.is_some() {
        tracing::info!("received webhook ping event");
        return Ok(PushEvent::Ping);
    }

    let repository = payload
        .repository
        .as_ref()
        .map_or_else(|| "unknown/repo".to_string(), |r| r.full_name.clone());
    let branch = payload
        .git_ref
        .strip_prefix("refs/heads/")
        .unwrap_or(&payload.git_ref)
        .to_string();

    let head_commit = match payload.head_commit {
        Some(commit) => commit,
        None => match payload.commits.last() {
            Some(commit) => {
                tracing::warn!("head_commit was null, falling back to last listed commit");
                commit.clone()
            }
            None if !payload.after.is_empty() && payload.after != ZERO_SHA => {
                tracing::warn!(
                    sha = triage_core::types::abbreviate(&payload.after),
                    "no commits in payload, using after SHA"
                );
                RawCommit {
                    id: payload.after.clone(),
                    message: "Deployment push".to_string(),
                    author: payload.pusher.map(|p| RawAuthor {
                        username: None,
                        name: Some(p.name),
                    }),
                }
            }
            None => {
                return Err(TriageError::DeploymentPayload(
                    "push event carries no head_commit, commits, or after SHA".to_string(),
                ))
            }
        },
    };

    if head_commit.id.is_empty() {
        return Err(TriageError::DeploymentPayload(
            "push event commit has no SHA".to_string(),
        ));
    }

    let author = head_commit
        .author
        .and_then(|a| a.username.or(a.name))
        .unwrap_or_else(|| "unknown".to_string());

    Ok(PushEvent::Deployment(DeploymentAnnouncement {
        commit_sha: head_commit.id,
        repository,
        author,
        message: head_commit.message,
        branch,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmac::Mac;
    use pretty_assertions::assert_eq;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac key");
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn valid_signature_verifies() {
        let body = br#"{"after": "abc"}"#;
        let signature = sign("s3cret", body);
        assert!(verify_signature("s3cret", body, &signature).is_ok());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let body = br#"{"after": "abc"}"#;
        let signature = sign("other", body);
        let err = verify_signature("s3cret", body, &signature).expect_err("mismatch");
        assert!(err.is_rejection());
    }

    #[test]
    fn tampered_body_is_rejected() {
        let signature = sign("s3cret", b"original");
        assert!(verify_signature("s3cret", b"tampered", &signature).is_err());
    }

    #[test]
    fn malformed_header_is_rejected() {
        assert!(verify_signature("s3cret", b"x", "md5=abcd").is_err());
        assert!(verify_signature("s3cret", b"x", "sha256=nothex").is_err());
    }

    #[test]
    fn missing_secret_is_rejected() {
        let body = b"x";
        let signature = sign("", body);
        assert!(verify_signature("", body, &signature).is_err());
    }

    #[test]
    fn ping_events_are_recognized() {
        let body = br#"{"zen": "Design for failure.", "hook_id": 1}"#;
        assert!(matches!(parse_push_event(body), Ok(PushEvent::Ping)));
    }

    #[test]
    fn standard_push_parses_head_commit() {
        let body = serde_json::json!({
            "ref": "refs/heads/main",
            "after": "abc123def",
            "repository": {"full_name": "acme/shop"},
            "head_commit": {
                "id": "abc123def",
                "message": "refactor pricing",
                "author": {"username": "dev", "name": "Dev Eloper"}
            }
        });
        let event = parse_push_event(body.to_string().as_bytes()).expect("parses");

        let PushEvent::Deployment(announcement) = event else {
            panic!("expected deployment");
        };
        assert_eq!(announcement.commit_sha, "abc123def");
        assert_eq!(announcement.repository, "acme/shop");
        assert_eq!(announcement.author, "dev");
        assert_eq!(announcement.branch, "main");
    }

    #[test]
    fn null_head_commit_falls_back_to_commit_list() {
        let body = serde_json::json!({
            "ref": "refs/heads/main",
            "after": "ccc",
            "repository": {"full_name": "acme/shop"},
            "head_commit": null,
            "commits": [
                {"id": "aaa", "message": "first", "author": {"name": "a"}},
                {"id": "bbb", "message": "second", "author": {"name": "b"}}
            ]
        });
        let event = parse_push_event(body.to_string().as_bytes()).expect("parses");

        let PushEvent::Deployment(announcement) = event else {
            panic!("expected deployment");
        };
        assert_eq!(announcement.commit_sha, "bbb");
        assert_eq!(announcement.author, "b");
    }

    #[test]
    fn empty_push_falls_back_to_after_sha() {
        let body = serde_json::json!({
            "ref": "refs/heads/main",
            "after": "abc123def456",
            "repository": {"full_name": "acme/shop"},
            "head_commit": null,
            "commits": [],
            "pusher": {"name": "deployer"}
        });
        let event = parse_push_event(body.to_string().as_bytes()).expect("parses");

        let PushEvent::Deployment(announcement) = event else {
            panic!("expected deployment");
        };
        assert_eq!(announcement.commit_sha, "abc123def456");
        assert_eq!(announcement.author, "deployer");
        assert_eq!(announcement.message, "Deployment push");
    }

    #[test]
    fn zero_after_sha_is_rejected() {
        let body = serde_json::json!({
            "ref": "refs/heads/main",
            "after": ZERO_SHA,
            "repository": {"full_name": "acme/shop"},
            "head_commit": null,
            "commits": []
        });
        let err = parse_push_event(body.to_string().as_bytes()).expect_err("no commit");
        assert!(err.is_rejection());
    }
}
