//! Voice escalation client
//!
//! Places a phone call that speaks the alert message, using a
//! Twilio-style call-creation API driven by inline TwiML. An
//! unconfigured client is a logged no-op returning `false`, so
//! deployments without voice credentials still run the full pipeline.

use async_trait::async_trait;
use std::time::Duration;
use triage_core::error::TriageError;
use triage_pipeline::EscalationChannel;

/// Voice channel configuration
#[derive(Debug, Clone, Default)]
pub struct VoiceConfig {
    /// Account identifier
    pub account_sid: String,
    /// API auth token
    pub auth_token: String,
    /// Caller number
    pub from_number: String,
    /// On-call number to ring
    pub to_number: String,
}

impl VoiceConfig {
    /// Load configuration from `VOICE_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            account_sid: std::env::var("VOICE_ACCOUNT_SID").unwrap_or_default(),
            auth_token: std::env::var("VOICE_AUTH_TOKEN").unwrap_or_default(),
            from_number: std::env::var("VOICE_FROM_NUMBER").unwrap_or_default(),
            to_number: std::env::var("VOICE_TO_NUMBER").unwrap_or_default(),
        }
    }

    /// Whether every credential needed to place a call is present
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty()
            && !self.auth_token.is_empty()
            && !self.from_number.is_empty()
            && !self.to_number.is_empty()
    }
}

/// Voice-call escalation client
pub struct VoiceClient {
    config: VoiceConfig,
    base_url: String,
    http: reqwest::Client,
}

impl VoiceClient {
    /// Create a client from the given configuration
    #[must_use]
    pub fn new(config: VoiceConfig) -> Self {
        Self::with_base_url(config, "https://api.twilio.com")
    }

    /// Create a client against a non-default API host
    #[must_use]
    pub fn with_base_url(config: VoiceConfig, base_url: impl Into<String>) -> Self {
        if !config.is_configured() {
            tracing::warn!("voice channel not fully configured, alerts will be skipped");
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            config,
            base_url: base_url.into(),
            http,
        }
    }

    /// Create a client from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(VoiceConfig::from_env())
    }
}

#[async_trait]
impl EscalationChannel for VoiceClient {
    async fn send_voice_alert(&self, message: &str) -> Result<bool, TriageError> {
        if !self.config.is_configured() {
            tracing::warn!(message, "voice alert skipped, channel not configured");
            return Ok(false);
        }

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.base_url, self.config.account_sid
        );
        let twiml = build_twiml(message);

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", self.config.to_number.as_str()),
                ("From", self.config.from_number.as_str()),
                ("Twiml", twiml.as_str()),
            ])
            .send()
            .await
            .map_err(|e| TriageError::EscalationDispatch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body, "voice call creation failed");
            return Err(TriageError::EscalationDispatch(format!("status {status}")));
        }

        tracing::info!("voice alert call initiated");
        Ok(true)
    }
}

/// TwiML document that speaks the message after a short pause
///
/// The leading pause gives the callee time to raise the phone after
/// answering.
fn build_twiml(message: &str) -> String {
    format!(
        "<Response><Pause length=\"1\"/><Say>{}</Say><Pause length=\"1\"/><Say>Goodbye.</Say></Response>",
        escape_xml(message)
    )
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn configured() -> VoiceConfig {
        VoiceConfig {
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            from_number: "+15550001111".to_string(),
            to_number: "+15552223333".to_string(),
        }
    }

    #[test]
    fn configuration_requires_all_fields() {
        assert!(configured().is_configured());

        let mut partial = configured();
        partial.to_number.clear();
        assert!(!partial.is_configured());
    }

    #[tokio::test]
    async fn unconfigured_client_is_a_noop() {
        let client = VoiceClient::new(VoiceConfig::default());
        let placed = client.send_voice_alert("wake up").await.expect("ok");
        assert!(!placed);
    }

    #[test]
    fn twiml_escapes_message_text() {
        let twiml = build_twiml("alert <critical> & urgent");
        assert!(twiml.contains("alert &lt;critical&gt; &amp; urgent"));
        assert!(twiml.starts_with("<Response><Pause length=\"1\"/>"));
    }

    #[test]
    fn plain_message_passes_through() {
        assert_eq!(escape_xml("all clear"), "all clear");
    }
}
