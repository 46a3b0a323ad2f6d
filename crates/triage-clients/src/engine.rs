//! Reasoning engine client
//!
//! OpenAI-compatible chat-completions client. Models rarely return bare
//! JSON, so the response text goes through [`extract_json_block`] before
//! parsing: fenced ```json blocks first, then plain fences, then the
//! outermost `{...}` span.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use triage_core::error::TriageError;
use triage_pipeline::ReasoningEngine;

/// Engine endpoint configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Chat-completions base URL
    pub api_url: String,
    /// Bearer token
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl EngineConfig {
    /// Load configuration from `ENGINE_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("ENGINE_API_URL").unwrap_or(defaults.api_url),
            api_key: std::env::var("ENGINE_API_KEY").unwrap_or(defaults.api_key),
            model: std::env::var("ENGINE_MODEL").unwrap_or(defaults.model),
            timeout: defaults.timeout,
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// HTTP client for the reasoning engine
pub struct EngineClient {
    config: EngineConfig,
    http: reqwest::Client,
}

impl EngineClient {
    /// Create a client from the given configuration
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self { config, http }
    }

    /// Create a client from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(EngineConfig::from_env())
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, TriageError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| TriageError::upstream("reasoning-engine", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body, "engine request failed");
            return Err(TriageError::upstream(
                "reasoning-engine",
                format!("status {status}"),
            ));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| TriageError::upstream("reasoning-engine", e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| TriageError::upstream("reasoning-engine", "empty choices"))
    }
}

#[async_trait]
impl ReasoningEngine for EngineClient {
    async fn invoke_structured(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<serde_json::Value, TriageError> {
        let text = self.complete(system_prompt, user_prompt).await?;
        let block = extract_json_block(&text);
        serde_json::from_str(block).map_err(|e| {
            let preview: String = text.chars().take(500).collect();
            tracing::error!(error = %e, preview, "engine returned unparseable output");
            TriageError::StructuredResponse(e.to_string())
        })
    }
}

/// Carve the JSON payload out of free-form model output
///
/// Tries a ```json fence, then any ``` fence, then the outermost brace
/// span. Falls back to the trimmed input so the parse error reports the
/// real text.
#[must_use]
pub fn extract_json_block(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let rest = &text[start + 7..];
        if let Some(end) = rest.find("```") {
            return rest[..end].trim();
        }
    }
    if let Some(start) = text.find("```") {
        let rest = &text[start + 3..];
        if let Some(end) = rest.find("```") {
            return rest[..end].trim();
        }
    }
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if end > start {
            return &text[start..=end];
        }
    }
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_from_json_fence() {
        let text = "Here is the analysis:\n```json\n{\"root_cause\": \"x\"}\n```\nDone.";
        assert_eq!(extract_json_block(text), "{\"root_cause\": \"x\"}");
    }

    #[test]
    fn extracts_from_plain_fence() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json_block(text), "{\"a\": 1}");
    }

    #[test]
    fn extracts_bare_object_with_surrounding_prose() {
        let text = "Sure! {\"a\": {\"b\": 2}} hope that helps";
        assert_eq!(extract_json_block(text), "{\"a\": {\"b\": 2}}");
    }

    #[test]
    fn falls_back_to_trimmed_input() {
        assert_eq!(extract_json_block("  not json at all  "), "not json at all");
    }

    #[test]
    fn fenced_block_wins_over_bare_braces() {
        let text = "ignore {\"decoy\": true}\n```json\n{\"real\": true}\n```";
        assert_eq!(extract_json_block(text), "{\"real\": true}");
    }
}
