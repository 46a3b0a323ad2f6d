//! Stage 1: log-signal extraction
//!
//! Pre-filters the raw log blob, then asks the reasoning engine for a
//! structured digest of error signals, stack traces, and patterns.

use crate::prefilter::filter_log_text;
use crate::traits::ReasoningEngine;
use std::sync::Arc;
use triage_core::error::TriageError;
use triage_core::types::LogAnalysis;

const SYSTEM_PROMPT: &str = r#"You are a log analysis expert. Extract critical information from logs.

Your task:
1. Identify all ERROR, EXCEPTION, or CRITICAL log lines
2. Extract stack traces
3. Identify timing patterns (timeouts, delays)
4. Extract database errors
5. Note any null pointer or connection issues

Return ONLY valid JSON with this structure:
{
    "error_signals": ["list of error types found"],
    "stack_traces": ["extracted stack traces"],
    "key_errors": ["most critical error messages"],
    "patterns": ["timing issues, deadlocks, etc"]
}"#;

/// Signal extractor stage
pub struct SignalExtractor {
    engine: Arc<dyn ReasoningEngine>,
    context_lines: usize,
}

impl SignalExtractor {
    /// Create the stage
    #[must_use]
    pub fn new(engine: Arc<dyn ReasoningEngine>, context_lines: usize) -> Self {
        Self {
            engine,
            context_lines,
        }
    }

    /// Extract structured signals from a log blob
    ///
    /// Never fails outward: any engine or parse failure degrades to
    /// [`LogAnalysis::failed`].
    pub async fn analyze(&self, log_text: &str) -> LogAnalysis {
        let filtered = filter_log_text(log_text, self.context_lines);
        let user_prompt = format!(
            "Analyze these logs and extract error signals:\n\n{filtered}\n\nReturn structured JSON only."
        );

        let outcome = self
            .engine
            .invoke_structured(SYSTEM_PROMPT, &user_prompt)
            .await
            .and_then(|value| {
                serde_json::from_value::<LogAnalysis>(value)
                    .map_err(|e| TriageError::StructuredResponse(e.to_string()))
            });

        match outcome {
            Ok(analysis) => {
                tracing::info!(
                    signals = analysis.error_signals.len(),
                    "extracted log signals"
                );
                analysis
            }
            Err(e) => {
                tracing::error!(error = %e, "log analysis failed");
                LogAnalysis::failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockReasoningEngine;

    #[tokio::test]
    async fn extracts_signals_from_engine_json() {
        let mut engine = MockReasoningEngine::new();
        engine.expect_invoke_structured().returning(|_, _| {
            Ok(serde_json::json!({
                "error_signals": ["ConnectionError"],
                "stack_traces": [],
                "key_errors": ["db refused"],
                "patterns": ["timeout"]
            }))
        });

        let stage = SignalExtractor::new(Arc::new(engine), 5);
        let analysis = stage.analyze("ERROR: db refused").await;

        assert_eq!(analysis.error_signals, vec!["ConnectionError"]);
        assert_eq!(analysis.patterns, vec!["timeout"]);
    }

    #[tokio::test]
    async fn engine_failure_degrades_to_default() {
        let mut engine = MockReasoningEngine::new();
        engine
            .expect_invoke_structured()
            .returning(|_, _| Err(TriageError::upstream("engine", "unreachable")));

        let stage = SignalExtractor::new(Arc::new(engine), 5);
        let analysis = stage.analyze("ERROR: boom").await;

        assert_eq!(analysis.error_signals, vec!["analysis_failed"]);
        assert_eq!(analysis.key_errors.len(), 1);
        assert!(analysis.key_errors[0].contains("unreachable"));
    }

    #[tokio::test]
    async fn non_object_response_degrades_to_default() {
        let mut engine = MockReasoningEngine::new();
        engine
            .expect_invoke_structured()
            .returning(|_, _| Ok(serde_json::json!("not an object")));

        let stage = SignalExtractor::new(Arc::new(engine), 5);
        let analysis = stage.analyze("ERROR: boom").await;

        assert_eq!(analysis.error_signals, vec!["analysis_failed"]);
    }
}
