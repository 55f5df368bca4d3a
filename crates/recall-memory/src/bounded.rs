// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-bounded calls to the external collaborators.
//!
//! Every provider and store call the engine makes goes through [`bounded`],
//! which abandons the call once its deadline passes and reports
//! [`RecallError::Timeout`]. Nothing is retried here; callers decide.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use recall_config::model::RecallConfig;
use recall_core::RecallError;
use recall_core::traits::{EmbeddingAdapter, TextGenerationAdapter};
use recall_core::types::{EmbeddingInput, GenerationRequest};

use crate::metrics::record_timeout;

/// Deadlines and size limits applied to outbound calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallLimits {
    /// Deadline for one embedding or generation request.
    pub provider_timeout: Duration,
    /// Deadline for one document store operation.
    pub store_timeout: Duration,
    /// Whitespace tokens kept from text sent for embedding.
    pub max_embedding_tokens: usize,
    /// Completion budget for generation requests.
    pub max_tokens: u32,
}

impl CallLimits {
    pub fn from_config(config: &RecallConfig) -> Self {
        Self {
            provider_timeout: config.provider.request_timeout(),
            store_timeout: config.storage.query_timeout(),
            max_embedding_tokens: config.provider.max_embedding_tokens,
            max_tokens: config.provider.max_tokens,
        }
    }
}

impl Default for CallLimits {
    fn default() -> Self {
        Self::from_config(&RecallConfig::default())
    }
}

/// Run `call`, giving up after `limit`.
pub async fn bounded<T, F>(operation: &'static str, limit: Duration, call: F) -> Result<T, RecallError>
where
    F: Future<Output = Result<T, RecallError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, timeout_ms = limit.as_millis() as u64, "call timed out");
            record_timeout(operation);
            Err(RecallError::Timeout {
                operation: operation.to_string(),
                duration: limit,
            })
        }
    }
}

/// Keep at most `max_tokens` whitespace-separated tokens of `text`.
///
/// Text within the limit is returned unchanged; longer text is rejoined with
/// single spaces.
pub fn truncate_for_embedding(text: &str, max_tokens: usize) -> String {
    let mut tokens = text.split_whitespace();
    let kept: Vec<&str> = tokens.by_ref().take(max_tokens).collect();
    if tokens.next().is_none() {
        return text.to_string();
    }
    kept.join(" ")
}

/// Embed one text within the provider deadline.
pub async fn embed_text(
    embedder: &dyn EmbeddingAdapter,
    text: &str,
    limits: &CallLimits,
) -> Result<Vec<f32>, RecallError> {
    let input = EmbeddingInput {
        texts: vec![truncate_for_embedding(text, limits.max_embedding_tokens)],
    };
    let output = bounded("embed", limits.provider_timeout, embedder.embed(input)).await?;
    match output.embeddings.into_iter().next() {
        Some(embedding) if !embedding.is_empty() => Ok(embedding),
        _ => Err(RecallError::embedding("provider returned no embedding")),
    }
}

/// Run one completion within the provider deadline and return its text.
pub async fn generate_text(
    generator: &dyn TextGenerationAdapter,
    prompt: String,
    limits: &CallLimits,
) -> Result<String, RecallError> {
    let request = GenerationRequest {
        prompt,
        max_tokens: limits.max_tokens,
    };
    let response = bounded("generate", limits.provider_timeout, generator.generate(request)).await?;
    Ok(response.text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use recall_test_utils::{MockEmbedder, MockGenerator};

    use super::*;

    fn fast_limits() -> CallLimits {
        CallLimits {
            provider_timeout: Duration::from_millis(20),
            ..CallLimits::default()
        }
    }

    #[test]
    fn short_text_is_unchanged() {
        assert_eq!(truncate_for_embedding("a  b\nc", 3), "a  b\nc");
    }

    #[test]
    fn long_text_is_cut_to_token_limit() {
        assert_eq!(truncate_for_embedding("one two three four", 2), "one two");
    }

    #[test]
    fn default_limits_follow_config_defaults() {
        let limits = CallLimits::default();
        assert_eq!(limits.provider_timeout, Duration::from_secs(30));
        assert_eq!(limits.store_timeout, Duration::from_secs(10));
        assert_eq!(limits.max_embedding_tokens, 8000);
    }

    #[tokio::test]
    async fn bounded_passes_through_results() {
        let ok = bounded("noop", Duration::from_secs(1), async { Ok::<_, RecallError>(7) }).await;
        assert_eq!(ok.unwrap(), 7);
    }

    #[tokio::test]
    async fn slow_embedder_times_out() {
        let embedder = MockEmbedder::default().with_delay(Duration::from_millis(500));
        let err = embed_text(&embedder, "hello", &fast_limits()).await.unwrap_err();
        match err {
            RecallError::Timeout { operation, duration } => {
                assert_eq!(operation, "embed");
                assert_eq!(duration, Duration::from_millis(20));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_generator_times_out() {
        let generator = MockGenerator::new().with_delay(Duration::from_millis(500));
        let err = generate_text(&generator, "p".into(), &fast_limits())
            .await
            .unwrap_err();
        assert!(matches!(err, RecallError::Timeout { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn generated_text_is_trimmed() {
        let generator = MockGenerator::with_responses(["  7 \n"]);
        let text = generate_text(&generator, "rate".into(), &CallLimits::default())
            .await
            .unwrap();
        assert_eq!(text, "7");
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn timeout_is_logged() {
        let generator = MockGenerator::new().with_delay(Duration::from_millis(500));
        let _ = generate_text(&generator, "p".into(), &fast_limits()).await;
        assert!(logs_contain("call timed out"));
    }
}
