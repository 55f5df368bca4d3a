// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible provider adapters for the Recall memory engine.
//!
//! This crate implements [`EmbeddingAdapter`] over `POST /embeddings` and
//! [`TextGenerationAdapter`] over `POST /chat/completions`. Any server that
//! speaks these two endpoints works; point `provider.base_url` at it.

pub mod client;
pub mod types;

use async_trait::async_trait;
use recall_config::model::ProviderConfig;
use recall_core::RecallError;
use recall_core::traits::{EmbeddingAdapter, PluginAdapter, TextGenerationAdapter};
use recall_core::types::{
    AdapterType, EmbeddingInput, EmbeddingOutput, GenerationRequest, GenerationResponse,
    HealthStatus,
};
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::types::{ChatMessage, ChatRequest, EmbeddingRequest};

/// Environment variable consulted when the config carries no API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Embedding adapter for `POST /embeddings`.
pub struct OpenAiEmbedder {
    client: OpenAiClient,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    /// Creates an embedder from the provider configuration.
    ///
    /// # API Key Resolution
    /// 1. `provider.api_key` if set and non-empty
    /// 2. `OPENAI_API_KEY` environment variable
    /// 3. Returns error if neither is available
    pub fn new(config: &ProviderConfig) -> Result<Self, RecallError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = OpenAiClient::new(&config.base_url, Some(&api_key), config.request_timeout())?;
        info!(model = %config.embedding_model, "embedding provider initialized");
        Ok(Self::with_client(
            client,
            config.embedding_model.clone(),
            config.embedding_dimensions,
        ))
    }

    /// Creates an embedder with an existing client.
    pub fn with_client(client: OpenAiClient, model: String, dimensions: usize) -> Self {
        Self {
            client,
            model,
            dimensions,
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiEmbedder {
    fn name(&self) -> &str {
        "openai-embeddings"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, RecallError> {
        // No API call: health checks must not cost tokens.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RecallError> {
        debug!("embedding provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for OpenAiEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, RecallError> {
        if input.texts.is_empty() || input.texts.iter().any(|t| t.trim().is_empty()) {
            return Err(RecallError::embedding("cannot embed empty text"));
        }
        let expected = input.texts.len();
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: input.texts,
            dimensions: Some(self.dimensions),
        };
        let mut response = self.client.embeddings(&request).await?;

        if response.data.len() != expected {
            return Err(RecallError::embedding(format!(
                "expected {expected} embeddings, provider returned {}",
                response.data.len()
            )));
        }
        response.data.sort_by_key(|d| d.index);
        let embeddings: Vec<Vec<f32>> = response.data.into_iter().map(|d| d.embedding).collect();
        let dimensions = embeddings.first().map(Vec::len).unwrap_or(0);
        if dimensions == 0 || embeddings.iter().any(|e| e.len() != dimensions) {
            return Err(RecallError::embedding(
                "provider returned empty or ragged embeddings",
            ));
        }
        Ok(EmbeddingOutput {
            embeddings,
            dimensions,
        })
    }
}

/// Text generation adapter for `POST /chat/completions`.
pub struct OpenAiGenerator {
    client: OpenAiClient,
    model: String,
}

impl OpenAiGenerator {
    /// Creates a generator from the provider configuration. API key
    /// resolution follows [`OpenAiEmbedder::new`].
    pub fn new(config: &ProviderConfig) -> Result<Self, RecallError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = OpenAiClient::new(&config.base_url, Some(&api_key), config.request_timeout())?;
        info!(model = %config.generation_model, "generation provider initialized");
        Ok(Self::with_client(client, config.generation_model.clone()))
    }

    /// Creates a generator with an existing client.
    pub fn with_client(client: OpenAiClient, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai-chat"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Generation
    }

    async fn health_check(&self) -> Result<HealthStatus, RecallError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RecallError> {
        debug!("generation provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl TextGenerationAdapter for OpenAiGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, RecallError> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(request.prompt)],
            max_tokens: request.max_tokens,
        };
        let response = self.client.chat(&body).await?;
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RecallError::generation("provider returned no completion"))?;
        Ok(GenerationResponse {
            text,
            model: response.model,
        })
    }
}

/// Resolves the API key: config first, then the environment.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, RecallError> {
    if let Some(key) = config_key.as_deref().filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }
    std::env::var(API_KEY_ENV).map_err(|_| {
        RecallError::Config(format!(
            "API key not found. Set provider.api_key in config or the {API_KEY_ENV} environment variable."
        ))
    })
}
