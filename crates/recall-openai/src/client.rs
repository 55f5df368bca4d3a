// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible APIs.
//!
//! Provides [`OpenAiClient`] which handles request construction, bearer
//! authentication and error mapping. Requests are sent once; retry policy
//! belongs to the caller.

use std::time::Duration;

use recall_core::RecallError;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{
    ApiErrorResponse, ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse,
};

/// Which adapter a request belongs to; decides the error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Embeddings,
    ChatCompletions,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::Embeddings => "/embeddings",
            Endpoint::ChatCompletions => "/chat/completions",
        }
    }

    fn error(
        self,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> RecallError {
        match self {
            Endpoint::Embeddings => RecallError::Embedding { message, source },
            Endpoint::ChatCompletions => RecallError::Generation { message, source },
        }
    }
}

/// HTTP client for OpenAI-compatible API communication.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl OpenAiClient {
    /// Creates a new client.
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. `https://api.openai.com/v1`
    /// * `api_key` - Sent as a bearer token when present
    /// * `timeout` - Upper bound for one request
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self, RecallError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| RecallError::Config(format!("invalid API key header value: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| RecallError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Returns the API root requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /embeddings`.
    pub async fn embeddings(&self, request: &EmbeddingRequest) -> Result<EmbeddingResponse, RecallError> {
        self.post(Endpoint::Embeddings, request).await
    }

    /// `POST /chat/completions`.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, RecallError> {
        self.post(Endpoint::ChatCompletions, request).await
    }

    async fn post<B, R>(&self, endpoint: Endpoint, body: &B) -> Result<R, RecallError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint.path());
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        let status = response.status();
        debug!(status = %status, path = endpoint.path(), "provider response received");

        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&text) {
                Ok(api_err) => format!(
                    "API error ({}): {}",
                    api_err.error.type_.as_deref().unwrap_or("unknown"),
                    api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {text}"),
            };
            return Err(endpoint.error(message, None));
        }

        serde_json::from_str(&text).map_err(|e| {
            endpoint.error(
                format!("failed to parse API response: {e}"),
                Some(Box::new(e)),
            )
        })
    }

    fn transport_error(&self, endpoint: Endpoint, e: reqwest::Error) -> RecallError {
        if e.is_timeout() {
            return RecallError::Timeout {
                operation: format!("POST {}", endpoint.path()),
                duration: self.timeout,
            };
        }
        endpoint.error(format!("HTTP request failed: {e}"), Some(Box::new(e)))
    }
}
