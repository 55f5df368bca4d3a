// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock embedding and generation adapters for deterministic testing.
//!
//! `MockEmbedder` returns scripted vectors for known texts and a stable
//! pseudo-random unit vector for everything else. `MockGenerator` returns
//! pre-configured completions from a FIFO queue and records every prompt.
//! Both can be switched into failing or slow modes to exercise error and
//! timeout paths.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use recall_core::RecallError;
use recall_core::traits::{EmbeddingAdapter, PluginAdapter, TextGenerationAdapter};
use recall_core::types::{
    AdapterType, EmbeddingInput, EmbeddingOutput, GenerationRequest, GenerationResponse,
    HealthStatus,
};

/// Dimensionality used by mocks unless a test asks for something else.
pub const DEFAULT_DIMENSIONS: usize = 64;

/// A mock embedding provider.
///
/// Texts registered with [`MockEmbedder::with_vector`] embed to exactly that
/// vector. Any other text embeds to a unit vector derived from its SHA-256
/// digest, so unrelated texts are nearly orthogonal.
pub struct MockEmbedder {
    dimensions: usize,
    vectors: Arc<Mutex<HashMap<String, Vec<f32>>>>,
    failing: AtomicBool,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockEmbedder {
    /// Create a mock embedder producing `dimensions`-wide vectors.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            vectors: Arc::new(Mutex::new(HashMap::new())),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Register the vector returned for `text`.
    pub fn with_vector(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        // Not yet shared, so the lock is uncontended.
        if let Ok(mut vectors) = self.vectors.try_lock() {
            vectors.insert(text.into(), vector);
        }
        self
    }

    /// Register the vector returned for `text` after construction.
    pub async fn set_vector(&self, text: impl Into<String>, vector: Vec<f32>) {
        self.vectors.lock().await.insert(text.into(), vector);
    }

    /// Sleep for `delay` before answering every request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make every subsequent request fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `embed` calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn vector_for(&self, text: &str) -> Vec<f32> {
        if let Some(vector) = self.vectors.lock().await.get(text) {
            return vector.clone();
        }
        hashed_vector(text, self.dimensions)
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

/// Deterministic unit vector seeded from the SHA-256 digest of `text`.
pub fn hashed_vector(text: &str, dimensions: usize) -> Vec<f32> {
    let digest = Sha256::digest(text.as_bytes());
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    let mut state = u64::from_le_bytes(seed_bytes);

    let mut raw: Vec<f64> = (0..dimensions)
        .map(|_| {
            // splitmix64
            state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
            let mut z = state;
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            z ^= z >> 31;
            ((z >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
        })
        .collect();

    let norm = raw.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for value in &mut raw {
            *value /= norm;
        }
    }
    raw.into_iter().map(|x| x as f32).collect()
}

#[async_trait]
impl PluginAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, RecallError> {
        if self.failing.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("failing mode".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RecallError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for MockEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, RecallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(RecallError::embedding("mock embedder failure"));
        }

        let mut embeddings = Vec::with_capacity(input.texts.len());
        for text in &input.texts {
            if text.trim().is_empty() {
                return Err(RecallError::embedding("cannot embed empty text"));
            }
            embeddings.push(self.vector_for(text).await);
        }
        Ok(EmbeddingOutput {
            embeddings,
            dimensions: self.dimensions,
        })
    }
}

/// A mock text generation provider that returns pre-configured completions.
///
/// Completions are popped from a FIFO queue. When the queue is empty,
/// a default "mock response" text is returned.
pub struct MockGenerator {
    responses: Arc<Mutex<VecDeque<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    calls: AtomicUsize,
    fail_from_call: AtomicUsize,
    delay: Option<Duration>,
}

impl MockGenerator {
    /// Create a new mock generator with an empty response queue.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            calls: AtomicUsize::new(0),
            fail_from_call: AtomicUsize::new(usize::MAX),
            delay: None,
        }
    }

    /// Create a mock generator pre-loaded with the given responses.
    pub fn with_responses<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        let generator = Self::new();
        if let Ok(mut queue) = generator.responses.try_lock() {
            queue.extend(responses.into_iter().map(Into::into));
        }
        generator
    }

    /// Sleep for `delay` before answering every request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every call from the `n`-th (zero-based) onwards.
    pub fn failing_from_call(self, n: usize) -> Self {
        self.fail_from_call.store(n, Ordering::SeqCst);
        self
    }

    /// Make every subsequent request fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        let threshold = if failing { 0 } else { usize::MAX };
        self.fail_from_call.store(threshold, Ordering::SeqCst);
    }

    /// Add a response to the end of the queue.
    pub async fn add_response(&self, text: impl Into<String>) {
        self.responses.lock().await.push_back(text.into());
    }

    /// Every prompt received so far, in order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    /// Number of `generate` calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Pop the next response, or return the default.
    async fn next_response(&self) -> String {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock response".to_string())
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockGenerator {
    fn name(&self) -> &str {
        "mock-generator"
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
        Ok(())
    }
}

#[async_trait]
impl TextGenerationAdapter for MockGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, RecallError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(request.prompt);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if call >= self.fail_from_call.load(Ordering::SeqCst) {
            return Err(RecallError::generation("mock generator failure"));
        }
        Ok(GenerationResponse {
            text: self.next_response().await,
            model: "mock-model".to_string(),
        })
    }
}
