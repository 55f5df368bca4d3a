// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for engine integration testing.
//!
//! `TestHarness` assembles an in-memory SQLite document store, a mock
//! embedder and a mock generator, plus a configuration the engine
//! components can be built from.

use std::sync::Arc;
use std::time::Duration;

use recall_config::model::RecallConfig;
use recall_core::{Collection, RecallError};
use recall_storage::{Database, SqliteDocumentStore};

use crate::mock_provider::{DEFAULT_DIMENSIONS, MockEmbedder, MockGenerator};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    vectors: Vec<(String, Vec<f32>)>,
    dimensions: usize,
    config: RecallConfig,
    ttls: Vec<(Collection, Duration)>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            vectors: Vec::new(),
            dimensions: DEFAULT_DIMENSIONS,
            config: RecallConfig::default(),
            ttls: Vec::new(),
        }
    }

    /// Queue mock generator completions.
    pub fn with_mock_responses<S: Into<String>>(
        mut self,
        responses: impl IntoIterator<Item = S>,
    ) -> Self {
        self.responses.extend(responses.into_iter().map(Into::into));
        self
    }

    /// Script the embedding returned for `text`.
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.push((text.into(), vector));
        self
    }

    /// Set the mock embedding width.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Adjust the configuration before the harness is built.
    pub fn with_config(mut self, configure: impl FnOnce(&mut RecallConfig)) -> Self {
        configure(&mut self.config);
        self
    }

    /// Expire documents of `collection` after `ttl`.
    pub fn with_ttl(mut self, collection: Collection, ttl: Duration) -> Self {
        self.ttls.push((collection, ttl));
        self
    }

    /// Build the test harness.
    pub async fn build(self) -> Result<TestHarness, RecallError> {
        let db = Database::open_in_memory().await?;
        let mut store = SqliteDocumentStore::new(db);
        for (collection, ttl) in self.ttls {
            store = store.with_ttl(collection, ttl);
        }

        let mut embedder = MockEmbedder::new(self.dimensions);
        for (text, vector) in self.vectors {
            embedder = embedder.with_vector(text, vector);
        }

        Ok(TestHarness {
            store: Arc::new(store),
            embedder: Arc::new(embedder),
            generator: Arc::new(MockGenerator::with_responses(self.responses)),
            config: self.config,
        })
    }
}

/// A complete engine environment backed by mocks and an in-memory database.
pub struct TestHarness {
    pub store: Arc<SqliteDocumentStore>,
    pub embedder: Arc<MockEmbedder>,
    pub generator: Arc<MockGenerator>,
    pub config: RecallConfig,
}

impl TestHarness {
    /// Start building a harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }
}
