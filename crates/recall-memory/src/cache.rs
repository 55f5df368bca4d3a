// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic response cache.
//!
//! Responses are keyed by the embedding of the query that produced them. A
//! lookup returns the stored response of the single closest query, but only
//! when that query is nearly identical in meaning.

use std::sync::Arc;

use tracing::debug;

use recall_config::model::{CacheConfig, RecallConfig};
use recall_core::RecallError;
use recall_core::traits::{EmbeddingAdapter, VectorDocumentStore};
use recall_core::types::{Collection, DocumentFilter, NewDocument};
use recall_core::vector::cosine_similarity;

use crate::bounded::{CallLimits, bounded, embed_text};
use crate::metrics::{record_cache_lookup, record_cache_save};
use crate::owner_lock::OwnerLocks;
use crate::store::validate_owner;
use crate::types::{CacheAttributes, CacheEntry, CacheHit, CacheLookup, to_attributes};

/// Query/response cache over a vector document store.
pub struct SemanticCache {
    store: Arc<dyn VectorDocumentStore>,
    embedder: Arc<dyn EmbeddingAdapter>,
    config: CacheConfig,
    limits: CallLimits,
    locks: OwnerLocks,
}

impl SemanticCache {
    pub fn new(
        store: Arc<dyn VectorDocumentStore>,
        embedder: Arc<dyn EmbeddingAdapter>,
        config: &RecallConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            config: config.cache.clone(),
            limits: CallLimits::from_config(config),
            locks: OwnerLocks::new(),
        }
    }

    /// Override the call deadlines.
    pub fn with_limits(mut self, limits: CallLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Store `response` for `query`.
    ///
    /// `embedding` is used as-is when given and non-empty; otherwise the
    /// query is embedded.
    pub async fn save(
        &self,
        owner_id: &str,
        query: &str,
        response: &str,
        embedding: Option<Vec<f32>>,
    ) -> Result<CacheEntry, RecallError> {
        validate_owner(owner_id)?;
        if query.trim().is_empty() {
            return Err(RecallError::Validation("cache query must not be empty".into()));
        }

        let embedding = match embedding {
            Some(embedding) if !embedding.is_empty() => embedding,
            _ => embed_text(self.embedder.as_ref(), query, &self.limits).await?,
        };
        let attributes = to_attributes(&CacheAttributes {
            response: response.to_string(),
        })?;

        let _guard = self.locks.acquire(owner_id).await;
        let stored = bounded(
            "store.insert",
            self.limits.store_timeout,
            self.store.insert(
                Collection::CacheEntries,
                NewDocument {
                    owner_id: owner_id.to_string(),
                    text: query.to_string(),
                    embedding,
                    attributes,
                    created_at: None,
                },
            ),
        )
        .await?;
        debug!(owner_id, entry_id = %stored.id, "cache entry saved");
        record_cache_save();
        CacheEntry::from_document(stored)
    }

    /// Return the cached response for the closest stored query, if it is
    /// strictly more similar than the configured threshold.
    pub async fn lookup(&self, owner_id: &str, query: &str) -> Result<CacheLookup, RecallError> {
        validate_owner(owner_id)?;
        if query.trim().is_empty() {
            return Err(RecallError::Validation("cache query must not be empty".into()));
        }

        let embedding = embed_text(self.embedder.as_ref(), query, &self.limits).await?;
        let hits = bounded(
            "store.find_top_k_by_vector",
            self.limits.store_timeout,
            self.store.find_top_k_by_vector(
                Collection::CacheEntries,
                &DocumentFilter::owner(owner_id),
                &embedding,
                1,
            ),
        )
        .await?;

        let best = match hits.into_iter().next() {
            Some(hit) => hit.document,
            None => {
                record_cache_lookup(false);
                return Ok(CacheLookup::Miss);
            }
        };
        let similarity = cosine_similarity(&embedding, &best.embedding);
        if f64::from(similarity) <= self.config.similarity_threshold {
            debug!(owner_id, similarity, "cache miss");
            record_cache_lookup(false);
            return Ok(CacheLookup::Miss);
        }

        let entry = CacheEntry::from_document(best)?;
        debug!(owner_id, entry_id = %entry.id, similarity, "cache hit");
        record_cache_lookup(true);
        Ok(CacheLookup::Hit(CacheHit {
            response: entry.response,
            query: entry.query,
            entry_id: entry.id,
            similarity,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use recall_test_utils::TestHarness;
    use recall_test_utils::vectors::{axis, blend};

    use super::*;

    const DIM: usize = 8;

    fn cache(harness: &TestHarness) -> SemanticCache {
        SemanticCache::new(harness.store.clone(), harness.embedder.clone(), &harness.config)
    }

    #[tokio::test]
    async fn lookup_on_empty_cache_misses() {
        let harness = TestHarness::builder().build().await.unwrap();
        let result = cache(&harness).lookup("u1", "anything").await.unwrap();
        assert_eq!(result, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn identical_query_hits() {
        let harness = TestHarness::builder().build().await.unwrap();
        let cache = cache(&harness);
        cache
            .save("u1", "capital of France?", "Paris", None)
            .await
            .unwrap();
        match cache.lookup("u1", "capital of France?").await.unwrap() {
            CacheLookup::Hit(hit) => {
                assert_eq!(hit.response, "Paris");
                assert!(hit.similarity > 0.99);
            }
            CacheLookup::Miss => panic!("expected a hit"),
        }
    }

    #[tokio::test]
    async fn threshold_is_strict() {
        let harness = TestHarness::builder()
            .with_dimensions(DIM)
            .with_vector("close", blend(DIM, 0, 1, 0.97))
            .with_vector("not close enough", blend(DIM, 0, 2, 0.93))
            .build()
            .await
            .unwrap();
        let cache = cache(&harness);
        cache
            .save("u1", "stored", "answer", Some(axis(DIM, 0)))
            .await
            .unwrap();

        assert!(matches!(
            cache.lookup("u1", "close").await.unwrap(),
            CacheLookup::Hit(_)
        ));
        assert_eq!(
            cache.lookup("u1", "not close enough").await.unwrap(),
            CacheLookup::Miss
        );
    }

    #[tokio::test]
    async fn provided_embedding_skips_provider() {
        let harness = TestHarness::builder().with_dimensions(DIM).build().await.unwrap();
        let cache = cache(&harness);
        cache
            .save("u1", "q", "r", Some(axis(DIM, 3)))
            .await
            .unwrap();
        assert_eq!(harness.embedder.calls(), 0);

        cache.save("u1", "q2", "r2", Some(Vec::new())).await.unwrap();
        assert_eq!(harness.embedder.calls(), 1);
    }

    #[tokio::test]
    async fn owners_do_not_share_entries() {
        let harness = TestHarness::builder().build().await.unwrap();
        let cache = cache(&harness);
        cache.save("u1", "q", "mine", None).await.unwrap();
        assert_eq!(cache.lookup("u2", "q").await.unwrap(), CacheLookup::Miss);
    }

    #[tokio::test]
    async fn embedding_failure_is_an_error_not_a_miss() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.embedder.set_failing(true);
        let err = cache(&harness).lookup("u1", "q").await.unwrap_err();
        assert!(matches!(err, RecallError::Embedding { .. }));
    }

    #[tokio::test]
    async fn expired_entries_are_not_returned() {
        let harness = TestHarness::builder()
            .with_ttl(Collection::CacheEntries, Duration::from_millis(1))
            .build()
            .await
            .unwrap();
        let cache = cache(&harness);
        cache.save("u1", "q", "r", None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.lookup("u1", "q").await.unwrap(), CacheLookup::Miss);
    }
}
