// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Consolidating memory store.
//!
//! `remember` decides, per incoming text, whether to reinforce a
//! near-duplicate, merge into a related memory or create a new one. It then
//! sweeps the owner's other memories (reinforcing related ones, decaying the
//! rest) and prunes the owner down to the configured capacity.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use recall_config::model::{MemoryConfig, RecallConfig};
use recall_core::RecallError;
use recall_core::traits::{EmbeddingAdapter, TextGenerationAdapter, VectorDocumentStore};
use recall_core::types::{Collection, DocumentFilter, DocumentPatch, NewDocument};
use recall_core::vector::{average, cosine_similarity};

use crate::bounded::{CallLimits, bounded, embed_text, generate_text};
use crate::metrics::{record_pruned, record_remember};
use crate::owner_lock::OwnerLocks;
use crate::prompts;
use crate::rating::parse_rating;
use crate::types::{
    MemoryAttributes, MemoryNode, RememberOutcome, RememberStatus, SimilarMemory, SweepReport,
    effective_importance, scale_importance, to_attributes,
};

/// Field the capacity prune orders by.
const IMPORTANCE_FIELD: &str = "importance";

/// A fully prepared memory that has not been written yet.
struct MemoryDraft {
    content: String,
    summary: String,
    importance: f64,
    access_count: u64,
    embedding: Vec<f32>,
}

/// Long-term memory over a vector document store.
pub struct MemoryStore {
    store: Arc<dyn VectorDocumentStore>,
    embedder: Arc<dyn EmbeddingAdapter>,
    generator: Arc<dyn TextGenerationAdapter>,
    config: MemoryConfig,
    limits: CallLimits,
    locks: OwnerLocks,
}

impl MemoryStore {
    /// Creates a new memory store.
    pub fn new(
        store: Arc<dyn VectorDocumentStore>,
        embedder: Arc<dyn EmbeddingAdapter>,
        generator: Arc<dyn TextGenerationAdapter>,
        config: &RecallConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            config: config.memory.clone(),
            limits: CallLimits::from_config(config),
            locks: OwnerLocks::new(),
        }
    }

    /// Override the call deadlines.
    pub fn with_limits(mut self, limits: CallLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Store `content` for `owner_id`, consolidating with what is already known.
    ///
    /// 1. Embeds the content and finds its nearest memories
    /// 2. Reinforces the closest near-duplicate and stops, if there is one
    /// 3. Rates and summarizes the content
    /// 4. Merges into a related memory, or creates a new one
    /// 5. Sweeps the owner's other memories and prunes to capacity
    ///
    /// Every provider call of step 4 completes before anything is written,
    /// so a provider failure leaves the owner's memories untouched.
    pub async fn remember(
        &self,
        owner_id: &str,
        content: &str,
    ) -> Result<RememberOutcome, RecallError> {
        validate_owner(owner_id)?;
        if content.trim().is_empty() {
            return Err(RecallError::Validation(
                "memory content must not be empty".into(),
            ));
        }
        let _guard = self.locks.acquire(owner_id).await;

        // Step 1: Embed and find neighbours
        let embedding = embed_text(self.embedder.as_ref(), content, &self.limits).await?;
        let neighbours = self
            .nearest(owner_id, &embedding, self.config.neighbor_count)
            .await?;

        // Step 2: Near-duplicate short-circuit
        if let Some(duplicate) = neighbours
            .iter()
            .find(|n| f64::from(n.similarity) > self.config.duplicate_threshold)
        {
            let importance = self.reinforce(&duplicate.node).await?;
            info!(
                owner_id,
                node_id = %duplicate.node.id,
                similarity = duplicate.similarity,
                "near-duplicate memory reinforced"
            );
            record_remember(RememberStatus::Reinforced);
            return Ok(RememberOutcome {
                status: RememberStatus::Reinforced,
                node_id: duplicate.node.id.clone(),
                importance,
                pruned: 0,
            });
        }

        // Step 3: Rate and summarize
        let importance = self.assess_importance(content).await?;
        let summary = generate_text(
            self.generator.as_ref(),
            prompts::summary(content),
            &self.limits,
        )
        .await?;
        let draft = MemoryDraft {
            content: content.to_string(),
            summary,
            importance,
            access_count: 0,
            embedding: embedding.clone(),
        };

        // Step 4: Merge or create
        let merge_window = self.config.neighbor_count.saturating_sub(1);
        let related = neighbours.iter().take(merge_window).find(|n| {
            let similarity = f64::from(n.similarity);
            similarity > self.config.merge_threshold && similarity < self.config.duplicate_threshold
        });
        let (status, node_id, importance) = match related {
            Some(related) => {
                let importance = self.merge_into(&related.node, draft).await?;
                (RememberStatus::Merged, related.node.id.clone(), importance)
            }
            None => {
                let importance = draft.importance;
                let node_id = self.create(owner_id, draft).await?;
                (RememberStatus::Created, node_id, importance)
            }
        };

        // Step 5: Sweep and prune
        let sweep = self
            .sweep_importance(owner_id, &embedding, Some(&node_id))
            .await?;
        let pruned = self.prune_locked(owner_id).await?;

        info!(
            owner_id,
            node_id = %node_id,
            status = %status,
            importance,
            reinforced = sweep.reinforced,
            decayed = sweep.decayed,
            pruned,
            "memory stored"
        );
        record_remember(status);
        Ok(RememberOutcome {
            status,
            node_id,
            importance,
            pruned,
        })
    }

    /// Reinforce memories related to `embedding` and decay the rest.
    pub async fn update_importance(
        &self,
        owner_id: &str,
        embedding: &[f32],
    ) -> Result<SweepReport, RecallError> {
        validate_owner(owner_id)?;
        let _guard = self.locks.acquire(owner_id).await;
        self.sweep_importance(owner_id, embedding, None).await
    }

    /// Delete the least important memories beyond the configured capacity.
    pub async fn prune_memories(&self, owner_id: &str) -> Result<usize, RecallError> {
        validate_owner(owner_id)?;
        let _guard = self.locks.acquire(owner_id).await;
        self.prune_locked(owner_id).await
    }

    /// The `top_n` memories most similar to `embedding`, most similar first.
    pub async fn find_similar(
        &self,
        owner_id: &str,
        embedding: &[f32],
        top_n: usize,
    ) -> Result<Vec<SimilarMemory>, RecallError> {
        validate_owner(owner_id)?;
        if embedding.is_empty() {
            return Err(RecallError::Validation(
                "query embedding must not be empty".into(),
            ));
        }
        self.nearest(owner_id, embedding, top_n).await
    }

    /// Embed `query` and return the `top_n` most similar memories.
    pub async fn find_related(
        &self,
        owner_id: &str,
        query: &str,
        top_n: usize,
    ) -> Result<Vec<SimilarMemory>, RecallError> {
        validate_owner(owner_id)?;
        if query.trim().is_empty() {
            return Err(RecallError::Validation("query must not be empty".into()));
        }
        let embedding = embed_text(self.embedder.as_ref(), query, &self.limits).await?;
        self.nearest(owner_id, &embedding, top_n).await
    }

    /// All memories of `owner_id`, oldest first.
    pub async fn memories(&self, owner_id: &str) -> Result<Vec<MemoryNode>, RecallError> {
        validate_owner(owner_id)?;
        let docs = bounded(
            "store.list",
            self.limits.store_timeout,
            self.store
                .list(Collection::MemoryNodes, &DocumentFilter::owner(owner_id)),
        )
        .await?;
        docs.into_iter().map(MemoryNode::from_document).collect()
    }

    /// Nearest neighbours with cosine similarity recomputed locally.
    async fn nearest(
        &self,
        owner_id: &str,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<SimilarMemory>, RecallError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let hits = bounded(
            "store.find_top_k_by_vector",
            self.limits.store_timeout,
            self.store.find_top_k_by_vector(
                Collection::MemoryNodes,
                &DocumentFilter::owner(owner_id),
                embedding,
                k,
            ),
        )
        .await?;

        let mut similar = hits
            .into_iter()
            .map(|hit| -> Result<SimilarMemory, RecallError> {
                let similarity = cosine_similarity(embedding, &hit.document.embedding);
                let node = MemoryNode::from_document(hit.document)?;
                Ok(SimilarMemory {
                    effective_importance: effective_importance(node.importance, node.access_count),
                    similarity,
                    node,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        similar.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        Ok(similar)
    }

    /// Rate `content`, falling back to the default importance when the
    /// answer is unusable.
    async fn assess_importance(&self, content: &str) -> Result<f64, RecallError> {
        let answer = generate_text(
            self.generator.as_ref(),
            prompts::importance_rating(content),
            &self.limits,
        )
        .await?;
        match parse_rating(&answer) {
            Ok(rating) => {
                debug!(rating = rating.raw(), "importance rated");
                Ok(rating.importance())
            }
            Err(e) => {
                warn!(
                    error = %e,
                    default = self.config.default_importance,
                    "unusable importance rating, using default"
                );
                Ok(self.config.default_importance)
            }
        }
    }

    /// Bump a near-duplicate's importance and access statistics.
    async fn reinforce(&self, node: &MemoryNode) -> Result<f64, RecallError> {
        let importance = scale_importance(node.importance, self.config.reinforcement_factor);
        let attributes = to_attributes(&MemoryAttributes {
            summary: node.summary.clone(),
            importance,
            access_count: node.access_count.saturating_add(1),
            last_accessed_at: Utc::now(),
        })?;
        self.patch(
            &node.id,
            DocumentPatch {
                attributes,
                ..DocumentPatch::default()
            },
        )
        .await?;
        Ok(importance)
    }

    /// Fold `draft` into `existing` with a single update.
    async fn merge_into(&self, existing: &MemoryNode, draft: MemoryDraft) -> Result<f64, RecallError> {
        let combined = generate_text(
            self.generator.as_ref(),
            prompts::merge(&draft.content, &existing.content),
            &self.limits,
        )
        .await?;
        if combined.is_empty() {
            return Err(RecallError::generation("provider returned an empty merge"));
        }
        let summary = generate_text(
            self.generator.as_ref(),
            prompts::merged_summary(&combined),
            &self.limits,
        )
        .await?;
        let embedding = average(&draft.embedding, &existing.embedding).ok_or_else(|| {
            RecallError::Internal(format!(
                "cannot merge embeddings of width {} and {}",
                draft.embedding.len(),
                existing.embedding.len()
            ))
        })?;

        let importance = scale_importance(
            draft.importance.max(existing.importance),
            self.config.merge_boost,
        );
        let attributes = to_attributes(&MemoryAttributes {
            summary,
            importance,
            access_count: draft.access_count.saturating_add(existing.access_count),
            last_accessed_at: Utc::now(),
        })?;
        self.patch(
            &existing.id,
            DocumentPatch {
                text: Some(combined),
                embedding: Some(embedding),
                attributes,
            },
        )
        .await?;
        debug!(node_id = %existing.id, importance, "memory merged");
        Ok(importance)
    }

    async fn create(&self, owner_id: &str, draft: MemoryDraft) -> Result<String, RecallError> {
        let attributes = to_attributes(&MemoryAttributes {
            summary: draft.summary,
            importance: draft.importance,
            access_count: draft.access_count,
            last_accessed_at: Utc::now(),
        })?;
        let stored = bounded(
            "store.insert",
            self.limits.store_timeout,
            self.store.insert(
                Collection::MemoryNodes,
                NewDocument {
                    owner_id: owner_id.to_string(),
                    text: draft.content,
                    embedding: draft.embedding,
                    attributes,
                    created_at: None,
                },
            ),
        )
        .await?;
        Ok(stored.id)
    }

    /// Sweep every memory of the owner except `skip`. Caller holds the lock.
    async fn sweep_importance(
        &self,
        owner_id: &str,
        embedding: &[f32],
        skip: Option<&str>,
    ) -> Result<SweepReport, RecallError> {
        let docs = bounded(
            "store.list",
            self.limits.store_timeout,
            self.store
                .list(Collection::MemoryNodes, &DocumentFilter::owner(owner_id)),
        )
        .await?;

        let mut report = SweepReport::default();
        for doc in docs {
            if skip == Some(doc.id.as_str()) {
                continue;
            }
            let node = MemoryNode::from_document(doc)?;
            let similarity = f64::from(cosine_similarity(embedding, &node.embedding));

            let mut attributes = serde_json::Map::new();
            if similarity > self.config.similarity_threshold {
                let importance =
                    scale_importance(node.importance, self.config.reinforcement_factor);
                attributes.insert(IMPORTANCE_FIELD.into(), importance.into());
                attributes.insert(
                    "access_count".into(),
                    node.access_count.saturating_add(1).into(),
                );
                report.reinforced += 1;
            } else {
                let importance = scale_importance(node.importance, self.config.decay_factor);
                attributes.insert(IMPORTANCE_FIELD.into(), importance.into());
                report.decayed += 1;
            }
            self.patch(
                &node.id,
                DocumentPatch {
                    attributes,
                    ..DocumentPatch::default()
                },
            )
            .await?;
        }
        debug!(
            owner_id,
            reinforced = report.reinforced,
            decayed = report.decayed,
            "importance sweep complete"
        );
        Ok(report)
    }

    /// Delete lowest-importance memories above capacity. Caller holds the lock.
    async fn prune_locked(&self, owner_id: &str) -> Result<usize, RecallError> {
        let filter = DocumentFilter::owner(owner_id);
        let count = bounded(
            "store.count",
            self.limits.store_timeout,
            self.store.count(Collection::MemoryNodes, &filter),
        )
        .await?;
        if count <= self.config.max_depth {
            return Ok(0);
        }
        let excess = count - self.config.max_depth;
        let deleted = bounded(
            "store.delete_lowest_by_field",
            self.limits.store_timeout,
            self.store.delete_lowest_by_field(
                Collection::MemoryNodes,
                &filter,
                IMPORTANCE_FIELD,
                excess,
            ),
        )
        .await?;
        if deleted > 0 {
            info!(owner_id, deleted, max_depth = self.config.max_depth, "memories pruned");
            record_pruned(deleted);
        }
        Ok(deleted)
    }

    async fn patch(&self, id: &str, patch: DocumentPatch) -> Result<(), RecallError> {
        let found = bounded(
            "store.update",
            self.limits.store_timeout,
            self.store.update(Collection::MemoryNodes, id, patch),
        )
        .await?;
        if found {
            Ok(())
        } else {
            Err(RecallError::Storage {
                source: format!("memory node {id} disappeared during update").into(),
            })
        }
    }
}

pub(crate) fn validate_owner(owner_id: &str) -> Result<(), RecallError> {
    if owner_id.trim().is_empty() {
        return Err(RecallError::Validation("owner id must not be empty".into()));
    }
    Ok(())
}
