// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hybrid retriever over conversation messages.
//!
//! The retriever embeds the query, gathers lexical (FTS5 BM25) and vector
//! candidates from the owner's messages, and ranks their union with
//! [`ScoreFusion`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use recall_config::model::{RecallConfig, RetrievalConfig};
use recall_core::RecallError;
use recall_core::traits::{EmbeddingAdapter, VectorDocumentStore};
use recall_core::types::{Collection, DocumentFilter, ScoredDocument, StoredDocument};

use crate::bounded::{CallLimits, bounded, embed_text};
use crate::fusion::{Ranking, ScoreFusion};
use crate::metrics::record_search;
use crate::store::validate_owner;
use crate::types::{ConversationMessage, HybridHit, SearchOutcome};

/// Hybrid retriever combining BM25 keyword search and vector similarity.
pub struct HybridRetriever {
    store: Arc<dyn VectorDocumentStore>,
    embedder: Arc<dyn EmbeddingAdapter>,
    config: RetrievalConfig,
    limits: CallLimits,
}

impl HybridRetriever {
    /// Creates a new hybrid retriever.
    pub fn new(
        store: Arc<dyn VectorDocumentStore>,
        embedder: Arc<dyn EmbeddingAdapter>,
        config: &RecallConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            config: config.retrieval.clone(),
            limits: CallLimits::from_config(config),
        }
    }

    /// Override the call deadlines.
    pub fn with_limits(mut self, limits: CallLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Search the owner's conversation messages.
    ///
    /// 1. Embeds the query text
    /// 2. Runs BM25 keyword search and vector search concurrently
    /// 3. Normalizes each side and fuses with the configured vector weight
    /// 4. Keeps the top results at or above the result threshold
    pub async fn search(&self, owner_id: &str, query: &str) -> Result<SearchOutcome, RecallError> {
        validate_owner(owner_id)?;
        if query.trim().is_empty() {
            return Err(RecallError::Validation("search query must not be empty".into()));
        }

        // Step 1: Embed the query
        let embedding = embed_text(self.embedder.as_ref(), query, &self.limits).await?;

        // Step 2: Candidates from both sides
        let filter = DocumentFilter::owner(owner_id);
        let (lexical, vector) = tokio::try_join!(
            bounded(
                "store.find_top_k_by_lexical",
                self.limits.store_timeout,
                self.store.find_top_k_by_lexical(
                    Collection::Conversations,
                    &filter,
                    query,
                    self.config.candidate_limit,
                ),
            ),
            bounded(
                "store.find_top_k_by_vector",
                self.limits.store_timeout,
                self.store.find_top_k_by_vector(
                    Collection::Conversations,
                    &filter,
                    &embedding,
                    self.config.candidate_limit,
                ),
            ),
        )?;
        debug!(
            owner_id,
            lexical = lexical.len(),
            vector = vector.len(),
            "hybrid candidates gathered"
        );

        // Step 3 and 4: Fuse and rank
        let ranking = ScoreFusion::from_config(&self.config)
            .rank(&id_scores(&lexical), &id_scores(&vector));
        let fused = match ranking {
            Ranking::Ranked(fused) => fused,
            Ranking::NothingQualified => {
                record_search(false);
                return Ok(SearchOutcome::NothingFound);
            }
        };

        let mut documents: HashMap<String, StoredDocument> = lexical
            .into_iter()
            .chain(vector)
            .map(|hit| (hit.document.id.clone(), hit.document))
            .collect();

        let mut hits = Vec::with_capacity(fused.len());
        for score in fused {
            let Some(document) = documents.remove(&score.id) else {
                continue;
            };
            hits.push(HybridHit {
                message: ConversationMessage::from_document(document)?,
                lexical_score: score.lexical,
                vector_score: score.vector,
                hybrid_score: score.hybrid,
            });
        }
        record_search(true);
        Ok(SearchOutcome::Found(hits))
    }
}

fn id_scores(hits: &[ScoredDocument]) -> Vec<(String, f32)> {
    hits.iter()
        .map(|hit| (hit.document.id.clone(), hit.score))
        .collect()
}
