// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector document store trait: the persistence substrate for memory nodes,
//! cache entries, and conversation messages.

use async_trait::async_trait;

use crate::error::RecallError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Collection, DocumentFilter, DocumentPatch, NewDocument, ScoredDocument, StoredDocument,
};

/// Owner-scoped document storage with vector and lexical search.
///
/// The store carries no policy: consolidation, decay and eviction
/// decisions live in the engine. Documents that have outlived their
/// collection's TTL are invisible to every method.
#[async_trait]
pub trait VectorDocumentStore: PluginAdapter {
    /// Inserts a document and returns it with its assigned id and timestamps.
    async fn insert(
        &self,
        collection: Collection,
        document: NewDocument,
    ) -> Result<StoredDocument, RecallError>;

    /// Fetches a document by id.
    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<StoredDocument>, RecallError>;

    /// Applies a patch as one write. Returns `false` if the id is unknown.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: DocumentPatch,
    ) -> Result<bool, RecallError>;

    /// Deletes a document. Returns `false` if the id is unknown.
    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, RecallError>;

    /// Lists every matching document in creation order.
    async fn list(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
    ) -> Result<Vec<StoredDocument>, RecallError>;

    /// Returns up to `k` matching documents by descending cosine similarity.
    async fn find_top_k_by_vector(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredDocument>, RecallError>;

    /// Returns up to `k` matching documents by descending full-text relevance.
    ///
    /// Scores are positive; higher is more relevant.
    async fn find_top_k_by_lexical(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
        text: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>, RecallError>;

    /// Counts matching documents.
    async fn count(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
    ) -> Result<usize, RecallError>;

    /// Deletes the `n` matching documents with the lowest numeric value of
    /// attribute `field`, ties broken by storage order. Returns the number
    /// deleted.
    async fn delete_lowest_by_field(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
        field: &str,
        n: usize,
    ) -> Result<usize, RecallError>;
}
