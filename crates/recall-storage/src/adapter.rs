// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`VectorDocumentStore`] trait.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use recall_config::RecallConfig;
use recall_core::types::{
    DocumentPatch, NewDocument, ScoredDocument, StoredDocument, format_timestamp,
};
use recall_core::{
    AdapterType, Collection, DocumentFilter, HealthStatus, PluginAdapter, RecallError,
    VectorDocumentStore,
};

use crate::database::{Database, map_tr_err};
use crate::queries::documents::{self, Scope};

/// SQLite-backed document store with per-collection TTLs.
///
/// Vector search is exact (brute-force cosine over the owner's rows);
/// lexical search uses an FTS5 index kept in sync by triggers.
pub struct SqliteDocumentStore {
    db: Database,
    ttls: HashMap<Collection, Duration>,
}

impl SqliteDocumentStore {
    /// Wrap an opened database. No collection expires until a TTL is set.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            ttls: HashMap::new(),
        }
    }

    /// Open the configured database and apply the cache and conversation TTLs.
    pub async fn from_config(config: &RecallConfig) -> Result<Self, RecallError> {
        let db = Database::open(&config.storage.database_path).await?;
        Ok(Self::new(db)
            .with_ttl(Collection::CacheEntries, config.cache.ttl())
            .with_ttl(
                Collection::Conversations,
                Duration::from_secs(config.storage.conversation_ttl_secs),
            ))
    }

    /// Expire documents of `collection` once they are older than `ttl`.
    pub fn with_ttl(mut self, collection: Collection, ttl: Duration) -> Self {
        self.ttls.insert(collection, ttl);
        self
    }

    /// The TTL configured for `collection`, if any.
    pub fn ttl(&self, collection: Collection) -> Option<Duration> {
        self.ttls.get(&collection).copied()
    }

    /// Timestamp at or before which documents of `collection` are expired.
    ///
    /// The empty string sorts before every timestamp, so it hides nothing.
    fn cutoff(&self, collection: Collection) -> String {
        self.ttl(collection)
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
            .map(|at| format_timestamp(&at))
            .unwrap_or_default()
    }

    fn scope(&self, collection: Collection, filter: &DocumentFilter) -> Scope {
        Scope::new(collection, filter, self.cutoff(collection))
    }

    /// Physically remove every expired document. Returns the number removed.
    pub async fn purge_expired(&self) -> Result<usize, RecallError> {
        let mut removed = 0;
        for collection in Collection::ALL {
            if self.ttl(collection).is_none() {
                continue;
            }
            let n = documents::purge_before(&self.db, collection, self.cutoff(collection)).await?;
            if n > 0 {
                info!(collection = %collection, removed = n, "purged expired documents");
            }
            removed += n;
        }
        Ok(removed)
    }
}

#[async_trait]
impl PluginAdapter for SqliteDocumentStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::DocumentStore
    }

    async fn health_check(&self) -> Result<HealthStatus, RecallError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RecallError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("shutdown: WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl VectorDocumentStore for SqliteDocumentStore {
    async fn insert(
        &self,
        collection: Collection,
        document: NewDocument,
    ) -> Result<StoredDocument, RecallError> {
        let stored = documents::insert(&self.db, collection, document).await?;
        debug!(collection = %collection, id = %stored.id, owner_id = %stored.owner_id, "document inserted");
        Ok(stored)
    }

    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<StoredDocument>, RecallError> {
        documents::get(&self.db, collection, id, self.cutoff(collection)).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: DocumentPatch,
    ) -> Result<bool, RecallError> {
        if patch.is_empty() {
            return Ok(self.get(collection, id).await?.is_some());
        }
        documents::update(&self.db, collection, id, patch, self.cutoff(collection)).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, RecallError> {
        documents::delete(&self.db, collection, id).await
    }

    async fn list(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
    ) -> Result<Vec<StoredDocument>, RecallError> {
        documents::list(&self.db, self.scope(collection, filter)).await
    }

    async fn find_top_k_by_vector(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredDocument>, RecallError> {
        documents::find_top_k_by_vector(
            &self.db,
            self.scope(collection, filter),
            vector.to_vec(),
            k,
        )
        .await
    }

    async fn find_top_k_by_lexical(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
        text: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>, RecallError> {
        documents::find_top_k_by_lexical(&self.db, self.scope(collection, filter), text, k).await
    }

    async fn count(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
    ) -> Result<usize, RecallError> {
        documents::count(&self.db, self.scope(collection, filter)).await
    }

    async fn delete_lowest_by_field(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
        field: &str,
        n: usize,
    ) -> Result<usize, RecallError> {
        let removed =
            documents::delete_lowest_by_field(&self.db, self.scope(collection, filter), field, n)
                .await?;
        debug!(collection = %collection, owner_id = %filter.owner_id, field, removed, "deleted lowest documents");
        Ok(removed)
    }
}
