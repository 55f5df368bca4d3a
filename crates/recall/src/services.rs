// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of the store, provider adapters and engine components.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use recall_config::RecallConfig;
use recall_core::{EmbeddingAdapter, RecallError, TextGenerationAdapter, VectorDocumentStore};
use recall_memory::{ConversationLog, MemoryStore, SemanticCache};
use recall_openai::{OpenAiEmbedder, OpenAiGenerator};
use recall_storage::{SqliteDocumentStore, spawn_expiry_sweeper};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Everything a subcommand can operate on.
pub struct Services {
    pub memory: Arc<MemoryStore>,
    pub cache: SemanticCache,
    pub conversations: ConversationLog,
}

impl Services {
    /// Open the configured database, drop expired documents and connect the
    /// OpenAI-compatible adapters.
    pub async fn connect(config: &RecallConfig) -> Result<Self, RecallError> {
        let store = Arc::new(SqliteDocumentStore::from_config(config).await?);
        let purged = store.purge_expired().await?;
        if purged > 0 {
            info!(purged, "expired documents removed");
        }

        let embedder = Arc::new(OpenAiEmbedder::new(&config.provider)?);
        let generator = Arc::new(OpenAiGenerator::new(&config.provider)?);
        debug!(
            base_url = %config.provider.base_url,
            database = %config.storage.database_path,
            "services connected"
        );
        Ok(Self::assemble(store, embedder, generator, config))
    }

    /// Build the engine components over already-constructed adapters.
    pub fn assemble(
        store: Arc<dyn VectorDocumentStore>,
        embedder: Arc<dyn EmbeddingAdapter>,
        generator: Arc<dyn TextGenerationAdapter>,
        config: &RecallConfig,
    ) -> Self {
        let memory = Arc::new(MemoryStore::new(
            store.clone(),
            embedder.clone(),
            generator.clone(),
            config,
        ));
        let cache = SemanticCache::new(store.clone(), embedder.clone(), config);
        let conversations = ConversationLog::new(store, embedder, generator, memory.clone(), config);
        Self {
            memory,
            cache,
            conversations,
        }
    }
}

/// Remove expired documents every `storage.expiry_sweep_interval_secs`
/// until `shutdown` resolves.
pub async fn run_maintenance(
    config: &RecallConfig,
    shutdown: impl Future<Output = ()>,
) -> Result<(), RecallError> {
    let store = Arc::new(SqliteDocumentStore::from_config(config).await?);
    let interval = Duration::from_secs(config.storage.expiry_sweep_interval_secs);
    let cancel = CancellationToken::new();
    let sweeper = spawn_expiry_sweeper(store, interval, cancel.clone());
    info!(
        interval_secs = config.storage.expiry_sweep_interval_secs,
        "expiry sweeper running"
    );

    shutdown.await;
    cancel.cancel();
    sweeper
        .await
        .map_err(|e| RecallError::Internal(format!("expiry sweeper failed: {e}")))?;
    info!("expiry sweeper stopped");
    Ok(())
}
