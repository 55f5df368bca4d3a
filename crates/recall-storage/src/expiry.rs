// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background removal of expired documents.
//!
//! Queries already hide expired rows; the sweeper only reclaims space.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::adapter::SqliteDocumentStore;

/// Spawn a task that calls [`SqliteDocumentStore::purge_expired`] every
/// `interval` until `cancel` fires.
pub fn spawn_expiry_sweeper(
    store: Arc<SqliteDocumentStore>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("expiry sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = store.purge_expired().await {
                        warn!(error = %e, "expiry sweep failed");
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use recall_core::types::NewDocument;
    use recall_core::{Collection, DocumentFilter, VectorDocumentStore};

    use crate::database::Database;

    #[tokio::test]
    async fn sweeper_purges_then_stops_on_cancel() {
        let store = Arc::new(
            SqliteDocumentStore::new(Database::open_in_memory().await.unwrap())
                .with_ttl(Collection::CacheEntries, Duration::from_secs(1)),
        );
        store
            .insert(
                Collection::CacheEntries,
                NewDocument {
                    owner_id: "alice".into(),
                    text: "old question".into(),
                    embedding: vec![1.0],
                    attributes: serde_json::Map::new(),
                    created_at: Some(Utc::now() - chrono::Duration::minutes(5)),
                },
            )
            .await
            .unwrap();

        let cancel = CancellationToken::new();
        let handle = spawn_expiry_sweeper(store.clone(), Duration::from_millis(10), cancel.clone());

        // The first tick fires immediately.
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        handle.await.unwrap();

        // Nothing left for a manual purge to remove.
        assert_eq!(store.purge_expired().await.unwrap(), 0);
        assert_eq!(
            store
                .count(Collection::CacheEntries, &DocumentFilter::owner("alice"))
                .await
                .unwrap(),
            0
        );
    }
}
