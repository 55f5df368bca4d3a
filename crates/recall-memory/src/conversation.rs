// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation log.
//!
//! Messages are stored, embedded, in the conversations collection so hybrid
//! search can find them. Longer human messages are also fed into long-term
//! memory.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error};

use recall_config::model::{ConversationConfig, RecallConfig};
use recall_core::RecallError;
use recall_core::traits::{EmbeddingAdapter, TextGenerationAdapter, VectorDocumentStore};
use recall_core::types::{Collection, DocumentFilter, NewDocument};

use crate::bounded::{CallLimits, bounded, embed_text, generate_text};
use crate::prompts;
use crate::retriever::HybridRetriever;
use crate::store::{MemoryStore, validate_owner};
use crate::types::{
    ContextSearchOutcome, ContextWindow, ConversationMessage, MessageAttributes, MessageKind,
    MessageReceipt, NewMessage, SearchOutcome, to_attributes,
};

/// Stores conversation messages and answers questions about them.
pub struct ConversationLog {
    store: Arc<dyn VectorDocumentStore>,
    embedder: Arc<dyn EmbeddingAdapter>,
    generator: Arc<dyn TextGenerationAdapter>,
    memory: Arc<MemoryStore>,
    retriever: HybridRetriever,
    config: ConversationConfig,
    limits: CallLimits,
}

impl ConversationLog {
    pub fn new(
        store: Arc<dyn VectorDocumentStore>,
        embedder: Arc<dyn EmbeddingAdapter>,
        generator: Arc<dyn TextGenerationAdapter>,
        memory: Arc<MemoryStore>,
        config: &RecallConfig,
    ) -> Self {
        Self {
            retriever: HybridRetriever::new(store.clone(), embedder.clone(), config),
            store,
            embedder,
            generator,
            memory,
            config: config.conversation.clone(),
            limits: CallLimits::from_config(config),
        }
    }

    /// Override the call deadlines.
    pub fn with_limits(mut self, limits: CallLimits) -> Self {
        self.retriever = self.retriever.with_limits(limits);
        self.limits = limits;
        self
    }

    /// Append a message to its conversation.
    ///
    /// Human messages longer than the configured minimum are also remembered
    /// as `From conversation {id}: {text}`. If remembering fails the message
    /// stays stored and the error is returned.
    pub async fn add_message(&self, message: NewMessage) -> Result<MessageReceipt, RecallError> {
        validate_owner(&message.owner_id)?;
        if message.conversation_id.trim().is_empty() {
            return Err(RecallError::Validation(
                "conversation id must not be empty".into(),
            ));
        }
        if message.text.trim().is_empty() {
            return Err(RecallError::Validation(
                "message text must not be empty".into(),
            ));
        }

        let embedding = embed_text(self.embedder.as_ref(), &message.text, &self.limits).await?;
        let attributes = to_attributes(&MessageAttributes {
            conversation_id: message.conversation_id.clone(),
            kind: message.kind,
            timestamp: Some(message.timestamp.unwrap_or_else(Utc::now)),
        })?;
        let stored = bounded(
            "store.insert",
            self.limits.store_timeout,
            self.store.insert(
                Collection::Conversations,
                NewDocument {
                    owner_id: message.owner_id.clone(),
                    text: message.text.clone(),
                    embedding,
                    attributes,
                    created_at: None,
                },
            ),
        )
        .await?;
        let stored = ConversationMessage::from_document(stored)?;
        debug!(
            owner_id = %stored.owner_id,
            conversation_id = %stored.conversation_id,
            kind = %stored.kind,
            "message stored"
        );

        let memory = if self.should_remember(&stored) {
            let content = format!("From conversation {}: {}", stored.conversation_id, stored.text);
            let outcome = self
                .memory
                .remember(&stored.owner_id, &content)
                .await
                .map_err(|e| {
                    error!(
                        error = %e,
                        message_id = %stored.id,
                        "failed to remember conversation message"
                    );
                    e
                })?;
            Some(outcome)
        } else {
            None
        };

        Ok(MessageReceipt {
            message: stored,
            memory,
        })
    }

    fn should_remember(&self, message: &ConversationMessage) -> bool {
        self.config.auto_remember
            && message.kind == MessageKind::Human
            && message.text.chars().count() > self.config.auto_remember_min_chars
    }

    /// The messages around `message_id` in its conversation, in order.
    ///
    /// AI messages get three earlier and two later messages, human messages
    /// two earlier and three later. Returns `None` when the message does not
    /// exist for this owner.
    pub async fn context_around(
        &self,
        owner_id: &str,
        message_id: &str,
    ) -> Result<Option<Vec<ConversationMessage>>, RecallError> {
        validate_owner(owner_id)?;
        let found = bounded(
            "store.get",
            self.limits.store_timeout,
            self.store.get(Collection::Conversations, message_id),
        )
        .await?;
        let Some(document) = found.filter(|doc| doc.owner_id == owner_id) else {
            return Ok(None);
        };
        let target = ConversationMessage::from_document(document)?;

        let conversation = self.messages(owner_id, &target.conversation_id).await?;
        let Some(position) = conversation.iter().position(|m| m.id == target.id) else {
            return Ok(Some(vec![target]));
        };

        let (before, after) = target.kind.context_span();
        let start = (position + 1).saturating_sub(before);
        let end = (position + 1 + after).min(conversation.len());
        Ok(Some(conversation[start..end].to_vec()))
    }

    /// All messages of one conversation, ordered by message timestamp.
    ///
    /// Messages with equal timestamps keep their insertion order.
    pub async fn messages(
        &self,
        owner_id: &str,
        conversation_id: &str,
    ) -> Result<Vec<ConversationMessage>, RecallError> {
        validate_owner(owner_id)?;
        let filter = DocumentFilter::owner(owner_id).with_attribute("conversation_id", conversation_id);
        let docs = bounded(
            "store.list",
            self.limits.store_timeout,
            self.store.list(Collection::Conversations, &filter),
        )
        .await?;
        let mut messages = docs
            .into_iter()
            .map(ConversationMessage::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    /// Ask the generation provider for a summary of one conversation.
    pub async fn summarize(&self, owner_id: &str, conversation_id: &str) -> Result<String, RecallError> {
        let messages = self.messages(owner_id, conversation_id).await?;
        if messages.is_empty() {
            return Err(RecallError::Validation(format!(
                "conversation {conversation_id} has no messages"
            )));
        }

        #[derive(Serialize)]
        struct Line<'a> {
            kind: MessageKind,
            text: &'a str,
            timestamp: String,
        }
        let lines: Vec<Line<'_>> = messages
            .iter()
            .map(|m| Line {
                kind: m.kind,
                text: &m.text,
                timestamp: recall_core::types::format_timestamp(&m.timestamp),
            })
            .collect();
        let json = serde_json::to_string(&lines)
            .map_err(|e| RecallError::Internal(format!("failed to serialize conversation: {e}")))?;

        generate_text(
            self.generator.as_ref(),
            prompts::conversation_summary(&json),
            &self.limits,
        )
        .await
    }

    /// Hybrid search over the owner's messages.
    pub async fn search(&self, owner_id: &str, query: &str) -> Result<SearchOutcome, RecallError> {
        self.retriever.search(owner_id, query).await
    }

    /// Hybrid search with each hit expanded to its surrounding messages.
    ///
    /// A hit already shown inside an earlier hit's window is skipped.
    pub async fn search_with_context(
        &self,
        owner_id: &str,
        query: &str,
    ) -> Result<ContextSearchOutcome, RecallError> {
        let hits = match self.retriever.search(owner_id, query).await? {
            SearchOutcome::Found(hits) => hits,
            SearchOutcome::NothingFound => return Ok(ContextSearchOutcome::NothingFound),
        };

        let mut shown: HashSet<String> = HashSet::new();
        let mut windows = Vec::with_capacity(hits.len());
        for hit in hits {
            if shown.contains(&hit.message.id) {
                continue;
            }
            let messages = self
                .context_around(owner_id, &hit.message.id)
                .await?
                .unwrap_or_else(|| vec![hit.message.clone()]);
            shown.extend(messages.iter().map(|m| m.id.clone()));
            windows.push(ContextWindow { hit, messages });
        }
        Ok(ContextSearchOutcome::Found(windows))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use recall_test_utils::TestHarness;

    use super::*;

    fn log(harness: &TestHarness) -> ConversationLog {
        let memory = Arc::new(MemoryStore::new(
            harness.store.clone(),
            harness.embedder.clone(),
            harness.generator.clone(),
            &harness.config,
        ));
        ConversationLog::new(
            harness.store.clone(),
            harness.embedder.clone(),
            harness.generator.clone(),
            memory,
            &harness.config,
        )
    }

    fn message(kind: MessageKind, text: &str, minute: i64) -> NewMessage {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        NewMessage {
            owner_id: "u1".into(),
            conversation_id: "c1".into(),
            kind,
            text: text.into(),
            timestamp: Some(base + Duration::minutes(minute)),
        }
    }

    async fn seed(log: &ConversationLog, count: i64) -> Vec<ConversationMessage> {
        let mut stored = Vec::new();
        for i in 0..count {
            let kind = if i % 2 == 0 { MessageKind::Human } else { MessageKind::Ai };
            let receipt = log.add_message(message(kind, &format!("m{i}"), i)).await.unwrap();
            stored.push(receipt.message);
        }
        stored
    }

    #[tokio::test]
    async fn short_messages_are_not_remembered() {
        let harness = TestHarness::builder().build().await.unwrap();
        let log = log(&harness);
        let receipt = log
            .add_message(message(MessageKind::Human, "hi there", 0))
            .await
            .unwrap();
        assert!(receipt.memory.is_none());
        assert_eq!(harness.generator.calls(), 0);
    }

    #[tokio::test]
    async fn long_human_messages_are_remembered() {
        let harness = TestHarness::builder()
            .with_mock_responses(["7", "prefers window seats"])
            .build()
            .await
            .unwrap();
        let log = log(&harness);
        let text = "I always prefer a window seat on long flights";
        let receipt = log
            .add_message(message(MessageKind::Human, text, 0))
            .await
            .unwrap();
        let memory = receipt.memory.expect("should be remembered");
        assert!((memory.importance - 0.7).abs() < 1e-12);

        let prompts = harness.generator.prompts().await;
        assert!(prompts[0].contains(&format!("From conversation c1: {text}")));
    }

    #[tokio::test]
    async fn long_ai_messages_are_not_remembered() {
        let harness = TestHarness::builder().build().await.unwrap();
        let log = log(&harness);
        let receipt = log
            .add_message(message(
                MessageKind::Ai,
                "Here is a rather long answer from the assistant",
                0,
            ))
            .await
            .unwrap();
        assert!(receipt.memory.is_none());
    }

    #[tokio::test]
    async fn remember_failure_is_returned_and_message_kept() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.generator.set_failing(true);
        let log = log(&harness);
        let err = log
            .add_message(message(
                MessageKind::Human,
                "this message is long enough to be remembered",
                0,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, RecallError::Generation { .. }));
        assert!(err.is_retryable());
        assert_eq!(log.messages("u1", "c1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn old_message_timestamp_does_not_expire_message() {
        let ttl = std::time::Duration::from_secs(
            RecallConfig::default().storage.conversation_ttl_secs,
        );
        let harness = TestHarness::builder()
            .with_ttl(Collection::Conversations, ttl)
            .build()
            .await
            .unwrap();
        let log = log(&harness);
        let sent = Utc.with_ymd_and_hms(2020, 3, 1, 9, 30, 0).unwrap();
        let receipt = log
            .add_message(NewMessage {
                timestamp: Some(sent),
                ..message(MessageKind::Ai, "an answer from long ago", 0)
            })
            .await
            .unwrap();
        assert_eq!(receipt.message.timestamp, sent);

        let messages = log.messages("u1", "c1").await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].timestamp, sent);
        let window = log
            .context_around("u1", &receipt.message.id)
            .await
            .unwrap()
            .expect("message should be visible");
        assert_eq!(window.len(), 1);

        assert_eq!(harness.store.purge_expired().await.unwrap(), 0);
        assert_eq!(log.messages("u1", "c1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn messages_are_ordered_by_timestamp_not_insertion() {
        let harness = TestHarness::builder().build().await.unwrap();
        let log = log(&harness);
        for (text, minute) in [("second", 5), ("first", 1), ("third", 9)] {
            log.add_message(message(MessageKind::Ai, text, minute))
                .await
                .unwrap();
        }
        let texts: Vec<String> = log
            .messages("u1", "c1")
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn empty_text_is_rejected() {
        let harness = TestHarness::builder().build().await.unwrap();
        let err = log(&harness)
            .add_message(message(MessageKind::Human, "", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, RecallError::Validation(_)));
    }

    #[tokio::test]
    async fn context_around_ai_message() {
        let harness = TestHarness::builder().build().await.unwrap();
        let log = log(&harness);
        let stored = seed(&log, 10).await;

        // m5 is an AI message: three before, itself, two after.
        let window = log.context_around("u1", &stored[5].id).await.unwrap().unwrap();
        let texts: Vec<&str> = window.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["m2", "m3", "m4", "m5", "m6", "m7"]);
    }

    #[tokio::test]
    async fn context_around_human_message() {
        let harness = TestHarness::builder().build().await.unwrap();
        let log = log(&harness);
        let stored = seed(&log, 10).await;

        // m4 is a human message: two before, itself, three after.
        let window = log.context_around("u1", &stored[4].id).await.unwrap().unwrap();
        let texts: Vec<&str> = window.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["m2", "m3", "m4", "m5", "m6", "m7"]);
    }

    #[tokio::test]
    async fn context_is_clipped_at_conversation_edges() {
        let harness = TestHarness::builder().build().await.unwrap();
        let log = log(&harness);
        let stored = seed(&log, 3).await;
        let window = log.context_around("u1", &stored[0].id).await.unwrap().unwrap();
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].id, stored[0].id);
    }

    #[tokio::test]
    async fn context_for_unknown_or_foreign_message_is_none() {
        let harness = TestHarness::builder().build().await.unwrap();
        let log = log(&harness);
        let stored = seed(&log, 2).await;
        assert!(log.context_around("u1", "missing").await.unwrap().is_none());
        assert!(log.context_around("u2", &stored[0].id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn summarize_sends_messages_as_json() {
        let harness = TestHarness::builder().build().await.unwrap();
        let log = log(&harness);
        seed(&log, 2).await;
        harness.generator.add_response("they greeted each other").await;

        let summary = log.summarize("u1", "c1").await.unwrap();
        assert_eq!(summary, "they greeted each other");
        let prompt = harness.generator.prompts().await.pop().unwrap();
        assert!(prompt.contains(r#""kind":"human""#));
        assert!(prompt.contains(r#""text":"m1""#));
    }

    #[tokio::test]
    async fn summarize_empty_conversation_is_rejected() {
        let harness = TestHarness::builder().build().await.unwrap();
        assert!(matches!(
            log(&harness).summarize("u1", "none").await,
            Err(RecallError::Validation(_))
        ));
    }
}
