// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types for memories, cache entries and conversation messages.
//!
//! Each type is persisted as a store document: the primary text goes into
//! the document text, the rest into typed attributes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use recall_core::RecallError;
use recall_core::types::StoredDocument;

/// A consolidated long-term memory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryNode {
    pub id: String,
    pub owner_id: String,
    pub content: String,
    pub summary: String,
    /// Retention weight. Positive; grows on reinforcement, shrinks on decay.
    pub importance: f64,
    pub access_count: u64,
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

/// Attribute fields of a memory node document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct MemoryAttributes {
    pub summary: String,
    pub importance: f64,
    pub access_count: u64,
    pub last_accessed_at: DateTime<Utc>,
}

impl MemoryNode {
    pub(crate) fn from_document(doc: StoredDocument) -> Result<Self, RecallError> {
        let attrs: MemoryAttributes = from_attributes(doc.attributes, "memory node", &doc.id)?;
        Ok(Self {
            id: doc.id,
            owner_id: doc.owner_id,
            content: doc.text,
            summary: attrs.summary,
            importance: attrs.importance,
            access_count: attrs.access_count,
            embedding: doc.embedding,
            created_at: doc.created_at,
            last_accessed_at: attrs.last_accessed_at,
        })
    }

    /// Importance weighted by how often the memory has been accessed.
    pub fn effective_importance(&self) -> f64 {
        effective_importance(self.importance, self.access_count)
    }
}

/// `importance * (1 + ln(access_count + 1))`.
pub fn effective_importance(importance: f64, access_count: u64) -> f64 {
    importance * (1.0 + (access_count as f64 + 1.0).ln())
}

/// Multiply an importance, saturating instead of overflowing to infinity or
/// underflowing to zero.
pub fn scale_importance(importance: f64, factor: f64) -> f64 {
    let scaled = importance * factor;
    if scaled.is_finite() {
        scaled.max(f64::MIN_POSITIVE)
    } else {
        f64::MAX
    }
}

/// What `remember` did with the incoming content.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RememberStatus {
    /// A near-duplicate existed and was reinforced instead.
    Reinforced,
    /// The content was folded into a related node.
    Merged,
    /// A new node was stored.
    Created,
}

/// Result of `remember`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RememberOutcome {
    pub status: RememberStatus,
    /// The node that now holds the content.
    pub node_id: String,
    /// That node's importance after the operation.
    pub importance: f64,
    /// Nodes deleted by the capacity prune.
    pub pruned: usize,
}

/// A memory returned by similarity search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarMemory {
    #[serde(flatten)]
    pub node: MemoryNode,
    pub similarity: f32,
    pub effective_importance: f64,
}

/// Counts from an importance sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub reinforced: usize,
    pub decayed: usize,
}

/// A stored query/response pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    pub id: String,
    pub owner_id: String,
    pub query: String,
    pub response: String,
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CacheAttributes {
    pub response: String,
}

impl CacheEntry {
    pub(crate) fn from_document(doc: StoredDocument) -> Result<Self, RecallError> {
        let attrs: CacheAttributes = from_attributes(doc.attributes, "cache entry", &doc.id)?;
        Ok(Self {
            id: doc.id,
            owner_id: doc.owner_id,
            query: doc.text,
            response: attrs.response,
            embedding: doc.embedding,
            created_at: doc.created_at,
        })
    }
}

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum CacheLookup {
    Hit(CacheHit),
    Miss,
}

/// A cached response close enough to the query to be reused.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheHit {
    pub response: String,
    pub query: String,
    pub entry_id: String,
    pub similarity: f32,
}

/// Who wrote a conversation message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Human,
    Ai,
}

impl MessageKind {
    /// Messages kept before (including the message itself) and after it when
    /// building a context window.
    pub fn context_span(self) -> (usize, usize) {
        match self {
            MessageKind::Ai => (4, 2),
            MessageKind::Human => (3, 3),
        }
    }
}

/// A message to append to a conversation.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub owner_id: String,
    pub conversation_id: String,
    pub kind: MessageKind,
    pub text: String,
    /// When the message was sent; "now" when absent.
    pub timestamp: Option<DateTime<Utc>>,
}

/// A stored conversation message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationMessage {
    pub id: String,
    pub owner_id: String,
    pub conversation_id: String,
    pub kind: MessageKind,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct MessageAttributes {
    pub conversation_id: String,
    pub kind: MessageKind,
    /// When the message was sent. Kept apart from the document's creation
    /// time, which is when it was stored and what expiry counts from.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ConversationMessage {
    pub(crate) fn from_document(doc: StoredDocument) -> Result<Self, RecallError> {
        let attrs: MessageAttributes =
            from_attributes(doc.attributes, "conversation message", &doc.id)?;
        Ok(Self {
            id: doc.id,
            owner_id: doc.owner_id,
            conversation_id: attrs.conversation_id,
            kind: attrs.kind,
            text: doc.text,
            timestamp: attrs.timestamp.unwrap_or(doc.created_at),
        })
    }
}

/// Result of appending a message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageReceipt {
    pub message: ConversationMessage,
    /// Set when the message qualified for auto-remember; `None` means it
    /// did not qualify.
    pub memory: Option<RememberOutcome>,
}

/// A conversation message ranked by hybrid search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HybridHit {
    pub message: ConversationMessage,
    pub lexical_score: f32,
    pub vector_score: f32,
    pub hybrid_score: f32,
}

/// Result of a hybrid search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "hits", rename_all = "snake_case")]
pub enum SearchOutcome {
    Found(Vec<HybridHit>),
    /// No candidate reached the result threshold.
    NothingFound,
}

/// A search hit with the surrounding messages of its conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextWindow {
    pub hit: HybridHit,
    pub messages: Vec<ConversationMessage>,
}

/// Result of a hybrid search expanded with conversation context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "windows", rename_all = "snake_case")]
pub enum ContextSearchOutcome {
    Found(Vec<ContextWindow>),
    NothingFound,
}

/// Serialize typed attributes into a document attribute map.
pub(crate) fn to_attributes<T: Serialize>(
    value: &T,
) -> Result<serde_json::Map<String, serde_json::Value>, RecallError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(RecallError::Internal(format!(
            "attributes must serialize to an object, got {other}"
        ))),
        Err(e) => Err(RecallError::Internal(format!(
            "failed to serialize attributes: {e}"
        ))),
    }
}

fn from_attributes<T: for<'de> Deserialize<'de>>(
    attributes: serde_json::Map<String, serde_json::Value>,
    kind: &str,
    id: &str,
) -> Result<T, RecallError> {
    serde_json::from_value(serde_json::Value::Object(attributes)).map_err(|e| {
        RecallError::Storage {
            source: format!("malformed {kind} {id}: {e}").into(),
        }
    })
}
