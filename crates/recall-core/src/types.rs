// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the adapter traits and the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of external collaborator an adapter implements.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Embedding,
    Generation,
    DocumentStore,
}

/// The document collections the engine persists into.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    MemoryNodes,
    CacheEntries,
    Conversations,
}

impl Collection {
    /// Returns the collection name as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MemoryNodes => "memory_nodes",
            Self::CacheEntries => "cache_entries",
            Self::Conversations => "conversations",
        }
    }

    /// All collections, in a stable order.
    pub const ALL: [Collection; 3] = [
        Collection::MemoryNodes,
        Collection::CacheEntries,
        Collection::Conversations,
    ];
}

/// Restricts a store query to one owner and, optionally, to documents whose
/// string attributes equal given values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFilter {
    pub owner_id: String,
    pub attributes: Vec<(String, String)>,
}

impl DocumentFilter {
    /// Matches every document of `owner_id`.
    pub fn owner(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            attributes: Vec::new(),
        }
    }

    /// Adds an attribute equality constraint.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }
}

/// A document to be inserted. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub owner_id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    /// Collection-specific fields, serialized as a JSON object.
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// Creation time; the store uses "now" when absent.
    pub created_at: Option<DateTime<Utc>>,
}

/// A persisted document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredDocument {
    pub id: String,
    pub owner_id: String,
    pub text: String,
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub attributes: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A partial update. Attributes are merged key by key into the stored object.
#[derive(Debug, Clone, Default)]
pub struct DocumentPatch {
    pub text: Option<String>,
    pub embedding: Option<Vec<f32>>,
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl DocumentPatch {
    /// Whether applying this patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.embedding.is_none() && self.attributes.is_empty()
    }
}

/// A document paired with a search score.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub document: StoredDocument,
    pub score: f32,
}

/// Input for an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    pub texts: Vec<String>,
}

/// Output from an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    pub embeddings: Vec<Vec<f32>>,
    pub dimensions: usize,
}

/// A single-turn completion request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_tokens: u32,
}

/// The text produced by a generation adapter.
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub text: String,
    pub model: String,
}

/// Formats a timestamp the way every Recall component stores it.
///
/// Fixed-width with millisecond precision so lexical order equals
/// chronological order.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
