// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Recall memory engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Recall configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RecallConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Document store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Embedding and generation endpoint settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Memory consolidation policy.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Semantic response cache policy.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Hybrid lexical/vector retrieval settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Conversation log settings.
    #[serde(default)]
    pub conversation: ConversationConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Name used in logs.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "recall".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Document store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Upper bound for any single store call.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// How often the background sweeper removes expired documents.
    #[serde(default = "default_expiry_sweep_interval_secs")]
    pub expiry_sweep_interval_secs: u64,

    /// Lifetime of stored conversation messages.
    #[serde(default = "default_conversation_ttl_secs")]
    pub conversation_ttl_secs: u64,
}

impl StorageConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            query_timeout_secs: default_query_timeout_secs(),
            expiry_sweep_interval_secs: default_expiry_sweep_interval_secs(),
            conversation_ttl_secs: default_conversation_ttl_secs(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("recall").join("recall.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("recall.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_query_timeout_secs() -> u64 {
    10
}

fn default_expiry_sweep_interval_secs() -> u64 {
    60
}

fn default_conversation_ttl_secs() -> u64 {
    30 * 24 * 60 * 60
}

/// OpenAI-compatible embedding and generation endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Base URL of the API, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key. `None` falls back to the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Embedding model name.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Dimension of vectors returned by the embedding model.
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,

    /// Chat completion model used for rating, summaries, and merges.
    #[serde(default = "default_generation_model")]
    pub generation_model: String,

    /// Completion token budget per generation call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Upper bound for any single embedding or generation call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Input longer than this many whitespace tokens is truncated before embedding.
    #[serde(default = "default_max_embedding_tokens")]
    pub max_embedding_tokens: usize,
}

impl ProviderConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
            generation_model: default_generation_model(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            max_embedding_tokens: default_max_embedding_tokens(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimensions() -> usize {
    1536
}

fn default_generation_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    512
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_embedding_tokens() -> usize {
    8000
}

/// Memory consolidation policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Maximum number of memory nodes kept per owner after each `remember`.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Similarity above which the importance sweep reinforces a node
    /// instead of decaying it.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Similarity above which new content counts as a duplicate of an
    /// existing node.
    #[serde(default = "default_duplicate_threshold")]
    pub duplicate_threshold: f64,

    /// Lower bound of the related-but-not-duplicate band that triggers a merge.
    #[serde(default = "default_merge_threshold")]
    pub merge_threshold: f64,

    /// Importance multiplier applied on reinforcement.
    #[serde(default = "default_reinforcement_factor")]
    pub reinforcement_factor: f64,

    /// Importance multiplier applied on decay.
    #[serde(default = "default_decay_factor")]
    pub decay_factor: f64,

    /// Multiplier applied to the larger importance of two merged nodes.
    #[serde(default = "default_merge_boost")]
    pub merge_boost: f64,

    /// Nearest neighbours considered for duplicate and merge detection.
    #[serde(default = "default_neighbor_count")]
    pub neighbor_count: usize,

    /// Importance used when the rating response cannot be parsed.
    #[serde(default = "default_importance")]
    pub default_importance: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            similarity_threshold: default_similarity_threshold(),
            duplicate_threshold: default_duplicate_threshold(),
            merge_threshold: default_merge_threshold(),
            reinforcement_factor: default_reinforcement_factor(),
            decay_factor: default_decay_factor(),
            merge_boost: default_merge_boost(),
            neighbor_count: default_neighbor_count(),
            default_importance: default_importance(),
        }
    }
}

fn default_max_depth() -> usize {
    5
}

fn default_similarity_threshold() -> f64 {
    0.7
}

fn default_duplicate_threshold() -> f64 {
    0.85
}

fn default_merge_threshold() -> f64 {
    0.7
}

fn default_reinforcement_factor() -> f64 {
    1.1
}

fn default_decay_factor() -> f64 {
    0.99
}

fn default_merge_boost() -> f64 {
    1.1
}

fn default_neighbor_count() -> usize {
    3
}

fn default_importance() -> f64 {
    0.5
}

/// Semantic response cache policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Similarity a stored query must exceed to be served as a hit.
    #[serde(default = "default_cache_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Lifetime of a cache entry.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_cache_similarity_threshold(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_cache_similarity_threshold() -> f64 {
    0.95
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

/// Hybrid lexical/vector retrieval settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Weight of the vector score in the hybrid score (lexical gets `1 - weight`).
    #[serde(default = "default_vector_weight")]
    pub vector_weight: f64,

    /// Minimum hybrid score for a result to be returned.
    #[serde(default = "default_result_threshold")]
    pub result_threshold: f64,

    /// Maximum number of results returned.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Candidates fetched from each search method before fusion.
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            vector_weight: default_vector_weight(),
            result_threshold: default_result_threshold(),
            top_n: default_top_n(),
            candidate_limit: default_candidate_limit(),
        }
    }
}

fn default_vector_weight() -> f64 {
    0.5
}

fn default_result_threshold() -> f64 {
    0.70
}

fn default_top_n() -> usize {
    5
}

fn default_candidate_limit() -> usize {
    20
}

/// Conversation log settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConversationConfig {
    /// Store long human messages as memories automatically.
    #[serde(default = "default_auto_remember")]
    pub auto_remember: bool,

    /// Human messages must be longer than this many characters to be remembered.
    #[serde(default = "default_auto_remember_min_chars")]
    pub auto_remember_min_chars: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            auto_remember: default_auto_remember(),
            auto_remember_min_chars: default_auto_remember_min_chars(),
        }
    }
}

fn default_auto_remember() -> bool {
    true
}

fn default_auto_remember_min_chars() -> usize {
    30
}
