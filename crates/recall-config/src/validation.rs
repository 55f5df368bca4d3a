// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks the relationships between thresholds and factors that serde
//! attributes cannot express. All violations are collected, not just the first.

use crate::diagnostic::ConfigError;
use crate::model::RecallConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &RecallConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.service.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "service.log_level `{}` must be one of {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    for (key, value) in [
        ("storage.query_timeout_secs", config.storage.query_timeout_secs),
        (
            "storage.expiry_sweep_interval_secs",
            config.storage.expiry_sweep_interval_secs,
        ),
        (
            "storage.conversation_ttl_secs",
            config.storage.conversation_ttl_secs,
        ),
        (
            "provider.request_timeout_secs",
            config.provider.request_timeout_secs,
        ),
        ("cache.ttl_secs", config.cache.ttl_secs),
    ] {
        if value == 0 {
            errors.push(ConfigError::validation(format!(
                "{key} must be greater than 0"
            )));
        }
    }

    if config.provider.base_url.trim().is_empty() {
        errors.push(ConfigError::validation("provider.base_url must not be empty"));
    }
    if config.provider.embedding_dimensions == 0 {
        errors.push(ConfigError::validation(
            "provider.embedding_dimensions must be greater than 0",
        ));
    }
    if config.provider.max_embedding_tokens == 0 {
        errors.push(ConfigError::validation(
            "provider.max_embedding_tokens must be greater than 0",
        ));
    }

    let memory = &config.memory;
    for (key, value) in [
        ("memory.similarity_threshold", memory.similarity_threshold),
        ("memory.duplicate_threshold", memory.duplicate_threshold),
        ("memory.merge_threshold", memory.merge_threshold),
        ("cache.similarity_threshold", config.cache.similarity_threshold),
        ("retrieval.vector_weight", config.retrieval.vector_weight),
        ("retrieval.result_threshold", config.retrieval.result_threshold),
    ] {
        if !(0.0..=1.0).contains(&value) {
            errors.push(ConfigError::validation(format!(
                "{key} must be within [0, 1], got {value}"
            )));
        }
    }

    if memory.merge_threshold >= memory.duplicate_threshold {
        errors.push(ConfigError::validation(format!(
            "memory.merge_threshold ({}) must be below memory.duplicate_threshold ({})",
            memory.merge_threshold, memory.duplicate_threshold
        )));
    }
    if !(memory.decay_factor > 0.0 && memory.decay_factor <= 1.0) {
        errors.push(ConfigError::validation(format!(
            "memory.decay_factor must be within (0, 1], got {}",
            memory.decay_factor
        )));
    }
    if !(memory.reinforcement_factor >= 1.0 && memory.reinforcement_factor.is_finite()) {
        errors.push(ConfigError::validation(format!(
            "memory.reinforcement_factor must be at least 1, got {}",
            memory.reinforcement_factor
        )));
    }
    if !(memory.merge_boost >= 1.0 && memory.merge_boost.is_finite()) {
        errors.push(ConfigError::validation(format!(
            "memory.merge_boost must be at least 1, got {}",
            memory.merge_boost
        )));
    }
    if memory.max_depth == 0 {
        errors.push(ConfigError::validation("memory.max_depth must be at least 1"));
    }
    if memory.neighbor_count < 2 {
        errors.push(ConfigError::validation(format!(
            "memory.neighbor_count must be at least 2, got {}",
            memory.neighbor_count
        )));
    }
    if !(0.1..=1.0).contains(&memory.default_importance) {
        errors.push(ConfigError::validation(format!(
            "memory.default_importance must be within [0.1, 1.0], got {}",
            memory.default_importance
        )));
    }

    let retrieval = &config.retrieval;
    if retrieval.top_n == 0 {
        errors.push(ConfigError::validation("retrieval.top_n must be at least 1"));
    }
    if retrieval.candidate_limit < retrieval.top_n {
        errors.push(ConfigError::validation(format!(
            "retrieval.candidate_limit ({}) must be at least retrieval.top_n ({})",
            retrieval.candidate_limit, retrieval.top_n
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
