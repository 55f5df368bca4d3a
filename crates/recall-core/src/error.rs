// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Recall memory engine.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Recall adapter traits and core operations.
#[derive(Debug, Error)]
pub enum RecallError {
    /// Caller input was rejected before any write (empty content, empty query, bad id).
    #[error("validation error: {0}")]
    Validation(String),

    /// Embedding provider failure (empty input, API failure, malformed response).
    #[error("embedding error: {message}")]
    Embedding {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Text generation provider failure (API failure, empty completion).
    #[error("generation error: {message}")]
    Generation {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Document store errors (connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A provider or store call exceeded its time budget.
    #[error("{operation} timed out after {duration:?}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RecallError {
    /// Shorthand for an embedding failure without an underlying cause.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a generation failure without an underlying cause.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
            source: None,
        }
    }

    /// Whether the caller may reasonably retry the same request.
    ///
    /// Retries are never performed inside the engine; this only tells the
    /// orchestration layer which failures are transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Embedding { .. }
                | Self::Generation { .. }
                | Self::Storage { .. }
                | Self::Timeout { .. }
        )
    }

    /// Whether this error originated in an embedding or generation provider.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, Self::Embedding { .. } | Self::Generation { .. })
    }
}
