// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Recall memory engine.
//!
//! This crate provides the error taxonomy, the adapter traits for the
//! engine's external collaborators (embedding provider, text generation
//! provider, vector document store), the document types exchanged with the
//! store, and the vector math shared by every other crate.

pub mod error;
pub mod traits;
pub mod types;
pub mod vector;

// Re-export key items at crate root for ergonomic imports.
pub use error::RecallError;
pub use types::{AdapterType, Collection, DocumentFilter, HealthStatus};

// Re-export all adapter traits at crate root.
pub use traits::{EmbeddingAdapter, PluginAdapter, TextGenerationAdapter, VectorDocumentStore};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn recall_error_has_all_variants() {
        let _validation = RecallError::Validation("empty".into());
        let _embedding = RecallError::embedding("down");
        let _generation = RecallError::generation("down");
        let _storage = RecallError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _timeout = RecallError::Timeout {
            operation: "embed".into(),
            duration: std::time::Duration::from_secs(30),
        };
        let _config = RecallError::Config("test".into());
        let _internal = RecallError::Internal("test".into());
    }

    #[test]
    fn retryable_classification() {
        assert!(RecallError::embedding("x").is_retryable());
        assert!(RecallError::generation("x").is_retryable());
        assert!(
            RecallError::Timeout {
                operation: "generate".into(),
                duration: std::time::Duration::from_millis(5),
            }
            .is_retryable()
        );
        assert!(!RecallError::Validation("x".into()).is_retryable());
        assert!(!RecallError::Config("x".into()).is_retryable());
        assert!(RecallError::generation("x").is_provider_error());
        assert!(
            !RecallError::Storage {
                source: Box::new(std::io::Error::other("x"))
            }
            .is_provider_error()
        );
    }

    #[test]
    fn timeout_message_names_operation() {
        let err = RecallError::Timeout {
            operation: "embed".into(),
            duration: std::time::Duration::from_secs(2),
        };
        assert_eq!(err.to_string(), "embed timed out after 2s");
    }

    #[test]
    fn adapter_type_display_roundtrip() {
        for variant in [
            AdapterType::Embedding,
            AdapterType::Generation,
            AdapterType::DocumentStore,
        ] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn collection_names_match_strum() {
        for collection in Collection::ALL {
            assert_eq!(collection.to_string(), collection.as_str());
            assert_eq!(Collection::from_str(collection.as_str()).unwrap(), collection);
        }
    }

    #[test]
    fn health_status_variants() {
        assert_eq!(HealthStatus::Healthy, HealthStatus::Healthy);
        assert_ne!(HealthStatus::Degraded("slow".into()), HealthStatus::Healthy);
        assert_ne!(HealthStatus::Unhealthy("down".into()), HealthStatus::Healthy);
    }

    #[test]
    fn document_filter_builder() {
        let filter = DocumentFilter::owner("alice").with_attribute("conversation_id", "c1");
        assert_eq!(filter.owner_id, "alice");
        assert_eq!(
            filter.attributes,
            vec![("conversation_id".to_string(), "c1".to_string())]
        );
    }

    #[test]
    fn timestamps_sort_lexically() {
        use chrono::{TimeZone, Utc};
        let early = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let late = early + chrono::Duration::milliseconds(1);
        assert_eq!(types::format_timestamp(&early), "2026-01-02T03:04:05.000Z");
        assert!(types::format_timestamp(&early) < types::format_timestamp(&late));
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_embedding_adapter<T: EmbeddingAdapter>() {}
        fn _assert_generation_adapter<T: TextGenerationAdapter>() {}
        fn _assert_document_store<T: VectorDocumentStore>() {}
    }
}
