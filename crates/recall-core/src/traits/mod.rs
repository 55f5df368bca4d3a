// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the external collaborators of the engine.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod document_store;
pub mod embedding;
pub mod generation;

pub use adapter::PluginAdapter;
pub use document_store::VectorDocumentStore;
pub use embedding::EmbeddingAdapter;
pub use generation::TextGenerationAdapter;
