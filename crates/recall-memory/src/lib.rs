// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term memory engine for Recall.
//!
//! Consolidates incoming text into a bounded set of memories per owner,
//! caches responses by query meaning, and searches conversation history with
//! hybrid lexical/vector ranking. All persistence goes through a
//! [`recall_core::VectorDocumentStore`]; embeddings and text generation come
//! from the provider adapters.
//!
//! ## Architecture
//!
//! - **MemoryStore**: remember (reinforce / merge / create), importance sweep, capacity prune
//! - **SemanticCache**: query/response pairs matched by embedding similarity
//! - **ConversationLog**: message storage, context windows, summaries, auto-remember
//! - **HybridRetriever**: BM25 + vector candidates ranked by ScoreFusion
//! - **ScoreFusion**: max-normalized convex fusion with an explicit empty outcome
//! - **OwnerLocks**: per-owner serialization of read-modify-write sequences
//! - **bounded**: provider and store calls with deadlines

pub mod bounded;
pub mod cache;
pub mod conversation;
pub mod fusion;
pub mod metrics;
pub mod owner_lock;
mod prompts;
pub mod rating;
pub mod retriever;
pub mod store;
pub mod types;

pub use bounded::CallLimits;
pub use cache::SemanticCache;
pub use conversation::ConversationLog;
pub use fusion::{Ranking, ScoreFusion};
pub use owner_lock::OwnerLocks;
pub use rating::{Rating, RatingParseError, parse_rating};
pub use retriever::HybridRetriever;
pub use store::MemoryStore;
pub use types::*;
