// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Recall memory engine.
//!
//! Implements [`recall_core::VectorDocumentStore`] on a WAL-mode SQLite
//! database with embedded migrations, a single-writer concurrency model via
//! `tokio-rusqlite`, FTS5 for lexical search, and per-collection TTLs.

pub mod adapter;
pub mod database;
pub mod expiry;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteDocumentStore;
pub use database::Database;
pub use expiry::spawn_expiry_sweeper;
