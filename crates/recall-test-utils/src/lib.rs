// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Recall integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockEmbedder`] - Mock embedding provider with scripted vectors
//! - [`MockGenerator`] - Mock text generator with pre-configured completions
//! - [`TestHarness`] - In-memory store plus mocks, ready for engine wiring
//! - [`vectors`] - Vectors with exactly known cosine similarities

pub mod harness;
pub mod mock_provider;
pub mod vectors;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_provider::{MockEmbedder, MockGenerator};
