// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text generation adapter trait.

use async_trait::async_trait;

use crate::error::RecallError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{GenerationRequest, GenerationResponse};

/// Adapter for a single-turn text completion model.
///
/// Used for importance rating, summaries, and lossless merging of memory
/// text. Fails with [`RecallError::Generation`].
#[async_trait]
pub trait TextGenerationAdapter: PluginAdapter {
    /// Completes the prompt and returns the generated text.
    async fn generate(&self, request: GenerationRequest)
    -> Result<GenerationResponse, RecallError>;
}
