// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt templates sent to the text generation provider.

/// The answer is read by [`crate::rating::parse_rating`].
const RATING_INSTRUCTIONS: &str = "Rate how important it is to remember the following information over the long term, on a scale from 1 to 10.
Consider whether it is a lasting fact, preference or decision (high) or small talk and transient detail (low).
Answer with the number only.";

pub(crate) fn importance_rating(text: &str) -> String {
    format!("{RATING_INSTRUCTIONS}\n\nText:\n{text}")
}

pub(crate) fn summary(text: &str) -> String {
    format!(
        "Summarize the key information in the following text in a single specific, concise sentence.\n\nText:\n{text}"
    )
}

/// `first` is the incoming text, `second` the stored one.
pub(crate) fn merge(first: &str, second: &str) -> String {
    format!(
        "The two texts below describe related information. Combine them into one coherent text that keeps every distinct fact and drops repetition.\n\nFirst text:\n{first}\n\nSecond text:\n{second}"
    )
}

pub(crate) fn merged_summary(text: &str) -> String {
    format!(
        "Summarize the key information in the following combined text in a single specific, concise sentence.\n\nText:\n{text}"
    )
}

pub(crate) fn conversation_summary(messages_json: &str) -> String {
    format!(
        "Below is a conversation as a JSON array of messages, oldest first. Each message has a kind (\"human\" or \"ai\"), its text and a timestamp.\nWrite a short summary of what was discussed and any conclusions reached.\n\n{messages_json}"
    )
}
