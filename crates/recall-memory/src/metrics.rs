// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Counters emitted by the engine through the `metrics` facade.
//!
//! Nothing is recorded unless the host installs a recorder.

use metrics::describe_counter;

use crate::types::RememberStatus;

/// Register descriptions for all engine counters.
pub fn register_metrics() {
    describe_counter!(
        "recall_memory_remember_total",
        "Remember calls by outcome (created, merged, reinforced)"
    );
    describe_counter!(
        "recall_memory_pruned_total",
        "Memory nodes deleted by the capacity prune"
    );
    describe_counter!(
        "recall_cache_lookups_total",
        "Semantic cache lookups by outcome (hit, miss)"
    );
    describe_counter!("recall_cache_saves_total", "Semantic cache entries saved");
    describe_counter!(
        "recall_search_total",
        "Hybrid searches by outcome (found, nothing_found)"
    );
    describe_counter!(
        "recall_call_timeouts_total",
        "Provider and store calls abandoned after their deadline"
    );
}

pub(crate) fn record_remember(status: RememberStatus) {
    metrics::counter!("recall_memory_remember_total", "status" => status.to_string()).increment(1);
}

pub(crate) fn record_pruned(count: usize) {
    metrics::counter!("recall_memory_pruned_total").increment(count as u64);
}

pub(crate) fn record_cache_lookup(hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    metrics::counter!("recall_cache_lookups_total", "outcome" => outcome).increment(1);
}

pub(crate) fn record_cache_save() {
    metrics::counter!("recall_cache_saves_total").increment(1);
}

pub(crate) fn record_search(found: bool) {
    let outcome = if found { "found" } else { "nothing_found" };
    metrics::counter!("recall_search_total", "outcome" => outcome).increment(1);
}

pub(crate) fn record_timeout(operation: &'static str) {
    metrics::counter!("recall_call_timeouts_total", "operation" => operation).increment(1);
}
