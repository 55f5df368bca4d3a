// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end consolidation scenarios against the SQLite store.

use std::sync::Arc;
use std::time::Duration;

use recall_core::RecallError;
use recall_core::vector::cosine_similarity;
use recall_memory::{CallLimits, MemoryStore, RememberStatus};
use recall_test_utils::vectors::{axis, blend};
use recall_test_utils::{MockEmbedder, MockGenerator, TestHarness};

const DIM: usize = 16;

fn memory_store(harness: &TestHarness) -> MemoryStore {
    MemoryStore::new(
        harness.store.clone(),
        harness.embedder.clone(),
        harness.generator.clone(),
        &harness.config,
    )
}

#[tokio::test]
async fn capacity_prune_drops_lowest_importance() {
    let harness = TestHarness::builder()
        .with_dimensions(DIM)
        .with_config(|c| c.memory.max_depth = 2)
        .with_vector("Alice prefers tea over coffee", axis(DIM, 0))
        .with_vector("Bob moved to Lisbon", axis(DIM, 1))
        .with_vector("The project deadline is Friday", axis(DIM, 2))
        .with_mock_responses(["3", "tea", "8", "lisbon", "6", "deadline"])
        .build()
        .await
        .unwrap();
    let memory = memory_store(&harness);

    memory.remember("u1", "Alice prefers tea over coffee").await.unwrap();
    memory.remember("u1", "Bob moved to Lisbon").await.unwrap();
    let last = memory
        .remember("u1", "The project deadline is Friday")
        .await
        .unwrap();
    assert_eq!(last.pruned, 1);

    let nodes = memory.memories("u1").await.unwrap();
    assert_eq!(nodes.len(), 2);
    assert!(nodes.iter().all(|n| n.content != "Alice prefers tea over coffee"));
}

#[tokio::test]
async fn near_duplicate_is_reinforced_not_created() {
    let harness = TestHarness::builder()
        .with_dimensions(DIM)
        .with_vector("A", axis(DIM, 0))
        .with_vector("A'", blend(DIM, 0, 1, 0.9))
        .with_mock_responses(["5", "summary"])
        .build()
        .await
        .unwrap();
    let memory = memory_store(&harness);

    let created = memory.remember("u1", "A").await.unwrap();
    assert_eq!(created.status, RememberStatus::Created);
    let outcome = memory.remember("u1", "A'").await.unwrap();
    assert_eq!(outcome.status, RememberStatus::Reinforced);
    assert_eq!(outcome.node_id, created.node_id);

    let nodes = memory.memories("u1").await.unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].access_count, 1);
    assert!(nodes[0].importance > created.importance);
}

#[tokio::test]
async fn related_content_is_merged_into_existing_node() {
    let harness = TestHarness::builder()
        .with_dimensions(DIM)
        .with_vector("A", axis(DIM, 0))
        .with_vector("A again", blend(DIM, 0, 2, 0.95))
        .with_vector("B", blend(DIM, 0, 1, 0.78))
        .with_mock_responses(["4", "sumA", "7", "sumB", "combined", "combined summary"])
        .build()
        .await
        .unwrap();
    let memory = memory_store(&harness);

    let a = memory.remember("u1", "A").await.unwrap();
    // Give A an access so the merged count is a real sum.
    memory.remember("u1", "A again").await.unwrap();
    let outcome = memory.remember("u1", "B").await.unwrap();

    assert_eq!(outcome.status, RememberStatus::Merged);
    assert_eq!(outcome.node_id, a.node_id);
    // max(0.7, 0.4 * 1.1) * 1.1
    assert!((outcome.importance - 0.77).abs() < 1e-9);

    let nodes = memory.memories("u1").await.unwrap();
    assert_eq!(nodes.len(), 1);
    let merged = &nodes[0];
    assert_eq!(merged.id, a.node_id);
    assert_eq!(merged.content, "combined");
    assert_eq!(merged.summary, "combined summary");
    assert_eq!(merged.access_count, 1);
    assert!((merged.importance - 0.77).abs() < 1e-9);

    let expected = recall_core::vector::average(&axis(DIM, 0), &blend(DIM, 0, 1, 0.78)).unwrap();
    for (got, want) in merged.embedding.iter().zip(&expected) {
        assert!((got - want).abs() < 1e-6);
    }

    let prompts = harness.generator.prompts().await;
    assert!(prompts[4].contains("First text:\nB"));
    assert!(prompts[4].contains("Second text:\nA"));
}

#[tokio::test]
async fn similarity_bands_pick_the_right_action() {
    let cases = [
        (0.86, RememberStatus::Reinforced),
        (0.84, RememberStatus::Merged),
        (0.71, RememberStatus::Merged),
        (0.69, RememberStatus::Created),
        (0.10, RememberStatus::Created),
    ];
    for (cosine, expected) in cases {
        let harness = TestHarness::builder()
            .with_dimensions(DIM)
            .with_vector("base", axis(DIM, 0))
            .with_vector("incoming", blend(DIM, 0, 1, cosine))
            .with_mock_responses(["5", "s", "5", "s", "merged text", "merged summary"])
            .build()
            .await
            .unwrap();
        let memory = memory_store(&harness);
        memory.remember("u1", "base").await.unwrap();
        let outcome = memory.remember("u1", "incoming").await.unwrap();
        assert_eq!(outcome.status, expected, "cosine {cosine}");
    }
}

/// The similarity the engine computes between `axis(0)` and a blend at
/// `cosine`, after f32 rounding of both vectors.
fn engine_similarity(cosine: f32) -> f64 {
    f64::from(cosine_similarity(&axis(DIM, 0), &blend(DIM, 0, 1, cosine)))
}

#[tokio::test]
async fn similarity_exactly_at_merge_threshold_creates() {
    let at_edge = engine_similarity(0.70);
    let harness = TestHarness::builder()
        .with_dimensions(DIM)
        .with_config(|c| c.memory.merge_threshold = at_edge)
        .with_vector("base", axis(DIM, 0))
        .with_vector("incoming", blend(DIM, 0, 1, 0.70))
        .with_mock_responses(["5", "s", "5", "s"])
        .build()
        .await
        .unwrap();
    let memory = memory_store(&harness);
    memory.remember("u1", "base").await.unwrap();
    let outcome = memory.remember("u1", "incoming").await.unwrap();

    assert_eq!(outcome.status, RememberStatus::Created);
    assert_eq!(memory.memories("u1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn similarity_exactly_at_duplicate_threshold_neither_merges_nor_reinforces() {
    let at_edge = engine_similarity(0.85);
    let harness = TestHarness::builder()
        .with_dimensions(DIM)
        .with_config(|c| c.memory.duplicate_threshold = at_edge)
        .with_vector("base", axis(DIM, 0))
        .with_vector("incoming", blend(DIM, 0, 1, 0.85))
        .with_mock_responses(["5", "s", "5", "s"])
        .build()
        .await
        .unwrap();
    let memory = memory_store(&harness);
    memory.remember("u1", "base").await.unwrap();
    let outcome = memory.remember("u1", "incoming").await.unwrap();

    assert_eq!(outcome.status, RememberStatus::Created);
    let nodes = memory.memories("u1").await.unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].content, "base");
}

#[tokio::test]
async fn sweep_decays_at_exactly_the_similarity_threshold() {
    let at_edge = engine_similarity(0.70);
    let harness = TestHarness::builder()
        .with_dimensions(DIM)
        .with_config(|c| c.memory.similarity_threshold = at_edge)
        .with_vector("base", axis(DIM, 0))
        .with_mock_responses(["5", "s"])
        .build()
        .await
        .unwrap();
    let memory = memory_store(&harness);
    memory.remember("u1", "base").await.unwrap();

    let report = memory
        .update_importance("u1", &blend(DIM, 0, 1, 0.70))
        .await
        .unwrap();
    assert_eq!(report.decayed, 1);
    assert_eq!(report.reinforced, 0);

    let node = &memory.memories("u1").await.unwrap()[0];
    let decay = harness.config.memory.decay_factor;
    assert!((node.importance - 0.5 * decay).abs() < 1e-12);
    assert_eq!(node.access_count, 0);
}

#[tokio::test]
async fn node_count_never_exceeds_capacity() {
    let harness = TestHarness::builder()
        .with_config(|c| c.memory.max_depth = 3)
        .build()
        .await
        .unwrap();
    let memory = memory_store(&harness);
    for i in 0..10 {
        memory
            .remember("u1", &format!("unrelated fact number {i}"))
            .await
            .unwrap();
        assert!(memory.memories("u1").await.unwrap().len() <= 3);
    }
}

#[tokio::test]
async fn failed_merge_leaves_existing_node_untouched() {
    let harness = TestHarness::builder()
        .with_dimensions(DIM)
        .with_vector("A", axis(DIM, 0))
        .with_vector("B", blend(DIM, 0, 1, 0.78))
        .build()
        .await
        .unwrap();
    // Calls 0-1 store A, calls 2-3 rate and summarize B, call 4 (the merge) fails.
    let generator = Arc::new(
        MockGenerator::with_responses(["4", "sumA", "7", "sumB"]).failing_from_call(4),
    );
    let memory = MemoryStore::new(
        harness.store.clone(),
        harness.embedder.clone(),
        generator,
        &harness.config,
    );

    memory.remember("u1", "A").await.unwrap();
    let before = memory.memories("u1").await.unwrap();

    let err = memory.remember("u1", "B").await.unwrap_err();
    assert!(matches!(err, RecallError::Generation { .. }));
    assert_eq!(memory.memories("u1").await.unwrap(), before);
}

#[tokio::test]
async fn provider_timeout_aborts_without_writing() {
    let harness = TestHarness::builder().build().await.unwrap();
    let memory = MemoryStore::new(
        harness.store.clone(),
        Arc::new(MockEmbedder::default().with_delay(Duration::from_millis(500))),
        harness.generator.clone(),
        &harness.config,
    )
    .with_limits(CallLimits {
        provider_timeout: Duration::from_millis(20),
        ..CallLimits::default()
    });

    let err = memory.remember("u1", "something").await.unwrap_err();
    assert!(matches!(err, RecallError::Timeout { .. }));
    assert!(err.is_retryable());
    assert!(memory.memories("u1").await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_remembers_for_one_owner_are_serialized() {
    let harness = TestHarness::builder().build().await.unwrap();
    let memory = Arc::new(memory_store(&harness));

    let first = tokio::spawn({
        let memory = memory.clone();
        async move { memory.remember("u1", "same text").await }
    });
    let second = tokio::spawn({
        let memory = memory.clone();
        async move { memory.remember("u1", "same text").await }
    });
    let mut statuses = vec![
        first.await.unwrap().unwrap().status,
        second.await.unwrap().unwrap().status,
    ];
    statuses.sort_by_key(|s| s.to_string());

    assert_eq!(
        statuses,
        vec![RememberStatus::Created, RememberStatus::Reinforced]
    );
    let nodes = memory.memories("u1").await.unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].access_count, 1);
}

#[tokio::test]
async fn owners_are_isolated() {
    let harness = TestHarness::builder()
        .with_config(|c| c.memory.max_depth = 1)
        .build()
        .await
        .unwrap();
    let memory = memory_store(&harness);
    memory.remember("u1", "first owner fact").await.unwrap();
    memory.remember("u2", "second owner fact").await.unwrap();
    memory.remember("u2", "another second owner fact").await.unwrap();

    assert_eq!(memory.memories("u1").await.unwrap().len(), 1);
    assert_eq!(memory.memories("u2").await.unwrap().len(), 1);
}
