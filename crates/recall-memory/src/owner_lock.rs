// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-owner mutual exclusion.
//!
//! Read-modify-write sequences on one owner's documents (remember, sweeps,
//! prunes, cache saves) run under that owner's lock. Different owners never
//! contend.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Minimum number of tracked owners before idle locks are dropped.
const IDLE_SWEEP_THRESHOLD: usize = 1024;

/// A lazily populated map of per-owner async mutexes.
///
/// Idle entries are swept once the map outgrows `sweep_at`. After each sweep
/// the mark is set to twice the surviving size, so a map full of busy owners
/// is scanned again only after it has doubled.
#[derive(Debug)]
pub struct OwnerLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
    sweep_at: AtomicUsize,
}

impl Default for OwnerLocks {
    fn default() -> Self {
        Self {
            locks: DashMap::new(),
            sweep_at: AtomicUsize::new(IDLE_SWEEP_THRESHOLD),
        }
    }
}

impl OwnerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `owner_id`'s documents.
    pub async fn acquire(&self, owner_id: &str) -> OwnedMutexGuard<()> {
        if self.locks.len() > self.sweep_at.load(Ordering::Relaxed) {
            self.release_idle();
        }
        let lock = self.locks.entry(owner_id.to_string()).or_default().clone();
        lock.lock_owned().await
    }

    /// Drop locks nobody holds or waits on.
    pub fn release_idle(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        let next = self.locks.len().saturating_mul(2).max(IDLE_SWEEP_THRESHOLD);
        self.sweep_at.store(next, Ordering::Relaxed);
    }

    /// Number of owners with a lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
