//! Replica cache state machine
//!
//! Pure snapshot bookkeeping for one collection: dedup-then-replace, plus
//! the error policy that keeps last-known-good data through transient
//! failures. The async shell around it lives in [`crate::handle`]; this type
//! never does I/O, which is what makes the policy testable.

use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::SyncError;

/// Client-held mirror of one server-owned collection
///
/// Snapshots are compared structurally (by fingerprint of their serialized
/// form) so that an identical re-delivery does not count as a change and
/// does not trigger a re-render downstream.
#[derive(Debug)]
pub struct ReplicaCache<T> {
    items: Arc<Vec<T>>,
    last_applied_fingerprint: Option<u64>,
    has_completed_first_load: bool,
    generation: u64,
}

impl<T> Default for ReplicaCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReplicaCache<T> {
    /// Creates an empty cache that has never loaded
    pub fn new() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            last_applied_fingerprint: None,
            has_completed_first_load: false,
            generation: 0,
        }
    }

    /// The current snapshot
    pub fn items(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.items)
    }

    /// True once any snapshot has been applied
    pub fn has_completed_first_load(&self) -> bool {
        self.has_completed_first_load
    }

    /// Bumped only when a snapshot actually replaced the previous one
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<T: Serialize> ReplicaCache<T> {
    /// Applies a freshly fetched or pushed snapshot
    ///
    /// Returns true when the snapshot differed from the held one and
    /// replaced it. An identical snapshot leaves items and generation
    /// untouched but still counts as a completed load.
    pub fn apply_snapshot(&mut self, items: Vec<T>) -> Result<bool, SyncError> {
        let fingerprint = snapshot_fingerprint(&items)?;
        let changed = self.last_applied_fingerprint != Some(fingerprint);
        if changed {
            self.items = Arc::new(items);
            self.last_applied_fingerprint = Some(fingerprint);
            self.generation += 1;
        }
        self.has_completed_first_load = true;
        Ok(changed)
    }

    /// Records a failed pull
    ///
    /// Before the first successful load there is nothing better to show, so
    /// the cache is set to empty. After it, the previous snapshot is
    /// retained: a transient network error must never erase already
    /// displayed data. Returns true when the visible items changed.
    pub fn mark_pull_failure(&mut self) -> bool {
        if self.has_completed_first_load {
            return false;
        }
        let had_items = !self.items.is_empty();
        if had_items {
            self.items = Arc::new(Vec::new());
            self.generation += 1;
        }
        self.last_applied_fingerprint = None;
        had_items
    }

    /// Records a failed refetch after a local mutation
    ///
    /// Refetches never take the empty-on-first-load path; the last applied
    /// snapshot is always retained.
    pub fn mark_refetch_failure(&mut self) -> bool {
        false
    }
}

fn snapshot_fingerprint<T: Serialize>(items: &[T]) -> Result<u64, SyncError> {
    let bytes = serde_json::to_vec(items).map_err(|e| SyncError::Codec(e.to_string()))?;
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    Ok(hasher.finish())
}
