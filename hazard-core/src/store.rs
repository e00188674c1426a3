use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::records::HazardRecord;

struct CategoryState<T> {
    cache: Vec<T>,
    seen: HashSet<String>,
}

/// One category's recency cache and notified-id set behind a single lock.
///
/// The cache holds at most `capacity` records, one per id, ordered most
/// recent first with unknown timestamps last. The seen set grows for the
/// process lifetime; there is no persisted state across restarts.
#[derive(Clone)]
pub struct CategoryStore<T> {
    inner: Arc<RwLock<CategoryState<T>>>,
    capacity: usize,
}

impl<T: HazardRecord> CategoryStore<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CategoryState {
                cache: Vec::new(),
                seen: HashSet::new(),
            })),
            // A zero capacity would make `recent`'s [1, capacity] clamp
            // unsatisfiable.
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Merge a fetched batch into the cache and return the resulting size.
    ///
    /// A batch record always replaces a cached record with the same id, even
    /// when the cached copy carries a newer timestamp: a re-fetched record is
    /// taken as an authoritative correction. Within one batch the last
    /// occurrence of a duplicated id wins. Cached records whose id is absent
    /// from the batch are carried over unchanged, then the whole collection
    /// is re-sorted and truncated to capacity.
    pub async fn merge(&self, new_batch: Vec<T>) -> usize {
        let mut state = self.inner.write().await;
        let mut ids: HashSet<String> =
            HashSet::with_capacity(new_batch.len() + state.cache.len());
        let mut merged: Vec<T> = Vec::with_capacity(new_batch.len() + state.cache.len());

        for record in new_batch.into_iter().rev() {
            if ids.insert(record.id().to_owned()) {
                merged.push(record);
            }
        }
        for record in state.cache.drain(..) {
            if ids.insert(record.id().to_owned()) {
                merged.push(record);
            }
        }

        // None sorts below every Some, so descending order puts unknown
        // timestamps at the tail.
        merged.sort_by(|a, b| b.occurred_at().cmp(&a.occurred_at()));
        merged.truncate(self.capacity);

        state.cache = merged;
        state.cache.len()
    }

    /// Return the subset of `batch` not yet notified, marking every returned
    /// id as seen in the same critical section.
    pub async fn seen_delta(&self, batch: &[T]) -> Vec<T> {
        let mut state = self.inner.write().await;
        let mut fresh = Vec::new();
        for record in batch {
            if state.seen.insert(record.id().to_owned()) {
                fresh.push(record.clone());
            }
        }
        fresh
    }

    /// Most-recent-first view of the cache. `limit` is clamped to
    /// `[1, capacity]`.
    pub async fn recent(&self, limit: usize) -> Vec<T> {
        let limit = limit.clamp(1, self.capacity);
        let state = self.inner.read().await;
        state.cache.iter().take(limit).cloned().collect()
    }

    /// Consistent copy of the full cache contents.
    pub async fn snapshot(&self) -> Vec<T> {
        self.inner.read().await.cache.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.cache.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.cache.is_empty()
    }
}
