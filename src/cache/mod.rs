//! Copy-on-write entity cache.
//!
//! # Mental model
//!
//! * One [`EntityCache`] per domain holds an immutable [`CacheState`] behind an
//!   `ArcSwap`.
//! * Every write builds a complete replacement state and publishes it with
//!   `rcu`; nothing is mutated in place.
//! * Readers call [`EntityCache::snapshot`] and keep a consistent view for as
//!   long as they hold the `Arc`, even while writes land.
//!
//! # Invariants
//!
//! * At most one entry per id; later writes for the same id win.
//! * `update_one` and `remove_one` on a missing id are no-ops. They never
//!   create entries.
//! * Storage order carries no meaning. Listings use [`CacheState::sorted`].

use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use serde::Serialize;

use crate::entity::{Entity, Patch};

/// Result of [`EntityCache::update_one`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
}

/// Lifecycle of a domain's cache as seen by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Nothing has been requested yet.
    Idle,
    /// At least one request is pending.
    Loading,
    /// The last settled request succeeded.
    Loaded,
    /// The last settled request failed; contents are the last known good data.
    Errored,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Errored => "errored",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable published contents of an [`EntityCache`].
#[derive(Debug)]
pub struct CacheState<E: Entity> {
    entities: IndexMap<E::Id, E>,
    loading: bool,
    error: Option<String>,
    /// Some request has completed successfully.
    settled: bool,
    /// Requests started through `begin_request` and not yet finished.
    pending: usize,
    /// Ticket of the newest load applied through `set_all_at`.
    generation: u64,
}

impl<E: Entity> Clone for CacheState<E> {
    fn clone(&self) -> Self {
        Self {
            entities: self.entities.clone(),
            loading: self.loading,
            error: self.error.clone(),
            settled: self.settled,
            pending: self.pending,
            generation: self.generation,
        }
    }
}

impl<E: Entity> Default for CacheState<E> {
    fn default() -> Self {
        Self {
            entities: IndexMap::new(),
            loading: false,
            error: None,
            settled: false,
            pending: 0,
            generation: 0,
        }
    }
}

impl<E: Entity> CacheState<E> {
    pub fn get(&self, id: &E::Id) -> Option<&E> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &E::Id) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &E> {
        self.entities.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &E::Id> {
        self.entities.keys()
    }

    /// All records in the domain's display order.
    pub fn sorted(&self) -> Vec<&E> {
        let mut records: Vec<&E> = self.entities.values().collect();
        records.sort_by(|a, b| E::display_order(a, b));
        records
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn status(&self) -> SyncStatus {
        if self.loading {
            SyncStatus::Loading
        } else if self.error.is_some() {
            SyncStatus::Errored
        } else if self.settled {
            SyncStatus::Loaded
        } else {
            SyncStatus::Idle
        }
    }

    fn index(records: Vec<E>) -> IndexMap<E::Id, E> {
        // Duplicate ids: `insert` overwrites, so the last occurrence wins.
        let mut entities = IndexMap::with_capacity(records.len());
        for record in records {
            entities.insert(record.id().clone(), record);
        }
        entities
    }
}

/// Materialized mirror of one domain's gateway query result.
#[derive(Debug)]
pub struct EntityCache<E: Entity> {
    state: ArcSwap<CacheState<E>>,
}

impl<E: Entity> Default for EntityCache<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> EntityCache<E> {
    pub fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(CacheState::default()),
        }
    }

    /// Pin the current contents.
    pub fn snapshot(&self) -> Arc<CacheState<E>> {
        self.state.load_full()
    }

    /// Replace the whole contents with `records`.
    pub fn set_all(&self, records: impl IntoIterator<Item = E>) {
        let entities = CacheState::index(records.into_iter().collect());
        self.publish(|next| next.entities = entities.clone());
    }

    /// Replace the whole contents unless a newer load has already been applied.
    ///
    /// Returns `false` when `generation` is older than the applied one and the
    /// records were discarded.
    pub fn set_all_at(&self, generation: u64, records: impl IntoIterator<Item = E>) -> bool {
        let entities = CacheState::index(records.into_iter().collect());
        let mut applied = false;
        self.state.rcu(|current| {
            let mut next = CacheState::clone(current);
            applied = generation >= current.generation;
            if applied {
                next.entities = entities.clone();
                next.generation = generation;
            }
            Arc::new(next)
        });
        applied
    }

    /// Insert or overwrite the entry at the record's id.
    pub fn add_one(&self, record: E) {
        let id = record.id().clone();
        self.publish(|next| {
            next.entities.insert(id.clone(), record.clone());
        });
    }

    /// Merge `patch` into the entry at `id`. Missing ids are left alone.
    pub fn update_one(&self, id: &E::Id, patch: &E::Patch) -> UpdateOutcome {
        if !self.state.load().contains(id) {
            return UpdateOutcome::NotFound;
        }
        let mut outcome = UpdateOutcome::NotFound;
        self.publish(|next| {
            outcome = match next.entities.get_mut(id) {
                Some(entity) => {
                    patch.apply_to(entity);
                    UpdateOutcome::Updated
                }
                None => UpdateOutcome::NotFound,
            };
        });
        outcome
    }

    /// Delete the entry at `id`. Returns whether an entry was removed.
    pub fn remove_one(&self, id: &E::Id) -> bool {
        if !self.state.load().contains(id) {
            return false;
        }
        let mut removed = false;
        self.publish(|next| {
            removed = next.entities.shift_remove(id).is_some();
        });
        removed
    }

    /// Set the loading flag. Starting a load clears the previous error.
    pub fn set_loading(&self, loading: bool) {
        self.publish(|next| {
            next.loading = loading;
            if loading {
                next.error = None;
            }
        });
    }

    /// Record or clear the last error. Entities are never touched.
    pub fn set_error(&self, error: Option<String>) {
        self.publish(|next| next.error = error.clone());
    }

    /// Mark a request as started; the cache is loading until all finish.
    ///
    /// The returned guard releases the request when dropped, so a caller
    /// cancelled mid-flight never leaves the cache loading.
    pub(crate) fn begin_request(&self) -> PendingRequest<'_, E> {
        self.publish(|next| {
            next.pending += 1;
            next.loading = true;
            next.error = None;
        });
        PendingRequest {
            cache: self,
            finished: false,
        }
    }

    fn finish_request(&self, error: Option<String>) {
        self.publish(|next| {
            next.pending = next.pending.saturating_sub(1);
            next.loading = next.pending > 0;
            match &error {
                Some(message) => next.error = Some(message.clone()),
                None => {
                    next.error = None;
                    next.settled = true;
                }
            }
        });
    }

    /// Release a request that never settled. Outcome flags are left as they were.
    fn abandon_request(&self) {
        self.publish(|next| {
            next.pending = next.pending.saturating_sub(1);
            next.loading = next.pending > 0;
        });
    }

    fn publish(&self, mut edit: impl FnMut(&mut CacheState<E>)) {
        self.state.rcu(|current| {
            let mut next = CacheState::clone(current);
            edit(&mut next);
            Arc::new(next)
        });
    }
}

/// A request counted by [`EntityCache::begin_request`].
#[must_use = "dropping the request releases it without an outcome"]
pub(crate) struct PendingRequest<'a, E: Entity> {
    cache: &'a EntityCache<E>,
    finished: bool,
}

impl<E: Entity> PendingRequest<'_, E> {
    /// Settle the request: `None` on success, the message on failure.
    pub(crate) fn finish(mut self, error: Option<String>) {
        self.finished = true;
        self.cache.finish_request(error);
    }
}

impl<E: Entity> Drop for PendingRequest<'_, E> {
    fn drop(&mut self) {
        if !self.finished {
            self.cache.abandon_request();
        }
    }
}
