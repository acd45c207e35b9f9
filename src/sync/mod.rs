//! Synchronization controller.
//!
//! ## Overview
//!
//! One [`SyncController`] per domain mediates between user intents and the
//! gateway, and is the only writer of its domain's [`EntityCache`]:
//!
//! ```text
//!  intent ──> SyncController ──> Gateway (async, fallible)
//!                  │                  │
//!                  │  <── result ─────┘
//!                  v
//!             EntityCache  ──> selectors / presentation (read-only)
//!
//!  Gateway change feed ──> Notify ──> reload task ──> load()/load_filtered()
//! ```
//!
//! ## Outcomes
//!
//! | Operation       | Success                         | Failure                               |
//! |-----------------|---------------------------------|---------------------------------------|
//! | `load`          | `set_all(result)`               | error recorded, contents kept         |
//! | `load_filtered` | `set_all(result)` (no merge)    | error recorded, contents kept         |
//! | `create`        | `add_one(created)`              | error recorded, cache unchanged       |
//! | `update`        | `update_one(id, patch)`         | error recorded, cache unchanged       |
//! | `delete`        | `remove_one` or soft-delete patch | error recorded, cache unchanged     |
//!
//! Mutations are applied only after the gateway confirms them. There is no
//! retry and no timeout: a stalled gateway leaves the domain `Loading`.
//!
//! ## Ordering
//!
//! Concurrent loads settle according to [`ResponseOrdering`]. The default,
//! `LastResolvedWins`, lets whichever response arrives last define the cache.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheState, EntityCache, PendingRequest, SyncStatus, UpdateOutcome};
use crate::entity::{Domain, Entity};
use crate::errors::{GatewayError, SyncError, SyncOp};
use crate::gateway::Gateway;

/// How overlapping loads of the same domain settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOrdering {
    /// Whichever response resolves last replaces the cache.
    #[default]
    LastResolvedWins,
    /// A response older than the newest applied load is discarded.
    LatestIssuedWins,
}

impl ResponseOrdering {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LastResolvedWins => "last_resolved_wins",
            Self::LatestIssuedWins => "latest_issued_wins",
        }
    }
}

impl std::fmt::Display for ResponseOrdering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseOrdering {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "last_resolved_wins" => Ok(Self::LastResolvedWins),
            "latest_issued_wins" => Ok(Self::LatestIssuedWins),
            _ => anyhow::bail!(
                "Invalid response ordering '{}'. Valid values: last_resolved_wins, latest_issued_wins",
                s
            ),
        }
    }
}

struct Inner<E: Entity> {
    gateway: Arc<dyn Gateway<E>>,
    cache: Arc<EntityCache<E>>,
    ordering: ResponseOrdering,
    tickets: AtomicU64,
    criteria: Mutex<Option<E::Filter>>,
    active: Mutex<Option<AbortHandle>>,
}

impl<E: Entity> Drop for Inner<E> {
    fn drop(&mut self) {
        if let Some(handle) = self.active.get_mut().take() {
            handle.abort();
        }
    }
}

/// Mediates between intents, the gateway and one domain's cache.
///
/// Cheap to clone; clones share the cache and the subscription slot.
pub struct SyncController<E: Entity> {
    inner: Arc<Inner<E>>,
}

impl<E: Entity> Clone for SyncController<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Entity> SyncController<E> {
    pub fn new(gateway: Arc<dyn Gateway<E>>) -> Self {
        Self::with_ordering(gateway, ResponseOrdering::default())
    }

    pub fn with_ordering(gateway: Arc<dyn Gateway<E>>, ordering: ResponseOrdering) -> Self {
        Self {
            inner: Arc::new(Inner {
                gateway,
                cache: Arc::new(EntityCache::new()),
                ordering,
                tickets: AtomicU64::new(0),
                criteria: Mutex::new(None),
                active: Mutex::new(None),
            }),
        }
    }

    pub fn domain(&self) -> Domain {
        E::DOMAIN
    }

    pub fn ordering(&self) -> ResponseOrdering {
        self.inner.ordering
    }

    /// Read-only access for selectors and presentation.
    pub fn cache(&self) -> &Arc<EntityCache<E>> {
        &self.inner.cache
    }

    pub fn snapshot(&self) -> Arc<CacheState<E>> {
        self.inner.cache.snapshot()
    }

    pub fn status(&self) -> SyncStatus {
        self.inner.cache.snapshot().status()
    }

    /// Criteria of the most recent `load_filtered`, cleared by `load`.
    pub fn last_criteria(&self) -> Option<E::Filter> {
        self.inner.criteria.lock().clone()
    }

    /// Replace the cache with every record of the domain.
    pub async fn load(&self) -> Result<usize, SyncError> {
        *self.inner.criteria.lock() = None;
        self.fetch_into_cache(None).await
    }

    /// Replace the cache with the records matching `criteria`.
    ///
    /// Filtered results are never merged with earlier loads.
    pub async fn load_filtered(&self, criteria: E::Filter) -> Result<usize, SyncError> {
        *self.inner.criteria.lock() = Some(criteria.clone());
        self.fetch_into_cache(Some(criteria)).await
    }

    pub async fn create(&self, draft: E::Draft) -> Result<E, SyncError> {
        let cache = &self.inner.cache;
        let request = cache.begin_request();
        debug!(domain = %E::DOMAIN, op = "create", "sending");
        match self.inner.gateway.create(draft).await {
            Ok(record) => {
                cache.add_one(record.clone());
                request.finish(None);
                info!(domain = %E::DOMAIN, id = %record.id(), "record created");
                Ok(record)
            }
            Err(source) => Err(self.fail(request, SyncOp::Create, source)),
        }
    }

    /// Apply `patch` remotely, then to the cached entry if it is present.
    pub async fn update(&self, id: &E::Id, patch: E::Patch) -> Result<UpdateOutcome, SyncError> {
        let cache = &self.inner.cache;
        let request = cache.begin_request();
        debug!(domain = %E::DOMAIN, op = "update", %id, "sending");
        match self.inner.gateway.update(id, &patch).await {
            Ok(_) => {
                let outcome = cache.update_one(id, &patch);
                request.finish(None);
                if outcome == UpdateOutcome::NotFound {
                    debug!(domain = %E::DOMAIN, %id, "updated record is not cached");
                }
                Ok(outcome)
            }
            Err(source) => Err(self.fail(request, SyncOp::Update, source)),
        }
    }

    /// Delete according to the domain's policy.
    ///
    /// Soft-deleted domains keep the record, flagged through
    /// [`Entity::soft_delete_patch`]; all others remove it.
    pub async fn delete(&self, id: &E::Id) -> Result<(), SyncError> {
        let cache = &self.inner.cache;
        let request = cache.begin_request();
        debug!(domain = %E::DOMAIN, op = "delete", %id, policy = ?E::delete_policy(), "sending");
        let result = match E::soft_delete_patch() {
            Some(patch) => self
                .inner
                .gateway
                .update(id, &patch)
                .await
                .map(|_| {
                    cache.update_one(id, &patch);
                }),
            None => self.inner.gateway.delete(id).await.map(|()| {
                cache.remove_one(id);
            }),
        };
        match result {
            Ok(()) => {
                request.finish(None);
                info!(domain = %E::DOMAIN, %id, "record deleted");
                Ok(())
            }
            Err(source) => Err(self.fail(request, SyncOp::Delete, source)),
        }
    }

    /// Reload the whole domain on every change notification.
    pub async fn subscribe(&self) -> Result<SyncSubscription, SyncError> {
        self.subscribe_scoped(None).await
    }

    /// Reload with `criteria` on every change notification.
    pub async fn subscribe_filtered(
        &self,
        criteria: E::Filter,
    ) -> Result<SyncSubscription, SyncError> {
        self.subscribe_scoped(Some(criteria)).await
    }

    /// Cancel the active subscription, if any.
    pub fn unsubscribe(&self) {
        if let Some(handle) = self.inner.active.lock().take() {
            handle.abort();
            debug!(domain = %E::DOMAIN, "unsubscribed");
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.inner
            .active
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    async fn subscribe_scoped(
        &self,
        scope: Option<E::Filter>,
    ) -> Result<SyncSubscription, SyncError> {
        let notify = Arc::new(Notify::new());
        let signal = Arc::clone(&notify);
        let registration = self
            .inner
            .gateway
            .subscribe(Arc::new(move || signal.notify_one()))
            .await
            .map_err(|source| {
                let err = SyncError::Gateway {
                    domain: E::DOMAIN,
                    op: SyncOp::Subscribe,
                    source,
                };
                warn!(domain = %E::DOMAIN, error = %err, "subscription failed");
                err
            })?;

        let filtered = scope.is_some();
        let weak: Weak<Inner<E>> = Arc::downgrade(&self.inner);
        let task = tokio::spawn(async move {
            // Released when this task ends or is aborted.
            let _registration = registration;
            loop {
                notify.notified().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let controller = SyncController { inner };
                debug!(domain = %E::DOMAIN, filtered = scope.is_some(), "change notification");
                // Failures are already recorded on the cache.
                let _ = controller.fetch_into_cache(scope.clone()).await;
            }
        });

        let handle = task.abort_handle();
        if let Some(previous) = self.inner.active.lock().replace(handle.clone()) {
            previous.abort();
            debug!(domain = %E::DOMAIN, "replaced previous subscription");
        }
        info!(domain = %E::DOMAIN, filtered, "subscribed to change feed");
        Ok(SyncSubscription {
            domain: E::DOMAIN,
            handle,
        })
    }

    async fn fetch_into_cache(&self, criteria: Option<E::Filter>) -> Result<usize, SyncError> {
        let op = if criteria.is_some() {
            SyncOp::LoadFiltered
        } else {
            SyncOp::Load
        };
        let ticket = self.inner.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        let cache = &self.inner.cache;
        let request = cache.begin_request();
        debug!(domain = %E::DOMAIN, %op, ticket, "fetching");

        match self.inner.gateway.fetch(criteria.as_ref()).await {
            Ok(records) => {
                let count = records.len();
                let applied = match self.inner.ordering {
                    ResponseOrdering::LastResolvedWins => {
                        cache.set_all(records);
                        true
                    }
                    ResponseOrdering::LatestIssuedWins => cache.set_all_at(ticket, records),
                };
                request.finish(None);
                if applied {
                    info!(domain = %E::DOMAIN, %op, count, "cache replaced");
                } else {
                    debug!(domain = %E::DOMAIN, %op, ticket, "discarded stale response");
                }
                Ok(count)
            }
            Err(source) => Err(self.fail(request, op, source)),
        }
    }

    fn fail(
        &self,
        request: PendingRequest<'_, E>,
        op: SyncOp,
        source: GatewayError,
    ) -> SyncError {
        let err = SyncError::Gateway {
            domain: E::DOMAIN,
            op,
            source,
        };
        warn!(domain = %E::DOMAIN, %op, error = %err, "gateway call failed");
        request.finish(Some(err.to_string()));
        err
    }
}

/// Handle for a controller's change-feed subscription.
///
/// Dropping it cancels the reload task and releases the gateway registration.
#[must_use = "dropping the handle cancels the subscription"]
#[derive(Debug)]
pub struct SyncSubscription {
    domain: Domain,
    handle: AbortHandle,
}

impl SyncSubscription {
    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop reloading and release the gateway registration.
    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for SyncSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
