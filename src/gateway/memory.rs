//! In-process gateway.
//!
//! Behaves like the hosted backend as far as the controllers can tell:
//! it assigns ids and timestamps on create, evaluates filters server-side,
//! fans out a payload-less change notification after every write, and reports
//! missing ids as [`GatewayError::NotFound`]. Queued faults make the next
//! calls fail, which is how tests and demos simulate an unreachable backend.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tracing::trace;

use super::{ChangeCallback, Gateway, Subscription};
use crate::entity::{Criteria, Entity, Patch};
use crate::errors::GatewayError;

/// Builds a stored record from a create payload, the way the backend would.
pub trait Materialize: Entity {
    /// `seq` is a per-gateway counter for domains with numeric ids.
    fn materialize(draft: Self::Draft, seq: u64, now: DateTime<Utc>) -> Self;

    /// Position of this record in the id sequence, if ids are numeric.
    fn sequence(&self) -> Option<u64> {
        None
    }
}

type Listeners = Arc<Mutex<Vec<(u64, ChangeCallback)>>>;

pub struct MemoryGateway<E: Entity> {
    records: RwLock<IndexMap<E::Id, E>>,
    next_seq: AtomicU64,
    listeners: Listeners,
    next_listener: AtomicU64,
    faults: Mutex<VecDeque<GatewayError>>,
}

impl<E: Materialize> Default for MemoryGateway<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Materialize> MemoryGateway<E> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Seed the gateway. New ids continue after the highest seeded one.
    pub fn with_records(records: Vec<E>) -> Self {
        let next_seq = records
            .iter()
            .filter_map(E::sequence)
            .max()
            .map_or(1, |max| max + 1);
        let records = records.into_iter().map(|r| (r.id().clone(), r)).collect();
        Self {
            records: RwLock::new(records),
            next_seq: AtomicU64::new(next_seq),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener: AtomicU64::new(0),
            faults: Mutex::new(VecDeque::new()),
        }
    }

    /// Make the next call (of any kind) fail with `error`.
    pub fn fail_next(&self, error: GatewayError) {
        self.faults.lock().push_back(error);
    }

    /// Server-side contents, in insertion order.
    pub fn records(&self) -> Vec<E> {
        self.records.read().values().cloned().collect()
    }

    pub fn get(&self, id: &E::Id) -> Option<E> {
        self.records.read().get(id).cloned()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Write a record as another client would, then notify subscribers.
    pub fn upsert_external(&self, record: E) {
        self.records.write().insert(record.id().clone(), record);
        self.notify();
    }

    /// Remove a record as another client would, then notify subscribers.
    pub fn remove_external(&self, id: &E::Id) {
        self.records.write().shift_remove(id);
        self.notify();
    }

    pub fn notify(&self) {
        // Snapshot first: callbacks may subscribe or unsubscribe.
        let callbacks: Vec<ChangeCallback> =
            self.listeners.lock().iter().map(|(_, cb)| cb.clone()).collect();
        trace!(domain = %E::DOMAIN, listeners = callbacks.len(), "notifying subscribers");
        for callback in callbacks {
            callback();
        }
    }

    fn take_fault(&self) -> Result<(), GatewayError> {
        match self.faults.lock().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn not_found(id: &E::Id) -> GatewayError {
        GatewayError::NotFound {
            domain: E::DOMAIN,
            id: id.to_string(),
        }
    }
}

#[async_trait]
impl<E: Materialize> Gateway<E> for MemoryGateway<E> {
    async fn fetch(&self, filter: Option<&E::Filter>) -> Result<Vec<E>, GatewayError> {
        self.take_fault()?;
        let records = self.records.read();
        Ok(records
            .values()
            .filter(|r| filter.is_none_or(|f| f.matches(r)))
            .cloned()
            .collect())
    }

    async fn create(&self, draft: E::Draft) -> Result<E, GatewayError> {
        self.take_fault()?;
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let record = E::materialize(draft, seq, Utc::now());
        self.records
            .write()
            .insert(record.id().clone(), record.clone());
        self.notify();
        Ok(record)
    }

    async fn update(&self, id: &E::Id, patch: &E::Patch) -> Result<Option<E>, GatewayError> {
        self.take_fault()?;
        let updated = {
            let mut records = self.records.write();
            let record = records.get_mut(id).ok_or_else(|| Self::not_found(id))?;
            patch.apply_to(record);
            record.clone()
        };
        self.notify();
        Ok(Some(updated))
    }

    async fn delete(&self, id: &E::Id) -> Result<(), GatewayError> {
        self.take_fault()?;
        let removed = self.records.write().shift_remove(id);
        if removed.is_none() {
            return Err(Self::not_found(id));
        }
        self.notify();
        Ok(())
    }

    async fn subscribe(&self, on_change: ChangeCallback) -> Result<Subscription, GatewayError> {
        self.take_fault()?;
        let key = self.next_listener.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().push((key, on_change));
        let listeners = Arc::clone(&self.listeners);
        Ok(Subscription::new(move || {
            listeners.lock().retain(|(k, _)| *k != key);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Customer, CustomerDraft, CustomerFilter, CustomerPatch};
    use std::sync::atomic::AtomicUsize;

    fn draft(name: &str) -> CustomerDraft {
        CustomerDraft {
            name: name.to_string(),
            phone: "999".to_string(),
            email: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let gw = MemoryGateway::<Customer>::new();
        let a = gw.create(draft("Ana")).await.unwrap();
        let b = gw.create(draft("Bruno")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(gw.records().len(), 2);
    }

    #[tokio::test]
    async fn seeded_ids_continue_after_max() {
        let seeded = Customer::materialize(draft("Old"), 40, Utc::now());
        let gw = MemoryGateway::with_records(vec![seeded]);
        let created = gw.create(draft("New")).await.unwrap();
        assert_eq!(created.id, 41);
    }

    #[tokio::test]
    async fn fetch_applies_filter() {
        let gw = MemoryGateway::<Customer>::new();
        gw.create(draft("Ana")).await.unwrap();
        gw.create(draft("Bruno")).await.unwrap();
        let filter = CustomerFilter {
            search: Some("bru".into()),
        };
        let found = gw.fetch(Some(&filter)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Bruno");
        assert_eq!(gw.fetch(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_result_is_not_an_error() {
        let gw = MemoryGateway::<Customer>::new();
        assert!(gw.fetch(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let gw = MemoryGateway::<Customer>::new();
        let err = gw.update(&5, &CustomerPatch::default()).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound { .. }));
        let err = gw.delete(&5).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound { .. }));
    }

    #[tokio::test]
    async fn queued_fault_fails_one_call() {
        let gw = MemoryGateway::<Customer>::new();
        gw.fail_next(GatewayError::Unavailable("offline".into()));
        assert!(gw.fetch(None).await.is_err());
        assert!(gw.fetch(None).await.is_ok());
    }

    #[tokio::test]
    async fn writes_notify_until_unsubscribed() {
        let gw = MemoryGateway::<Customer>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let sub = gw
            .subscribe(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .await
            .unwrap();
        assert_eq!(gw.listener_count(), 1);

        let created = gw.create(draft("Ana")).await.unwrap();
        gw.delete(&created.id).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        sub.unsubscribe();
        assert_eq!(gw.listener_count(), 0);
        gw.create(draft("Bruno")).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
