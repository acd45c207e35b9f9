//! Contract expected from the remote data gateway.
//!
//! The gateway is the hosted backend: it owns storage, assigns ids and
//! timestamps, and tells subscribers that *something* changed in a domain.
//! Notifications carry no payload; receivers always re-fetch.
//!
//! | Operation   | Success                         | Failure                     |
//! |-------------|---------------------------------|-----------------------------|
//! | `fetch`     | matching records (may be empty) | `Err`, never a silent empty |
//! | `create`    | full record with id/timestamps  | `Err`                       |
//! | `update`    | updated record if returned      | `Err` (incl. `NotFound`)    |
//! | `delete`    | `()`                            | `Err` (incl. `NotFound`)    |
//! | `subscribe` | [`Subscription`] handle         | `Err`                       |

use std::sync::Arc;

use async_trait::async_trait;

use crate::entity::Entity;
use crate::errors::GatewayError;

pub mod memory;

pub use memory::{Materialize, MemoryGateway};

/// Invoked by the gateway whenever any record of the domain changes.
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// Registration with a gateway's change feed.
///
/// Released exactly once: on [`Subscription::unsubscribe`] or on drop.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A registration with nothing to release.
    pub fn detached() -> Self {
        Self { release: None }
    }

    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Per-domain data operations offered by the backend.
///
/// Real implementation: a hosted backend client. In-process implementation:
/// [`MemoryGateway`]. Test doubles live next to the controller tests.
#[async_trait]
pub trait Gateway<E: Entity>: Send + Sync {
    /// All records, or those matching `filter`.
    async fn fetch(&self, filter: Option<&E::Filter>) -> Result<Vec<E>, GatewayError>;

    async fn create(&self, draft: E::Draft) -> Result<E, GatewayError>;

    /// Partial update: fields not set on `patch` are left unchanged.
    async fn update(&self, id: &E::Id, patch: &E::Patch) -> Result<Option<E>, GatewayError>;

    async fn delete(&self, id: &E::Id) -> Result<(), GatewayError>;

    async fn subscribe(&self, on_change: ChangeCallback) -> Result<Subscription, GatewayError>;
}
