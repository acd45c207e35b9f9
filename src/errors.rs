//! Typed error hierarchy for mise.
//!
//! - `GatewayError`: failures reported by the remote data gateway
//! - `SyncError`: a gateway failure seen through a synchronization controller
//! - `AuthError`: sign-in, sign-up and sign-out failures
//! - `ValidationError`: a draft or credential rejected before any gateway call
//! - `HireError`: the two-step staff onboarding in `Stores::hire_employee`

use thiserror::Error;

use crate::entity::Domain;

/// Errors returned by a [`Gateway`](crate::gateway::Gateway) implementation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GatewayError {
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),

    #[error("{domain} record {id} not found")]
    NotFound { domain: Domain, id: String },

    #[error("Gateway rejected the request: {0}")]
    Rejected(String),

    #[error("Gateway rate limit reached")]
    RateLimited,
}

/// Controller operation that produced a [`SyncError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    Load,
    LoadFiltered,
    Create,
    Update,
    Delete,
    Subscribe,
}

impl SyncOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::LoadFiltered => "load_filtered",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Subscribe => "subscribe",
        }
    }
}

impl std::fmt::Display for SyncOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from a synchronization controller.
///
/// The same message is also recorded on the controller's cache so that
/// readers of the cache see it without holding on to the returned value.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SyncError {
    #[error("{op} {domain} failed: {source}")]
    Gateway {
        domain: Domain,
        op: SyncOp,
        #[source]
        source: GatewayError,
    },
}

impl SyncError {
    pub fn domain(&self) -> Domain {
        match self {
            Self::Gateway { domain, .. } => *domain,
        }
    }

    pub fn gateway_error(&self) -> &GatewayError {
        match self {
            Self::Gateway { source, .. } => source,
        }
    }
}

/// A required field was missing or malformed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Errors from the authentication surface.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Too many sign-up attempts, rate limited")]
    RateLimited,

    #[error("Account already exists for {email}")]
    AlreadyRegistered { email: String },

    #[error("Invalid credentials form: {0}")]
    Validation(#[from] ValidationError),

    #[error("Authentication service unavailable: {0}")]
    Unavailable(String),
}

/// Errors from onboarding a staff member (account first, then record).
#[derive(Debug, Error)]
pub enum HireError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Could not create the staff account: {0}")]
    Auth(#[from] AuthError),

    #[error("Account created but the employee record was not saved: {0}")]
    Record(#[from] SyncError),
}
