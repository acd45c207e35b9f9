//! Staff authentication.
//!
//! [`AuthController`] is the only caller of the [`AuthGateway`]. It validates
//! credentials before any request, holds the current [`Session`], and retries
//! sign-up on [`AuthError::RateLimited`] with exponential backoff. Every other
//! failure, and every sign-in failure, is returned immediately.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{AuthError, ValidationError};
use crate::validate::{Validate, require_email};

pub mod memory;

pub use memory::MemoryAuth;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Validate for Credentials {
    fn validate(&self) -> Result<(), ValidationError> {
        require_email("email", &self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::new(
                "password",
                format!("must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Credential-based auth surface of the hosted backend.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    /// May fail with [`AuthError::RateLimited`] when called in quick succession.
    async fn sign_up(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Session persisted by the backend client, if any.
    async fn session(&self) -> Result<Option<Session>, AuthError>;
}

/// Bounded exponential backoff for rate-limited sign-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Wait before retry number `retry` (0-based): `base * 2^retry`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay.saturating_mul(factor)
    }
}

pub struct AuthController {
    gateway: Arc<dyn AuthGateway>,
    retry: RetryPolicy,
    session: ArcSwapOption<Session>,
}

impl AuthController {
    pub fn new(gateway: Arc<dyn AuthGateway>) -> Self {
        Self::with_retry(gateway, RetryPolicy::default())
    }

    pub fn with_retry(gateway: Arc<dyn AuthGateway>, retry: RetryPolicy) -> Self {
        Self {
            gateway,
            retry,
            session: ArcSwapOption::empty(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn session(&self) -> Option<Arc<Session>> {
        self.session.load_full()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.load().is_some()
    }

    /// Pick up a session the backend client persisted earlier.
    pub async fn restore(&self) -> Result<Option<Arc<Session>>, AuthError> {
        let restored = self.gateway.session().await?.map(Arc::new);
        if let Some(session) = &restored {
            info!(user_id = %session.user_id, "session restored");
        }
        self.session.store(restored.clone());
        Ok(restored)
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Arc<Session>, AuthError> {
        credentials.validate()?;
        let session = Arc::new(self.gateway.sign_in(credentials).await.inspect_err(|e| {
            warn!(email = %credentials.email, error = %e, "sign-in failed");
        })?);
        info!(user_id = %session.user_id, "signed in");
        self.session.store(Some(Arc::clone(&session)));
        Ok(session)
    }

    /// Create an account and sign in as it, backing off while the backend
    /// reports rate limiting.
    ///
    /// Exhausting the attempts is reported as [`AuthError::Unavailable`].
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<Arc<Session>, AuthError> {
        let session = self.register(credentials).await?;
        self.session.store(Some(Arc::clone(&session)));
        Ok(session)
    }

    /// Create an account for someone else (staff onboarding) with the same
    /// backoff as [`sign_up`](Self::sign_up). The controller keeps the
    /// caller's session.
    pub async fn create_account(
        &self,
        credentials: &Credentials,
    ) -> Result<Arc<Session>, AuthError> {
        let caller = self.session.load_full();
        let created = self.register(credentials).await;
        self.session.store(caller);
        created
    }

    async fn register(&self, credentials: &Credentials) -> Result<Arc<Session>, AuthError> {
        credentials.validate()?;
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            debug!(email = %credentials.email, attempt, "signing up");
            match self.gateway.sign_up(credentials).await {
                Ok(session) => {
                    let session = Arc::new(session);
                    info!(user_id = %session.user_id, attempt, "account created");
                    return Ok(session);
                }
                Err(AuthError::RateLimited) if attempt < max_attempts => {
                    let delay = self.retry.delay_for(attempt - 1);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "sign-up rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(AuthError::RateLimited) => {
                    warn!(attempts = attempt, "sign-up still rate limited, giving up");
                    return Err(AuthError::Unavailable(format!(
                        "sign-up rate limited after {} attempts",
                        attempt
                    )));
                }
                Err(other) => {
                    warn!(error = %other, "sign-up failed");
                    return Err(other);
                }
            }
        }
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.gateway.sign_out().await?;
        self.session.store(None);
        info!("signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use tokio::time::Instant;

    /// Sign-up double that replays scripted failures and records call times.
    struct Scripted {
        failures: Mutex<VecDeque<AuthError>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl Scripted {
        fn new(failures: Vec<AuthError>) -> Arc<Self> {
            Arc::new(Self {
                failures: Mutex::new(failures.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn gaps(&self) -> Vec<Duration> {
            let calls = self.calls.lock();
            calls.windows(2).map(|w| w[1] - w[0]).collect()
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl AuthGateway for Scripted {
        async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
            self.sign_up(credentials).await
        }

        async fn sign_up(&self, credentials: &Credentials) -> Result<Session, AuthError> {
            self.calls.lock().push(Instant::now());
            if let Some(err) = self.failures.lock().pop_front() {
                return Err(err);
            }
            Ok(Session {
                user_id: Uuid::new_v4(),
                email: credentials.email.clone(),
                access_token: "token".into(),
                expires_at: Utc::now() + chrono::Duration::hours(1),
            })
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            Ok(())
        }

        async fn session(&self) -> Result<Option<Session>, AuthError> {
            Ok(None)
        }
    }

    fn creds() -> Credentials {
        Credentials::new("cook@lacasona.pe", "secret123")
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_signup_backs_off_one_then_two_seconds() {
        let gateway = Scripted::new(vec![AuthError::RateLimited, AuthError::RateLimited]);
        let auth = AuthController::new(gateway.clone());

        let session = auth.sign_up(&creds()).await.unwrap();

        assert_eq!(session.email, "cook@lacasona.pe");
        assert_eq!(gateway.call_count(), 3);
        assert_eq!(
            gateway.gaps(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
        assert!(auth.is_signed_in());
    }

    #[tokio::test(start_paused = true)]
    async fn other_signup_errors_fail_immediately() {
        let gateway = Scripted::new(vec![AuthError::AlreadyRegistered {
            email: "cook@lacasona.pe".into(),
        }]);
        let auth = AuthController::new(gateway.clone());

        let err = auth.sign_up(&creds()).await.unwrap_err();

        assert!(matches!(err, AuthError::AlreadyRegistered { .. }));
        assert_eq!(gateway.call_count(), 1);
        assert!(!auth.is_signed_in());
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_become_unavailable() {
        let gateway = Scripted::new(vec![AuthError::RateLimited; 4]);
        let auth = AuthController::new(gateway.clone());

        let err = auth.sign_up(&creds()).await.unwrap_err();

        assert!(matches!(err, AuthError::Unavailable(_)));
        assert_eq!(gateway.call_count(), 4);
        assert_eq!(
            gateway.gaps(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn sign_in_never_retries() {
        let gateway = Scripted::new(vec![AuthError::RateLimited]);
        let auth = AuthController::new(gateway.clone());

        let err = auth.sign_in(&creds()).await.unwrap_err();

        assert_eq!(err, AuthError::RateLimited);
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn create_account_keeps_caller_session() {
        let gateway = Scripted::new(vec![]);
        let auth = AuthController::new(gateway.clone());
        let manager = auth
            .sign_in(&Credentials::new("manager@lacasona.pe", "secret123"))
            .await
            .unwrap();

        let hired = auth.create_account(&creds()).await.unwrap();

        assert_eq!(hired.email, "cook@lacasona.pe");
        assert_ne!(hired.user_id, manager.user_id);
        assert_eq!(auth.session().unwrap().user_id, manager.user_id);
    }

    #[tokio::test(start_paused = true)]
    async fn create_account_backs_off_like_sign_up() {
        let gateway = Scripted::new(vec![AuthError::RateLimited]);
        let auth = AuthController::new(gateway.clone());

        auth.create_account(&creds()).await.unwrap();

        assert_eq!(gateway.gaps(), vec![Duration::from_secs(1)]);
        assert!(!auth.is_signed_in());
    }

    #[tokio::test]
    async fn invalid_credentials_never_reach_gateway() {
        let gateway = Scripted::new(vec![]);
        let auth = AuthController::new(gateway.clone());

        let err = auth
            .sign_up(&Credentials::new("cook@lacasona.pe", "123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(ref v) if v.field == "password"));

        let err = auth
            .sign_in(&Credentials::new("not-an-email", "secret123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(ref v) if v.field == "email"));
        assert_eq!(gateway.call_count(), 0);
    }

    #[test]
    fn retry_delays_double() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let rendered = format!("{:?}", creds());
        assert!(rendered.contains("cook@lacasona.pe"));
        assert!(!rendered.contains("secret123"));
    }
}
