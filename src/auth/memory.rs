use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use super::{AuthGateway, Credentials, Session};
use crate::errors::AuthError;

const SESSION_TTL_HOURS: i64 = 8;

struct Account {
    user_id: Uuid,
    password: String,
}

/// In-process account store with one persisted session.
#[derive(Default)]
pub struct MemoryAuth {
    accounts: Mutex<HashMap<String, Account>>,
    current: Mutex<Option<Session>>,
    faults: Mutex<VecDeque<AuthError>>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: AuthError) {
        self.faults.lock().push_back(error);
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().len()
    }

    fn take_fault(&self) -> Result<(), AuthError> {
        match self.faults.lock().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn open_session(&self, user_id: Uuid, email: &str) -> Session {
        let session = Session {
            user_id,
            email: email.to_string(),
            access_token: Uuid::new_v4().simple().to_string(),
            expires_at: Utc::now() + Duration::hours(SESSION_TTL_HOURS),
        };
        *self.current.lock() = Some(session.clone());
        session
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl AuthGateway for MemoryAuth {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        self.take_fault()?;
        let email = normalize(&credentials.email);
        let user_id = {
            let accounts = self.accounts.lock();
            match accounts.get(&email) {
                Some(account) if account.password == credentials.password => account.user_id,
                _ => return Err(AuthError::InvalidCredentials),
            }
        };
        Ok(self.open_session(user_id, &email))
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        self.take_fault()?;
        let email = normalize(&credentials.email);
        let user_id = Uuid::new_v4();
        {
            let mut accounts = self.accounts.lock();
            if accounts.contains_key(&email) {
                return Err(AuthError::AlreadyRegistered { email });
            }
            accounts.insert(
                email.clone(),
                Account {
                    user_id,
                    password: credentials.password.clone(),
                },
            );
        }
        Ok(self.open_session(user_id, &email))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.take_fault()?;
        self.current.lock().take();
        Ok(())
    }

    async fn session(&self) -> Result<Option<Session>, AuthError> {
        self.take_fault()?;
        Ok(self
            .current
            .lock()
            .clone()
            .filter(|s| !s.is_expired(Utc::now())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthController;
    use std::sync::Arc;

    fn creds(password: &str) -> Credentials {
        Credentials::new("Waiter@LaCasona.pe", password)
    }

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let gateway = Arc::new(MemoryAuth::new());
        let auth = AuthController::new(gateway.clone());

        let created = auth.sign_up(&creds("secret123")).await.unwrap();
        auth.sign_out().await.unwrap();
        assert!(!auth.is_signed_in());

        let session = auth.sign_in(&creds("secret123")).await.unwrap();
        assert_eq!(session.user_id, created.user_id);
        assert_eq!(session.email, "waiter@lacasona.pe");
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let gateway = Arc::new(MemoryAuth::new());
        let auth = AuthController::new(gateway.clone());
        auth.sign_up(&creds("secret123")).await.unwrap();

        let err = auth.sign_in(&creds("secret999")).await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let gateway = Arc::new(MemoryAuth::new());
        let auth = AuthController::new(gateway.clone());
        auth.sign_up(&creds("secret123")).await.unwrap();

        let err = auth.sign_up(&creds("other-pass")).await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyRegistered { .. }));
        assert_eq!(gateway.account_count(), 1);
    }

    #[tokio::test]
    async fn restore_picks_up_persisted_session() {
        let gateway = Arc::new(MemoryAuth::new());
        AuthController::new(gateway.clone())
            .sign_up(&creds("secret123"))
            .await
            .unwrap();

        let fresh = AuthController::new(gateway.clone());
        assert!(!fresh.is_signed_in());
        let restored = fresh.restore().await.unwrap();
        assert!(restored.is_some());
        assert!(fresh.is_signed_in());
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_fault_is_retried() {
        let gateway = Arc::new(MemoryAuth::new());
        gateway.fail_next(AuthError::RateLimited);
        let auth = AuthController::new(gateway.clone());

        auth.sign_up(&creds("secret123")).await.unwrap();
        assert_eq!(gateway.account_count(), 1);
    }
}
