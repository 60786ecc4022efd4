//! In-memory session store.
//!
//! Stands in for the hosted identity provider in local runs and tests. It
//! keeps a set of password accounts and a single current session, and emits
//! the same change notifications the hosted provider does.

use async_trait::async_trait;
use casegate_core::auth::{Session, SessionChange, SessionStore, SubjectId};
use casegate_core::{CasegateError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{RwLock, broadcast};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
struct Account {
    password: String,
    subject_id: SubjectId,
}

/// Session store backed by process memory.
pub struct InMemorySessionStore {
    accounts: RwLock<HashMap<String, Account>>,
    current: RwLock<Option<Session>>,
    changes: broadcast::Sender<SessionChange>,
    token_counter: AtomicUsize,
    sign_out_calls: AtomicUsize,
    unavailable: AtomicBool,
    fail_sign_out: AtomicBool,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            accounts: RwLock::new(HashMap::new()),
            current: RwLock::new(None),
            changes,
            token_counter: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
            fail_sign_out: AtomicBool::new(false),
        }
    }

    /// Registers a password account.
    pub async fn add_account(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
        subject_id: impl Into<SubjectId>,
    ) {
        self.accounts.write().await.insert(
            email.into().to_lowercase(),
            Account {
                password: password.into(),
                subject_id: subject_id.into(),
            },
        );
    }

    /// Starts a session for `subject_id` without credentials.
    pub async fn sign_in_as(&self, subject_id: impl Into<SubjectId>) -> Session {
        let session = self.issue(subject_id.into());
        self.install(session.clone(), SessionChange::SignedIn(session.clone()))
            .await;
        session
    }

    /// Replaces the current session's token, as a transparent refresh would.
    pub async fn refresh(&self) -> Option<Session> {
        let subject = self.current.read().await.as_ref()?.subject_id.clone();
        let session = self.issue(subject);
        self.install(session.clone(), SessionChange::TokenRefreshed(session.clone()))
            .await;
        Some(session)
    }

    /// Makes `current_session` fail as if the provider were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes `sign_out` report an error (the local session is still cleared).
    pub fn set_fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    fn issue(&self, subject_id: SubjectId) -> Session {
        let n = self.token_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let mut session = Session::new(subject_id, format!("access-{}", n));
        session.refresh_token = Some(format!("refresh-{}", n));
        session
    }

    async fn install(&self, session: Session, change: SessionChange) {
        *self.current.write().await = Some(session);
        // No subscribers is fine.
        let _ = self.changes.send(change);
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn current_session(&self) -> Result<Option<Session>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CasegateError::session_unavailable("in-memory store offline"));
        }
        Ok(self.current.read().await.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let account = self
            .accounts
            .read()
            .await
            .get(&email.to_lowercase())
            .cloned();

        match account {
            Some(account) if account.password == password => {
                Ok(self.sign_in_as(account.subject_id).await)
            }
            _ => Err(CasegateError::Authentication(
                "Invalid login credentials".to_string(),
            )),
        }
    }

    async fn sign_out(&self) -> Result<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        let previous = self.current.write().await.take();
        if previous.is_some() {
            let _ = self.changes.send(SessionChange::SignedOut);
        }

        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(CasegateError::SignOut(
                "provider rejected the sign-out request".to_string(),
            ));
        }
        Ok(())
    }
}
