//! Session store trait.
//!
//! Defines the surface of the hosted identity provider that the gating layer consumes.

use super::model::{Session, SessionChange};
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// An abstract session store.
///
/// The store owns the session lifecycle: it creates sessions on sign-in,
/// refreshes them transparently and destroys them on sign-out or expiry.
///
/// # Implementation Notes
///
/// Implementations should emit a `SessionChange` on every sign-in, refresh
/// and sign-out through the channel returned by [`SessionStore::subscribe`].
/// `sign_out` must only return once the session is cleared, so that a
/// subsequent `current_session` observes `None`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Reads the current session.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: a subject is signed in
    /// - `Ok(None)`: nobody is signed in
    /// - `Err(_)`: the store could not be reached
    async fn current_session(&self) -> Result<Option<Session>>;

    /// Subscribes to session changes (sign-in, refresh, sign-out).
    fn subscribe(&self) -> broadcast::Receiver<SessionChange>;

    /// Signs in with email and password credentials.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// Signs the current subject out. Completes once the session is cleared.
    async fn sign_out(&self) -> Result<()>;
}
