//! Session store over the hosted auth API.

use super::backend::{HostedBackend, transport_error};
use async_trait::async_trait;
use casegate_core::auth::{Session, SessionChange, SessionStore, SubjectId};
use casegate_core::{CasegateError, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tokio::sync::{RwLock, broadcast};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Refresh this long before the provider's expiry.
const REFRESH_MARGIN_SECS: i64 = 30;

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: TokenUser,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            subject_id: SubjectId::new(self.user.id),
            expires_at: self.expires_in.map(|secs| now + Duration::seconds(secs)),
        }
    }
}

fn needs_refresh(session: &Session, now: DateTime<Utc>) -> bool {
    session
        .expires_at
        .is_some_and(|expires_at| expires_at - Duration::seconds(REFRESH_MARGIN_SECS) <= now)
}

/// Hosted identity provider client.
///
/// Keeps the current session in memory, refreshes it when it is about to
/// expire and broadcasts every change.
pub struct HostedAuthClient {
    backend: HostedBackend,
    current: RwLock<Option<Session>>,
    changes: broadcast::Sender<SessionChange>,
}

impl HostedAuthClient {
    pub fn new(backend: HostedBackend) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            backend,
            current: RwLock::new(None),
            changes,
        }
    }

    /// The current access token, for adapters that read on the subject's behalf.
    ///
    /// A token inside the refresh margin is refreshed first, so callers never
    /// send an expired one.
    pub async fn access_token(&self) -> Result<Option<String>> {
        Ok(self.fresh_session().await?.map(|s| s.access_token))
    }

    /// The current session, refreshed when it is about to expire. A failed
    /// refresh ends the session.
    async fn fresh_session(&self) -> Result<Option<Session>> {
        let current = self.current.read().await.clone();
        match current {
            Some(session) if needs_refresh(&session, Utc::now()) => {
                match self.refresh_session().await {
                    Ok(session) => Ok(Some(session)),
                    Err(err) => {
                        tracing::warn!("[HostedAuthClient] Session refresh failed: {}", err);
                        *self.current.write().await = None;
                        let _ = self.changes.send(SessionChange::SignedOut);
                        Err(err)
                    }
                }
            }
            other => Ok(other),
        }
    }

    /// Exchanges the refresh token for a new session.
    pub async fn refresh_session(&self) -> Result<Session> {
        let refresh_token = self
            .current
            .read()
            .await
            .as_ref()
            .and_then(|s| s.refresh_token.clone())
            .ok_or_else(|| CasegateError::session_unavailable("no refresh token"))?;

        let session = self
            .token_grant(
                "refresh_token",
                serde_json::json!({ "refresh_token": refresh_token }),
            )
            .await?;

        *self.current.write().await = Some(session.clone());
        let _ = self.changes.send(SessionChange::TokenRefreshed(session.clone()));
        tracing::debug!(
            "[HostedAuthClient] Refreshed session for subject {}",
            session.subject_id
        );
        Ok(session)
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> Result<Session> {
        let response = self
            .backend
            .request(Method::POST, "auth/v1/token", None)
            .query(&[("grant_type", grant_type)])
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(CasegateError::Authentication(body));
        }
        if !status.is_success() {
            return Err(CasegateError::session_unavailable(format!(
                "token endpoint returned {}",
                status
            )));
        }

        let token: TokenResponse = response.json().await.map_err(transport_error)?;
        Ok(token.into_session(Utc::now()))
    }
}

#[async_trait]
impl SessionStore for HostedAuthClient {
    async fn current_session(&self) -> Result<Option<Session>> {
        self.fresh_session().await
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let session = self
            .token_grant(
                "password",
                serde_json::json!({ "email": email, "password": password }),
            )
            .await?;

        *self.current.write().await = Some(session.clone());
        let _ = self.changes.send(SessionChange::SignedIn(session.clone()));
        tracing::info!(
            "[HostedAuthClient] Signed in subject {}",
            session.subject_id
        );
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        // The local session is cleared first so the UI never stays half signed in.
        let Some(session) = self.current.write().await.take() else {
            return Ok(());
        };
        let _ = self.changes.send(SessionChange::SignedOut);

        let response = self
            .backend
            .request(Method::POST, "auth/v1/logout", Some(&session.access_token))
            .send()
            .await
            .map_err(|e| CasegateError::SignOut(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CasegateError::SignOut(format!(
                "logout endpoint returned {}",
                response.status()
            )));
        }
        tracing::info!(
            "[HostedAuthClient] Signed out subject {}",
            session.subject_id
        );
        Ok(())
    }
}
