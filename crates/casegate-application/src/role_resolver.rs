//! Role resolution.
//!
//! `RoleResolver` turns the session store's state into an [`AccessState`]:
//! who is signed in and whether they are an internal (staff) principal. The
//! latest state is published on a `watch` channel that route guards and the
//! activity watcher follow.

use casegate_core::CasegateError;
use casegate_core::auth::{Session, SessionChange, SessionStore, SubjectId};
use casegate_core::principal::{PrincipalProfile, ProfileStore};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// The resolver's view of the current subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessState {
    /// True until the session store has reported and the profile is fetched.
    pub loading: bool,
    pub session: Option<Session>,
    pub principal: Option<PrincipalProfile>,
    pub is_internal: bool,
    /// Recoverable profile-fetch failure. Its presence implies `is_internal == false`.
    pub profile_error: Option<CasegateError>,
}

impl AccessState {
    /// Initial state before the session store has answered.
    pub fn loading() -> Self {
        Self {
            loading: true,
            session: None,
            principal: None,
            is_internal: false,
            profile_error: None,
        }
    }

    /// Resolved with nobody signed in.
    pub fn anonymous() -> Self {
        Self {
            loading: false,
            ..Self::loading()
        }
    }

    /// A session is known but its profile has not arrived yet.
    pub fn resolving(session: Session) -> Self {
        Self {
            session: Some(session),
            ..Self::loading()
        }
    }

    /// Resolved with a session. A failed profile fetch fails closed.
    pub fn resolved(session: Session, profile: casegate_core::Result<PrincipalProfile>) -> Self {
        match profile {
            Ok(principal) => Self {
                loading: false,
                is_internal: principal.is_internal(),
                session: Some(session),
                principal: Some(principal),
                profile_error: None,
            },
            Err(err) => Self {
                loading: false,
                session: Some(session),
                principal: None,
                is_internal: false,
                profile_error: Some(err),
            },
        }
    }

    pub fn subject_id(&self) -> Option<&SubjectId> {
        self.session.as_ref().map(|s| &s.subject_id)
    }

    pub fn is_authenticated(&self) -> bool {
        !self.loading && self.session.is_some()
    }

    /// A resolved external (client) session.
    pub fn is_client_session(&self) -> bool {
        self.is_authenticated() && !self.is_internal
    }
}

/// Resolves sessions into access states.
///
/// Profiles are never cached across session changes. Each resolution takes a
/// fresh generation number and a fetch that finishes after a newer resolution
/// has started is discarded.
pub struct RoleResolver {
    sessions: Arc<dyn SessionStore>,
    profiles: Arc<dyn ProfileStore>,
    generation: AtomicU64,
    state: watch::Sender<AccessState>,
}

impl RoleResolver {
    pub fn new(sessions: Arc<dyn SessionStore>, profiles: Arc<dyn ProfileStore>) -> Self {
        let (state, _) = watch::channel(AccessState::loading());
        Self {
            sessions,
            profiles,
            generation: AtomicU64::new(0),
            state,
        }
    }

    /// Subscribes to access-state updates.
    pub fn subscribe(&self) -> watch::Receiver<AccessState> {
        self.state.subscribe()
    }

    /// Snapshot of the latest access state.
    pub fn current(&self) -> AccessState {
        self.state.borrow().clone()
    }

    /// Reads the current session from the store and resolves it.
    ///
    /// An unreachable store is treated as "no session".
    pub async fn initialize(&self) {
        let session = match self.sessions.current_session().await {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(
                    "[RoleResolver] Session store unavailable, treating as signed out: {}",
                    err
                );
                None
            }
        };
        self.resolve(session).await;
    }

    /// Applies one notification from the session store.
    pub async fn handle_change(&self, change: SessionChange) {
        if let Some((generation, session)) = self.plan_change(change) {
            self.finish_resolution(generation, session).await;
        }
    }

    /// Runs the resolver against the store's change stream until the stream closes.
    ///
    /// Profile fetches run in their own tasks so a slow fetch never delays a
    /// later sign-out; the generation check drops whichever result is stale.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        // Subscribe before the initial read so no change slips between the two.
        let mut changes = self.sessions.subscribe();
        tokio::spawn(async move {
            self.initialize().await;
            loop {
                match changes.recv().await {
                    Ok(change) => {
                        if let Some((generation, session)) = self.plan_change(change) {
                            let resolver = self.clone();
                            tokio::spawn(async move {
                                resolver.finish_resolution(generation, session).await;
                            });
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "[RoleResolver] Missed {} session changes, re-reading session",
                            skipped
                        );
                        let resolver = self.clone();
                        tokio::spawn(async move {
                            resolver.initialize().await;
                        });
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::debug!("[RoleResolver] Session change stream closed");
                        break;
                    }
                }
            }
        })
    }

    /// Applies the synchronous part of a change. Returns the resolution that
    /// still needs a profile fetch, if any.
    fn plan_change(&self, change: SessionChange) -> Option<(u64, Session)> {
        tracing::debug!(
            "[RoleResolver] Session change for subject {:?}",
            change.session().map(|s| s.subject_id.as_str())
        );
        match change {
            SessionChange::SignedOut => self.begin_resolution(None),
            SessionChange::SignedIn(session) => self.begin_resolution(Some(session)),
            SessionChange::TokenRefreshed(session) => {
                let same_subject = {
                    let current = self.state.borrow();
                    !current.loading
                        && current
                            .session
                            .as_ref()
                            .is_some_and(|existing| existing.same_subject(&session))
                };

                if same_subject {
                    tracing::debug!(
                        "[RoleResolver] Token refreshed for subject {}",
                        session.subject_id
                    );
                    self.state.send_modify(|state| state.session = Some(session));
                    None
                } else {
                    self.begin_resolution(Some(session))
                }
            }
        }
    }

    async fn resolve(&self, session: Option<Session>) {
        if let Some((generation, session)) = self.begin_resolution(session) {
            self.finish_resolution(generation, session).await;
        }
    }

    /// Claims a new generation and publishes the immediate state.
    fn begin_resolution(&self, session: Option<Session>) -> Option<(u64, Session)> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        match session {
            None => {
                self.publish(generation, AccessState::anonymous());
                None
            }
            Some(session) => {
                self.publish(generation, AccessState::resolving(session.clone()));
                Some((generation, session))
            }
        }
    }

    async fn finish_resolution(&self, generation: u64, session: Session) {
        let profile = self.profiles.get_profile(&session.subject_id).await;
        if let Err(err) = &profile {
            tracing::warn!(
                "[RoleResolver] Profile fetch failed for subject {}, classifying as client: {}",
                session.subject_id,
                err
            );
        }

        let subject = session.subject_id.clone();
        if !self.publish(generation, AccessState::resolved(session, profile)) {
            tracing::debug!(
                "[RoleResolver] Discarded stale profile for subject {} (generation {})",
                subject,
                generation
            );
        }
    }

    /// Stores `state` if `generation` is still current. The check runs under
    /// the channel's lock so a newer resolution can never be overwritten.
    fn publish(&self, generation: u64, state: AccessState) -> bool {
        let mut published = false;
        self.state.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            published = true;
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
        published
    }
}
