//! Access use case.
//!
//! `AccessUseCase` wires the gating components for one running portal: it
//! starts the role resolver against the session store, keeps an activity
//! watcher mounted for client sessions, and hands out route guards that share
//! the resolver's state.

use crate::activity_watcher::{ActivityWatcher, WatcherLifecycle};
use crate::notification::NotificationBus;
use crate::role_resolver::{AccessState, RoleResolver};
use crate::route_guard::{GuardKind, RouteGuard};
use casegate_core::Result;
use casegate_core::activity::InteractionSource;
use casegate_core::auth::{Session, SessionStore};
use casegate_core::config::GateConfig;
use casegate_core::principal::ProfileStore;
use casegate_core::routing::{Navigator, Portal, Redirect};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Collaborators the use case is built from.
pub struct AccessDependencies {
    pub sessions: Arc<dyn SessionStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub interactions: Arc<dyn InteractionSource>,
    pub navigator: Arc<dyn Navigator>,
    pub notifications: NotificationBus,
}

/// Running access control for a portal process.
///
/// # Responsibilities
///
/// - Resolving the current subject into an [`AccessState`]
/// - Mounting and unmounting the idle watcher as sessions change
/// - Building route guards bound to the configured route table
///
/// Background tasks are aborted when the use case is dropped.
pub struct AccessUseCase {
    config: GateConfig,
    sessions: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    resolver: Arc<RoleResolver>,
    tasks: Vec<JoinHandle<()>>,
}

impl AccessUseCase {
    /// Starts resolution and idle watching. Must be called inside a tokio runtime.
    pub fn start(config: GateConfig, deps: AccessDependencies) -> Self {
        let resolver = Arc::new(RoleResolver::new(deps.sessions.clone(), deps.profiles));

        let watcher = ActivityWatcher::new(
            deps.sessions.clone(),
            deps.interactions,
            deps.navigator.clone(),
            &config,
        )
        .with_notifications(deps.notifications)
        .with_resolver(resolver.clone());
        let lifecycle = WatcherLifecycle::new(watcher).spawn(resolver.subscribe());
        let resolution = resolver.clone().spawn();

        tracing::info!("[AccessUseCase] Started access control");

        Self {
            config,
            sessions: deps.sessions,
            navigator: deps.navigator,
            resolver,
            tasks: vec![resolution, lifecycle],
        }
    }

    pub fn access(&self) -> AccessState {
        self.resolver.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<AccessState> {
        self.resolver.subscribe()
    }

    /// Waits until the resolver has finished loading and returns that state.
    pub async fn resolved(&self) -> AccessState {
        let mut access = self.resolver.subscribe();
        match access.wait_for(|state| !state.loading).await {
            Ok(state) => AccessState::clone(&state),
            // The resolver lives as long as `self`, so the channel cannot close here.
            Err(_) => self.resolver.current(),
        }
    }

    pub fn guard(&self, portal: Portal, kind: GuardKind) -> RouteGuard {
        RouteGuard::new(portal, kind, self.config.routes.clone())
    }

    /// Spawns a guard that follows every access change and drives the navigator.
    pub fn follow_guard(&mut self, portal: Portal, kind: GuardKind) {
        let task = self
            .guard(portal, kind)
            .follow(self.resolver.subscribe(), self.navigator.clone());
        self.tasks.push(task);
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.sessions.sign_in_with_password(email, password).await
    }

    /// Signs out and then returns the subject to `portal`'s login page.
    ///
    /// The resolver re-reads the store before the redirect, so the login
    /// page's guard already sees the subject as signed out. Navigation
    /// happens even when the store-side sign-out fails.
    pub async fn sign_out(&self, portal: Portal) -> Result<()> {
        let result = self.sessions.sign_out().await;
        if let Err(err) = &result {
            tracing::error!("[AccessUseCase] Sign-out failed: {}", err);
        }
        self.resolver.initialize().await;
        self.navigator
            .redirect(Redirect::to(self.config.routes.login(portal)));
        result
    }
}

impl Drop for AccessUseCase {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
