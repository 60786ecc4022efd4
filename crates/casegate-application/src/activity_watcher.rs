//! Idle-timeout enforcement for client sessions.
//!
//! An [`ActivityWatcher`] mounts against a resolved client session. While
//! mounted it listens to user interaction on the host document, checks the
//! idle time on a fixed tick, and on breach signs the subject out once and
//! sends them to the client login page. Internal sessions are never watched.

use crate::notification::NotificationBus;
use crate::role_resolver::{AccessState, RoleResolver};
use casegate_core::activity::{
    ActivityState, InteractionKind, InteractionSource, ListenerId, ListenerOptions, Visibility,
};
use casegate_core::auth::{SessionStore, SubjectId};
use casegate_core::config::{ActivitySettings, GateConfig};
use casegate_core::notification::Toast;
use casegate_core::routing::{Navigator, Portal, Redirect};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Reason attached to the redirect after an idle logout.
pub const IDLE_LOGOUT_REASON: &str = "You were signed out after a period of inactivity.";

/// How a watcher's task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchExit {
    /// The idle threshold was reached and the subject was signed out.
    IdleLogout,
    /// The watcher was torn down before any breach.
    Cancelled,
}

#[derive(Debug)]
enum Signal {
    Activity,
    Visible,
}

/// Listener ids registered on an interaction source for one watcher.
///
/// Released exactly once, by whichever of handle drop or forced logout
/// comes first.
struct ListenerRegistration {
    source: Arc<dyn InteractionSource>,
    ids: Mutex<Vec<ListenerId>>,
}

impl ListenerRegistration {
    fn new(source: Arc<dyn InteractionSource>) -> Self {
        Self {
            source,
            ids: Mutex::new(Vec::new()),
        }
    }

    fn push(&self, id: ListenerId) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(id);
    }

    fn release(&self) {
        let ids = std::mem::take(&mut *self.ids.lock().unwrap_or_else(PoisonError::into_inner));
        for id in ids {
            self.source.remove_listener(id);
        }
    }
}

/// Factory for per-session idle watchers.
#[derive(Clone)]
pub struct ActivityWatcher {
    sessions: Arc<dyn SessionStore>,
    source: Arc<dyn InteractionSource>,
    navigator: Arc<dyn Navigator>,
    settings: ActivitySettings,
    login_route: String,
    notifications: Option<NotificationBus>,
    resolver: Option<Arc<RoleResolver>>,
}

impl ActivityWatcher {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        source: Arc<dyn InteractionSource>,
        navigator: Arc<dyn Navigator>,
        config: &GateConfig,
    ) -> Self {
        Self {
            sessions,
            source,
            navigator,
            settings: config.activity.clone(),
            login_route: config.routes.login(Portal::Client).to_string(),
            notifications: None,
            resolver: None,
        }
    }

    /// Publishes a toast on `bus` when a session is ended for inactivity.
    pub fn with_notifications(mut self, bus: NotificationBus) -> Self {
        self.notifications = Some(bus);
        self
    }

    /// Brings `resolver` up to date after a forced logout, before the
    /// redirect is issued.
    pub fn with_resolver(mut self, resolver: Arc<RoleResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Mounts a watcher for `access`.
    ///
    /// Returns `None`, attaching no listener, unless `access` is a resolved
    /// client session. Must be called inside a tokio runtime.
    pub fn mount(&self, access: &AccessState) -> Option<WatcherHandle> {
        if !access.is_client_session() {
            tracing::debug!("[ActivityWatcher] Not mounting: no resolved client session");
            return None;
        }
        let subject = access.subject_id()?.clone();

        let (tx, rx) = mpsc::unbounded_channel();
        let registration = Arc::new(ListenerRegistration::new(self.source.clone()));

        for kind in InteractionKind::ALL {
            let tx = tx.clone();
            let id = self.source.add_listener(
                kind,
                ListenerOptions::PASSIVE,
                Arc::new(move |_| {
                    let _ = tx.send(Signal::Activity);
                }),
            );
            registration.push(id);
        }

        let visibility_id = self.source.add_visibility_listener(Arc::new(move |visibility| {
            if visibility == Visibility::Visible {
                let _ = tx.send(Signal::Visible);
            }
        }));
        registration.push(visibility_id);

        tracing::debug!(
            "[ActivityWatcher] Mounted for subject {} (idle timeout {:?})",
            subject,
            self.settings.idle_timeout()
        );

        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.clone().run(
            subject.clone(),
            rx,
            registration.clone(),
            cancel.clone(),
        ));

        Some(WatcherHandle {
            subject,
            registration,
            cancel,
            task: Some(task),
        })
    }

    async fn run(
        self,
        subject: SubjectId,
        mut signals: mpsc::UnboundedReceiver<Signal>,
        registration: Arc<ListenerRegistration>,
        cancel: CancellationToken,
    ) -> WatchExit {
        let mut activity = ActivityState::new(Instant::now(), self.settings.idle_timeout());
        let mut ticker = tokio::time::interval(self.settings.tick());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return WatchExit::Cancelled,
                _ = ticker.tick() => {
                    if activity.is_breached(Instant::now()) {
                        break;
                    }
                }
                signal = signals.recv() => match signal {
                    Some(Signal::Activity) => activity.record(Instant::now()),
                    Some(Signal::Visible) => {
                        // The tick may have been suspended while hidden.
                        let now = Instant::now();
                        if activity.is_breached(now) {
                            break;
                        }
                        // A document hidden again before this signal ran saw no user.
                        if self.source.visibility() == Visibility::Visible {
                            activity.record(now);
                        }
                    }
                    None => return WatchExit::Cancelled,
                },
            }
        }

        // The periodic check has stopped; no second logout can start.
        drop(ticker);
        registration.release();

        tracing::info!(
            "[ActivityWatcher] Subject {} idle for {:?} (limit {:?}), signing out",
            subject,
            activity.idle_for(Instant::now()),
            activity.threshold()
        );

        if let Err(err) = self.sessions.sign_out().await {
            tracing::error!(
                "[ActivityWatcher] Sign-out failed for subject {}, redirecting anyway: {}",
                subject,
                err
            );
        }

        if let Some(resolver) = &self.resolver {
            resolver.initialize().await;
        }

        if let Some(bus) = &self.notifications {
            bus.publish(Toast::destructive("Session expired").description(IDLE_LOGOUT_REASON));
        }

        self.navigator
            .redirect(Redirect::to(self.login_route.clone()).with_reason(IDLE_LOGOUT_REASON));

        WatchExit::IdleLogout
    }
}

/// A mounted watcher. Dropping it removes every listener and stops the tick.
///
/// A forced logout that has already started is allowed to finish.
pub struct WatcherHandle {
    subject: SubjectId,
    registration: Arc<ListenerRegistration>,
    cancel: CancellationToken,
    task: Option<JoinHandle<WatchExit>>,
}

impl WatcherHandle {
    pub fn subject(&self) -> &SubjectId {
        &self.subject
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Waits for the watcher to end on its own.
    pub async fn finished(mut self) -> Option<WatchExit> {
        let task = self.task.take()?;
        task.await.ok()
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.registration.release();
    }
}

/// Keeps exactly one watcher mounted per resolved client session.
pub struct WatcherLifecycle {
    watcher: ActivityWatcher,
}

impl WatcherLifecycle {
    pub fn new(watcher: ActivityWatcher) -> Self {
        Self { watcher }
    }

    /// Follows access-state changes, remounting on every subject or
    /// classification change, until the resolver goes away.
    pub fn spawn(self, mut access: watch::Receiver<AccessState>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut mounted: Option<WatcherHandle> = None;
            loop {
                let state = access.borrow_and_update().clone();
                let wanted = state
                    .is_client_session()
                    .then(|| state.subject_id().cloned())
                    .flatten();

                let keep = match (&mounted, &wanted) {
                    (Some(handle), Some(subject)) => {
                        handle.subject() == subject && !handle.is_finished()
                    }
                    _ => false,
                };

                if !keep {
                    if let Some(handle) = mounted.take() {
                        tracing::debug!(
                            "[WatcherLifecycle] Unmounting watcher for subject {}",
                            handle.subject()
                        );
                    }
                    if wanted.is_some() {
                        mounted = self.watcher.mount(&state);
                    }
                }

                if access.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}
