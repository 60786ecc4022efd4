use casegate_application::activity_watcher::IDLE_LOGOUT_REASON;
use casegate_application::{
    AccessState, ActivityWatcher, NotificationBus, RoleResolver, ToastSurface, WatchExit,
    WatcherLifecycle,
};
use casegate_core::activity::{InteractionKind, Visibility};
use casegate_core::auth::{Session, SessionStore};
use casegate_core::config::{GateConfig, TOAST_DISPLAY_DURATION};
use casegate_core::notification::ToastVariant;
use casegate_core::principal::{PrincipalProfile, Role};
use casegate_infrastructure::{
    EventTargetRegistry, HistoryNavigator, InMemoryProfileStore, InMemorySessionStore,
};
use std::sync::Arc;
use std::time::Duration;

struct Fixture {
    sessions: Arc<InMemorySessionStore>,
    target: Arc<EventTargetRegistry>,
    navigator: Arc<HistoryNavigator>,
    watcher: ActivityWatcher,
}

fn fixture_with(config: GateConfig) -> Fixture {
    let sessions = Arc::new(InMemorySessionStore::new());
    let target = Arc::new(EventTargetRegistry::new());
    let navigator = Arc::new(HistoryNavigator::new());
    let watcher = ActivityWatcher::new(
        sessions.clone(),
        target.clone(),
        navigator.clone(),
        &config,
    );
    Fixture {
        sessions,
        target,
        navigator,
        watcher,
    }
}

fn fixture() -> Fixture {
    fixture_with(GateConfig::default())
}

fn signed_in(subject: &str, role: Role) -> AccessState {
    AccessState::resolved(
        Session::new(subject, "token"),
        Ok(PrincipalProfile::new(subject, role)),
    )
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn test_internal_session_attaches_no_listeners() {
    let fx = fixture();
    assert!(fx.watcher.mount(&signed_in("staff-1", Role::Staff)).is_none());
    assert!(fx.watcher.mount(&signed_in("admin-1", Role::Admin)).is_none());
    assert!(fx.watcher.mount(&AccessState::anonymous()).is_none());
    assert!(fx.watcher.mount(&AccessState::loading()).is_none());
    assert_eq!(fx.target.listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_client_session_attaches_passive_listeners() {
    let fx = fixture();
    let handle = fx.watcher.mount(&signed_in("client-1", Role::Client)).unwrap();

    assert_eq!(fx.target.interaction_listener_count(), 5);
    assert_eq!(fx.target.visibility_listener_count(), 1);
    assert!(fx.target.all_passive());
    for kind in InteractionKind::ALL {
        assert!(fx.target.listens_to(kind), "missing listener for {}", kind);
    }

    drop(handle);
    assert_eq!(fx.target.listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_idle_client_is_signed_out_once() {
    let fx = fixture();
    fx.sessions.sign_in_as("client-1").await;
    let handle = fx.watcher.mount(&signed_in("client-1", Role::Client)).unwrap();

    tokio::time::sleep(Duration::from_secs(119)).await;
    assert_eq!(fx.sessions.sign_out_calls(), 0);
    assert!(fx.navigator.redirects().is_empty());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(fx.sessions.sign_out_calls(), 1);
    assert_eq!(fx.sessions.current_session().await.unwrap(), None);

    let redirects = fx.navigator.redirects();
    assert_eq!(redirects.len(), 1);
    assert_eq!(redirects[0].path, "/login");
    assert_eq!(redirects[0].reason(), Some(IDLE_LOGOUT_REASON));

    // Listeners are gone and nothing fires again.
    assert_eq!(fx.target.listener_count(), 0);
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(fx.sessions.sign_out_calls(), 1);
    assert_eq!(fx.navigator.redirects().len(), 1);

    assert_eq!(handle.finished().await, Some(WatchExit::IdleLogout));
}

#[tokio::test(start_paused = true)]
async fn test_activity_resets_countdown() {
    let fx = fixture();
    let _handle = fx.watcher.mount(&signed_in("client-1", Role::Client)).unwrap();

    tokio::time::sleep(Duration::from_secs(100)).await;
    assert_eq!(fx.target.dispatch(InteractionKind::PointerMove), 1);

    tokio::time::sleep(Duration::from_secs(100)).await;
    assert_eq!(fx.sessions.sign_out_calls(), 0);

    tokio::time::sleep(Duration::from_secs(21)).await;
    assert_eq!(fx.sessions.sign_out_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_many_resets_behave_like_the_latest() {
    let fx = fixture();
    let _handle = fx.watcher.mount(&signed_in("client-1", Role::Client)).unwrap();

    for kind in InteractionKind::ALL {
        tokio::time::sleep(Duration::from_secs(10)).await;
        fx.target.dispatch(kind);
    }
    // Last reset at t=50; breach expected at t=170.
    tokio::time::sleep(Duration::from_secs(119)).await;
    assert_eq!(fx.sessions.sign_out_calls(), 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(fx.sessions.sign_out_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_becoming_visible_rechecks_immediately() {
    // A tick far longer than the threshold stands in for a suspended timer.
    let mut config = GateConfig::default();
    config.activity.tick_millis = 3_600_000;
    let fx = fixture_with(config);
    let _handle = fx.watcher.mount(&signed_in("client-1", Role::Client)).unwrap();
    settle().await;

    fx.target.set_visibility(Visibility::Hidden);
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(fx.sessions.sign_out_calls(), 0);

    fx.target.set_visibility(Visibility::Visible);
    settle().await;
    assert_eq!(fx.sessions.sign_out_calls(), 1);
    assert_eq!(fx.navigator.redirects().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_visible_before_threshold_keeps_session() {
    let fx = fixture();
    let _handle = fx.watcher.mount(&signed_in("client-1", Role::Client)).unwrap();

    fx.target.set_visibility(Visibility::Hidden);
    tokio::time::sleep(Duration::from_secs(60)).await;
    fx.target.set_visibility(Visibility::Visible);

    tokio::time::sleep(Duration::from_secs(100)).await;
    assert_eq!(fx.sessions.sign_out_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_visible_signal_for_hidden_document_is_not_activity() {
    let fx = fixture();
    let _handle = fx.watcher.mount(&signed_in("client-1", Role::Client)).unwrap();

    tokio::time::sleep(Duration::from_secs(60)).await;
    // Shown and hidden again before the watcher runs.
    fx.target.set_visibility(Visibility::Hidden);
    fx.target.set_visibility(Visibility::Visible);
    fx.target.set_visibility(Visibility::Hidden);

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(fx.sessions.sign_out_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_sign_out_still_navigates() {
    let fx = fixture();
    fx.sessions.sign_in_as("client-1").await;
    fx.sessions.set_fail_sign_out(true);
    let handle = fx.watcher.mount(&signed_in("client-1", Role::Client)).unwrap();

    tokio::time::sleep(Duration::from_secs(121)).await;
    assert_eq!(fx.sessions.sign_out_calls(), 1);
    assert_eq!(fx.navigator.last_redirect().unwrap().path, "/login");
    assert_eq!(handle.finished().await, Some(WatchExit::IdleLogout));
}

#[tokio::test(start_paused = true)]
async fn test_dropped_watcher_never_signs_out() {
    let fx = fixture();
    let handle = fx.watcher.mount(&signed_in("client-1", Role::Client)).unwrap();
    tokio::time::sleep(Duration::from_secs(60)).await;
    drop(handle);

    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(fx.sessions.sign_out_calls(), 0);
    assert!(fx.navigator.redirects().is_empty());
    assert_eq!(fx.target.listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_idle_logout_publishes_toast() {
    let bus = NotificationBus::new();
    let surface = ToastSurface::mount(&bus, TOAST_DISPLAY_DURATION).unwrap();
    let mut fx = fixture();
    fx.watcher = fx.watcher.clone().with_notifications(bus.clone());
    let _handle = fx.watcher.mount(&signed_in("client-1", Role::Client)).unwrap();

    tokio::time::sleep(Duration::from_secs(121)).await;
    let toasts = surface.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].title, "Session expired");
    assert_eq!(toasts[0].variant, ToastVariant::Destructive);
}

#[tokio::test(start_paused = true)]
async fn test_lifecycle_follows_session_changes() {
    let sessions = Arc::new(InMemorySessionStore::new());
    let profiles = Arc::new(InMemoryProfileStore::new());
    profiles.insert(PrincipalProfile::new("client-1", Role::Client)).await;
    profiles.insert(PrincipalProfile::new("staff-1", Role::Staff)).await;
    let target = Arc::new(EventTargetRegistry::new());
    let navigator = Arc::new(HistoryNavigator::new());

    let resolver = Arc::new(RoleResolver::new(sessions.clone(), profiles));
    let watcher = ActivityWatcher::new(
        sessions.clone(),
        target.clone(),
        navigator.clone(),
        &GateConfig::default(),
    );
    let _lifecycle = WatcherLifecycle::new(watcher).spawn(resolver.subscribe());
    let _resolution = resolver.clone().spawn();
    settle().await;
    assert_eq!(target.listener_count(), 0);

    sessions.sign_in_as("client-1").await;
    settle().await;
    assert_eq!(target.listener_count(), 6);

    sessions.sign_out().await.unwrap();
    settle().await;
    assert_eq!(target.listener_count(), 0);

    sessions.sign_in_as("staff-1").await;
    settle().await;
    assert_eq!(target.listener_count(), 0);

    // Staff are never timed out.
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(sessions.sign_out_calls(), 1);
    assert!(sessions.current_session().await.unwrap().is_some());

    // Back to a client, who is timed out and unmounted afterwards.
    sessions.sign_in_as("client-1").await;
    settle().await;
    assert_eq!(target.listener_count(), 6);
    tokio::time::sleep(Duration::from_secs(121)).await;
    assert_eq!(sessions.sign_out_calls(), 2);
    assert_eq!(target.listener_count(), 0);
    assert_eq!(navigator.redirects().len(), 1);
}
