use casegate_application::{
    AccessDependencies, AccessState, AccessUseCase, GuardDecision, GuardKind, NotificationBus,
};
use casegate_core::CasegateError;
use casegate_core::config::GateConfig;
use casegate_core::principal::{PrincipalProfile, Role};
use casegate_core::routing::{Navigator, Portal, Redirect};
use casegate_infrastructure::{
    EventTargetRegistry, HistoryNavigator, InMemoryProfileStore, InMemorySessionStore,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Records, for every redirect, whether the resolver still reported the
/// subject as authenticated at that moment.
#[derive(Default)]
struct AuthSnapshotNavigator {
    access: Mutex<Option<watch::Receiver<AccessState>>>,
    snapshots: Mutex<Vec<(String, bool)>>,
}

impl AuthSnapshotNavigator {
    fn watch(&self, access: watch::Receiver<AccessState>) {
        *self.access.lock().unwrap() = Some(access);
    }

    fn snapshots(&self) -> Vec<(String, bool)> {
        self.snapshots.lock().unwrap().clone()
    }
}

impl Navigator for AuthSnapshotNavigator {
    fn redirect(&self, redirect: Redirect) {
        let authenticated = self
            .access
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|access| access.borrow().is_authenticated());
        self.snapshots
            .lock()
            .unwrap()
            .push((redirect.path, authenticated));
    }

    fn render_outlet(&self) {}
}

struct Fixture {
    sessions: Arc<InMemorySessionStore>,
    navigator: Arc<HistoryNavigator>,
    usecase: AccessUseCase,
}

async fn start(navigator: Arc<dyn Navigator>) -> (Arc<InMemorySessionStore>, AccessUseCase) {
    let sessions = Arc::new(InMemorySessionStore::new());
    sessions
        .add_account("client@example.com", "client-pw", "client-1")
        .await;
    sessions
        .add_account("attorney@example.com", "staff-pw", "staff-1")
        .await;

    let profiles = Arc::new(InMemoryProfileStore::new());
    profiles
        .insert(PrincipalProfile::new("client-1", Role::Client))
        .await;
    profiles
        .insert(PrincipalProfile::new("staff-1", Role::Staff))
        .await;

    let usecase = AccessUseCase::start(
        GateConfig::default(),
        AccessDependencies {
            sessions: sessions.clone(),
            profiles,
            interactions: Arc::new(EventTargetRegistry::new()),
            navigator,
            notifications: NotificationBus::new(),
        },
    );
    (sessions, usecase)
}

async fn fixture() -> Fixture {
    let navigator = Arc::new(HistoryNavigator::new());
    let (sessions, usecase) = start(navigator.clone()).await;
    Fixture {
        sessions,
        navigator,
        usecase,
    }
}

async fn snapshot_fixture() -> (Arc<AuthSnapshotNavigator>, AccessUseCase) {
    let navigator = Arc::new(AuthSnapshotNavigator::default());
    let (_, usecase) = start(navigator.clone()).await;
    navigator.watch(usecase.subscribe());
    (navigator, usecase)
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn test_guards_follow_sign_in_and_out() {
    let mut fx = fixture().await;
    assert!(!fx.usecase.resolved().await.is_authenticated());

    fx.usecase.follow_guard(Portal::Client, GuardKind::Protected);
    settle().await;
    assert_eq!(fx.navigator.last_redirect(), Some(Redirect::to("/login")));

    fx.usecase
        .sign_in("client@example.com", "client-pw")
        .await
        .unwrap();
    settle().await;
    assert!(fx.usecase.access().is_client_session());
    assert_eq!(fx.navigator.outlet_renders(), 1);

    fx.usecase.sign_out(Portal::Client).await.unwrap();
    settle().await;
    assert!(!fx.usecase.access().is_authenticated());
    assert_eq!(fx.navigator.last_redirect(), Some(Redirect::to("/login")));
}

#[tokio::test(start_paused = true)]
async fn test_staff_on_client_portal_is_sent_to_staff_login() {
    let fx = fixture().await;
    fx.usecase
        .sign_in("attorney@example.com", "staff-pw")
        .await
        .unwrap();
    settle().await;

    let access = fx.usecase.resolved().await;
    let decision = fx
        .usecase
        .guard(Portal::Client, GuardKind::Protected)
        .decide(&access);
    match decision {
        GuardDecision::Redirect(redirect) => {
            assert_eq!(redirect.path, "/internal/login");
            assert_eq!(redirect.reason(), Some(Portal::Client.wrong_portal_reason()));
        }
        other => panic!("expected redirect, got {:?}", other),
    }

    assert_eq!(
        fx.usecase
            .guard(Portal::Internal, GuardKind::Public)
            .decide(&access),
        GuardDecision::Redirect(Redirect::to("/internal/dashboard"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_bad_credentials_leave_subject_signed_out() {
    let fx = fixture().await;
    let err = fx
        .usecase
        .sign_in("client@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, CasegateError::Authentication(_)));
    settle().await;
    assert!(!fx.usecase.access().is_authenticated());
}

#[tokio::test(start_paused = true)]
async fn test_idle_client_is_logged_out_end_to_end() {
    let fx = fixture().await;
    fx.usecase
        .sign_in("client@example.com", "client-pw")
        .await
        .unwrap();
    settle().await;

    tokio::time::sleep(Duration::from_secs(121)).await;
    assert_eq!(fx.sessions.sign_out_calls(), 1);
    assert!(!fx.usecase.access().is_authenticated());
    assert_eq!(fx.navigator.last_redirect().unwrap().path, "/login");
}

#[tokio::test(start_paused = true)]
async fn test_sign_out_failure_still_redirects() {
    let fx = fixture().await;
    fx.usecase
        .sign_in("attorney@example.com", "staff-pw")
        .await
        .unwrap();
    fx.sessions.set_fail_sign_out(true);

    assert!(fx.usecase.sign_out(Portal::Internal).await.is_err());
    assert_eq!(
        fx.navigator.last_redirect(),
        Some(Redirect::to("/internal/login"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_sign_out_is_resolved_before_redirect() {
    let (navigator, usecase) = snapshot_fixture().await;
    usecase
        .sign_in("client@example.com", "client-pw")
        .await
        .unwrap();
    settle().await;
    assert!(usecase.access().is_client_session());

    usecase.sign_out(Portal::Client).await.unwrap();
    assert_eq!(navigator.snapshots(), vec![("/login".to_string(), false)]);

    // The login page renders instead of bouncing back to the dashboard.
    assert_eq!(
        usecase
            .guard(Portal::Client, GuardKind::Public)
            .decide(&usecase.access()),
        GuardDecision::Render
    );
}

#[tokio::test(start_paused = true)]
async fn test_idle_logout_is_resolved_before_redirect() {
    let (navigator, usecase) = snapshot_fixture().await;
    usecase
        .sign_in("client@example.com", "client-pw")
        .await
        .unwrap();
    settle().await;

    tokio::time::sleep(Duration::from_secs(122)).await;
    assert_eq!(navigator.snapshots(), vec![("/login".to_string(), false)]);
    assert_eq!(
        usecase
            .guard(Portal::Client, GuardKind::Public)
            .decide(&usecase.access()),
        GuardDecision::Render
    );
}
