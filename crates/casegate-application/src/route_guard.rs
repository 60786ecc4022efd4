//! Route guards for the client and internal portals.
//!
//! A guard sits in front of a route tree and decides, from the latest
//! [`AccessState`], whether to wait, render the tree, or redirect.

use crate::role_resolver::AccessState;
use casegate_core::routing::{Navigator, Portal, Redirect, RouteTable};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Which kind of route tree the guard protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardKind {
    /// Authenticated pages of a portal.
    Protected,
    /// Login and sign-up pages of a portal.
    Public,
}

/// Where the access state places a subject relative to a guarded portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    Loading,
    Unauthenticated,
    WrongPortal,
    Authorized,
}

/// What the guard asks the router to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GuardDecision {
    /// Show a waiting indicator; no redirect yet.
    Wait,
    /// Render the guarded subtree.
    Render,
    Redirect(Redirect),
}

impl GuardDecision {
    /// Performs the decision against a router. `Wait` does nothing.
    pub fn apply(&self, navigator: &dyn Navigator) {
        match self {
            GuardDecision::Wait => {}
            GuardDecision::Render => navigator.render_outlet(),
            GuardDecision::Redirect(redirect) => navigator.redirect(redirect.clone()),
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, GuardDecision::Redirect(_))
    }
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    portal: Portal,
    kind: GuardKind,
    routes: RouteTable,
}

impl RouteGuard {
    pub fn new(portal: Portal, kind: GuardKind, routes: RouteTable) -> Self {
        Self {
            portal,
            kind,
            routes,
        }
    }

    pub fn protected(portal: Portal, routes: RouteTable) -> Self {
        Self::new(portal, GuardKind::Protected, routes)
    }

    pub fn public(portal: Portal, routes: RouteTable) -> Self {
        Self::new(portal, GuardKind::Public, routes)
    }

    pub fn portal(&self) -> Portal {
        self.portal
    }

    pub fn kind(&self) -> GuardKind {
        self.kind
    }

    pub fn classify(&self, access: &AccessState) -> GuardState {
        if access.loading {
            return GuardState::Loading;
        }
        if access.session.is_none() {
            return GuardState::Unauthenticated;
        }
        if access.is_internal == self.portal.admits_internal() {
            GuardState::Authorized
        } else {
            GuardState::WrongPortal
        }
    }

    pub fn decide(&self, access: &AccessState) -> GuardDecision {
        let state = self.classify(access);
        match (self.kind, state) {
            (_, GuardState::Loading) => GuardDecision::Wait,

            (GuardKind::Protected, GuardState::Unauthenticated) => {
                GuardDecision::Redirect(Redirect::to(self.routes.login(self.portal)))
            }
            (GuardKind::Protected, GuardState::WrongPortal) => GuardDecision::Redirect(
                Redirect::to(self.routes.login(self.portal.other()))
                    .with_reason(self.portal.wrong_portal_reason()),
            ),
            (GuardKind::Protected, GuardState::Authorized) => GuardDecision::Render,

            (GuardKind::Public, GuardState::Unauthenticated) => GuardDecision::Render,
            // A signed-in subject never sees a login form again; send them
            // to the landing page of the portal they belong to.
            (GuardKind::Public, GuardState::Authorized | GuardState::WrongPortal) => {
                let home = Portal::for_principal(access.is_internal);
                GuardDecision::Redirect(Redirect::to(self.routes.landing(home)))
            }
        }
    }

    /// Re-evaluates the guard on every access-state change and applies each
    /// new decision. Repeated identical decisions are applied once.
    pub fn follow(
        self,
        mut access: watch::Receiver<AccessState>,
        navigator: Arc<dyn Navigator>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut last: Option<GuardDecision> = None;
            loop {
                let decision = self.decide(&access.borrow_and_update());
                if last.as_ref() != Some(&decision) {
                    tracing::debug!(
                        "[RouteGuard] {} {:?} guard -> {:?}",
                        self.portal,
                        self.kind,
                        decision
                    );
                    decision.apply(navigator.as_ref());
                    last = Some(decision);
                }
                if access.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}
