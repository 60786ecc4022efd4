use anyhow::{Context, Result};
use casegate_application::{AccessState, GuardKind, RouteGuard};
use casegate_core::auth::Session;
use casegate_core::config::GateConfig;
use casegate_core::principal::{PrincipalProfile, Role};
use casegate_core::routing::Portal;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GuardKindArg {
    Protected,
    Public,
}

impl From<GuardKindArg> for GuardKind {
    fn from(value: GuardKindArg) -> Self {
        match value {
            GuardKindArg::Protected => GuardKind::Protected,
            GuardKindArg::Public => GuardKind::Public,
        }
    }
}

/// Canned access states to evaluate a guard against.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PrincipalArg {
    Loading,
    Anonymous,
    Client,
    Internal,
}

impl PrincipalArg {
    fn access_state(self) -> AccessState {
        let signed_in = |role: Role| {
            AccessState::resolved(
                Session::new("cli-subject", "cli-token"),
                Ok(PrincipalProfile::new("cli-subject", role)),
            )
        };
        match self {
            PrincipalArg::Loading => AccessState::loading(),
            PrincipalArg::Anonymous => AccessState::anonymous(),
            PrincipalArg::Client => signed_in(Role::Client),
            PrincipalArg::Internal => signed_in(Role::Staff),
        }
    }
}

pub fn run(
    config: &GateConfig,
    portal: Portal,
    kind: GuardKindArg,
    principal: PrincipalArg,
) -> Result<()> {
    let guard = RouteGuard::new(portal, kind.into(), config.routes.clone());
    let access = principal.access_state();
    let report = serde_json::json!({
        "portal": portal,
        "kind": guard.kind(),
        "state": guard.classify(&access),
        "decision": guard.decide(&access),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to render guard decision")?
    );
    Ok(())
}
