use anyhow::{Context, Result};
use casegate_application::{GuardKind, RoleResolver, RouteGuard};
use casegate_core::auth::SessionStore;
use casegate_core::config::GateConfig;
use casegate_core::routing::Portal;
use casegate_infrastructure::{HostedAuthClient, HostedBackend, RestProfileStore};
use std::sync::Arc;

pub async fn run(config: &GateConfig, email: &str, password: &str) -> Result<()> {
    let backend = HostedBackend::new(&config.backend).context("Invalid backend settings")?;
    let auth = Arc::new(HostedAuthClient::new(backend.clone()));
    let profiles = Arc::new(RestProfileStore::new(backend, auth.clone()));
    let resolver = RoleResolver::new(auth.clone(), profiles);

    auth.sign_in_with_password(email, password)
        .await
        .with_context(|| format!("Sign-in failed for {}", email))?;
    resolver.initialize().await;

    let access = resolver.current();
    let decisions: Vec<_> = [Portal::Client, Portal::Internal]
        .into_iter()
        .map(|portal| {
            let guard = RouteGuard::new(portal, GuardKind::Protected, config.routes.clone());
            serde_json::json!({ "portal": portal, "decision": guard.decide(&access) })
        })
        .collect();

    let report = serde_json::json!({
        "subject": access.subject_id(),
        "is_internal": access.is_internal,
        "principal": access.principal,
        "profile_error": access.profile_error.as_ref().map(|e| e.to_string()),
        "guards": decisions,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Err(err) = auth.sign_out().await {
        tracing::warn!("[Access] Sign-out after inspection failed: {}", err);
    }
    Ok(())
}
