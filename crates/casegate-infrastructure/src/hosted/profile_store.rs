//! Principal profiles over the hosted REST API.

use super::auth_client::HostedAuthClient;
use super::backend::{HostedBackend, read_status_error, transport_error};
use async_trait::async_trait;
use casegate_core::auth::SubjectId;
use casegate_core::principal::{PrincipalProfile, ProfileStore};
use casegate_core::{CasegateError, Result};
use reqwest::Method;
use std::sync::Arc;

const PROFILE_COLUMNS: &str = "id,role,internal_role,firm_id";

/// Reads `profiles` rows with the signed-in subject's token, so row-level
/// security applies.
pub struct RestProfileStore {
    backend: HostedBackend,
    auth: Arc<HostedAuthClient>,
}

impl RestProfileStore {
    pub fn new(backend: HostedBackend, auth: Arc<HostedAuthClient>) -> Self {
        Self { backend, auth }
    }
}

/// Picks the single row for `subject_id`.
fn single_profile(subject_id: &SubjectId, rows: Vec<PrincipalProfile>) -> Result<PrincipalProfile> {
    rows.into_iter()
        .find(|row| &row.id == subject_id)
        .ok_or_else(|| CasegateError::not_found("PrincipalProfile", subject_id.as_str()))
}

#[async_trait]
impl ProfileStore for RestProfileStore {
    async fn get_profile(&self, subject_id: &SubjectId) -> Result<PrincipalProfile> {
        let token = self.auth.access_token().await?;
        let response = self
            .backend
            .request(Method::GET, "rest/v1/profiles", token.as_deref())
            .query(&[
                ("id", format!("eq.{}", subject_id)),
                ("select", PROFILE_COLUMNS.to_string()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(read_status_error(status, &body));
        }

        let rows: Vec<PrincipalProfile> = response.json().await.map_err(transport_error)?;
        single_profile(subject_id, rows)
    }
}
