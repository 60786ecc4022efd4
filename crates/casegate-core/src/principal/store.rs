//! Principal profile store trait.

use super::model::PrincipalProfile;
use crate::auth::SubjectId;
use crate::error::Result;
use async_trait::async_trait;

/// Read access to principal profiles.
///
/// The gating layer never writes profiles; they are provisioned by the
/// invite and sign-up flows on the hosted backend.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetches the profile of a subject.
    ///
    /// # Errors
    ///
    /// - `CasegateError::NotFound` when no profile row exists
    /// - `CasegateError::PermissionDenied` when row-level security refuses the read
    async fn get_profile(&self, subject_id: &SubjectId) -> Result<PrincipalProfile>;
}
