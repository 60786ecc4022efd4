//! Principal profile domain model.

use crate::auth::SubjectId;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Coarse role tag stored on the profile row.
///
/// Tags the gating layer does not recognise deserialize to `Unknown` and are
/// classified as external, the more restrictive portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Client,
    Staff,
    Admin,
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Returns true for staff-membership tags.
    pub fn is_internal(self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }
}

/// Fine-grained staff role inside a firm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InternalRole {
    Admin,
    Attorney,
    Paralegal,
    CaseManager,
    Intake,
}

/// Principal profile, keyed by subject id. Exactly one per subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalProfile {
    pub id: SubjectId,
    pub role: Role,
    #[serde(default)]
    internal_role: Option<InternalRole>,
    #[serde(default)]
    pub firm_id: Option<String>,
}

impl PrincipalProfile {
    pub fn new(id: impl Into<SubjectId>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            internal_role: None,
            firm_id: None,
        }
    }

    pub fn with_internal_role(mut self, internal_role: InternalRole) -> Self {
        self.internal_role = Some(internal_role);
        self
    }

    pub fn with_firm(mut self, firm_id: impl Into<String>) -> Self {
        self.firm_id = Some(firm_id.into());
        self
    }

    pub fn is_internal(&self) -> bool {
        self.role.is_internal()
    }

    /// The staff role, only when the principal is classified internal.
    pub fn internal_role(&self) -> Option<InternalRole> {
        if self.is_internal() {
            self.internal_role
        } else {
            None
        }
    }
}
