use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// The two portals served by the application.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Portal {
    /// External principals (clients of the firm).
    Client,
    /// Internal principals (firm staff).
    Internal,
}

impl Portal {
    /// The portal a principal belongs to.
    pub fn for_principal(is_internal: bool) -> Self {
        if is_internal {
            Portal::Internal
        } else {
            Portal::Client
        }
    }

    pub fn other(self) -> Self {
        match self {
            Portal::Client => Portal::Internal,
            Portal::Internal => Portal::Client,
        }
    }

    pub fn admits_internal(self) -> bool {
        matches!(self, Portal::Internal)
    }

    /// Reason shown on the other portal's login page when a principal lands on the wrong one.
    pub fn wrong_portal_reason(self) -> &'static str {
        match self {
            Portal::Client => {
                "This portal is for clients only. Please sign in to the staff portal."
            }
            Portal::Internal => {
                "This portal is for firm staff only. Please sign in to the client portal."
            }
        }
    }
}

/// Login and landing routes of both portals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteTable {
    pub client_login: String,
    pub client_landing: String,
    pub internal_login: String,
    pub internal_landing: String,
}

impl RouteTable {
    pub fn login(&self, portal: Portal) -> &str {
        match portal {
            Portal::Client => &self.client_login,
            Portal::Internal => &self.internal_login,
        }
    }

    pub fn landing(&self, portal: Portal) -> &str {
        match portal {
            Portal::Client => &self.client_landing,
            Portal::Internal => &self.internal_landing,
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            client_login: "/login".to_string(),
            client_landing: "/dashboard".to_string(),
            internal_login: "/internal/login".to_string(),
            internal_landing: "/internal/dashboard".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_portal_for_principal() {
        assert_eq!(Portal::for_principal(true), Portal::Internal);
        assert_eq!(Portal::for_principal(false), Portal::Client);
        assert_eq!(Portal::Client.other(), Portal::Internal);
    }

    #[test]
    fn test_portal_parses_from_cli_tag() {
        assert_eq!(Portal::from_str("internal").unwrap(), Portal::Internal);
        assert!(Portal::from_str("admin").is_err());
    }

    #[test]
    fn test_default_routes() {
        let routes = RouteTable::default();
        assert_eq!(routes.login(Portal::Client), "/login");
        assert_eq!(routes.landing(Portal::Internal), "/internal/dashboard");
    }
}
