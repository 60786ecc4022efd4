use serde::{Deserialize, Serialize};

/// State carried along with a redirect so the destination page can surface it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectState {
    pub reason: String,
}

/// A navigation instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<RedirectState>,
}

impl Redirect {
    pub fn to(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            state: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.state = Some(RedirectState {
            reason: reason.into(),
        });
        self
    }

    pub fn reason(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.reason.as_str())
    }
}

/// The router surface the gating layer drives.
pub trait Navigator: Send + Sync {
    /// Replaces the current location.
    fn redirect(&self, redirect: Redirect);

    /// Renders the nested route tree below the guard.
    fn render_outlet(&self);
}
