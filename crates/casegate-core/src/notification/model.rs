use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier generated by a display surface for each toast it shows.
pub type NotificationId = Uuid;

/// Visual variant of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastVariant {
    #[default]
    Default,
    Success,
    Destructive,
}

/// A request to show a transient message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub variant: ToastVariant,
}

impl Toast {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            variant: ToastVariant::Default,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn variant(mut self, variant: ToastVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn destructive(title: impl Into<String>) -> Self {
        Self::new(title).variant(ToastVariant::Destructive)
    }
}

/// A toast as shown on a display surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub description: Option<String>,
    pub variant: ToastVariant,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn from_toast(toast: Toast) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: toast.title,
            description: toast.description,
            variant: toast.variant,
            created_at: Utc::now(),
        }
    }
}
