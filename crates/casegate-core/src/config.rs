//! Configuration model.
//!
//! Fixed thresholds are named here and every runtime component reads them
//! through [`GateConfig`], so tests can shrink or stretch them freely.

use crate::routing::RouteTable;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Idle time after which a client session is signed out.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Period of the idle check.
pub const ACTIVITY_TICK: Duration = Duration::from_secs(1);

/// How long a toast stays on a display surface.
pub const TOAST_DISPLAY_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivitySettings {
    pub idle_timeout_secs: u64,
    pub tick_millis: u64,
}

impl ActivitySettings {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn tick(&self) -> Duration {
        // A zero period would make tokio's interval panic.
        Duration::from_millis(self.tick_millis.max(1))
    }
}

impl Default for ActivitySettings {
    fn default() -> Self {
        Self {
            idle_timeout_secs: IDLE_TIMEOUT.as_secs(),
            tick_millis: ACTIVITY_TICK.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub display_secs: u64,
}

impl NotificationSettings {
    pub fn display_duration(&self) -> Duration {
        Duration::from_secs(self.display_secs)
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            display_secs: TOAST_DISPLAY_DURATION.as_secs(),
        }
    }
}

/// Connection settings for the hosted backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub url: String,
    pub anon_key: String,
}

impl std::fmt::Debug for BackendSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSettings")
            .field("url", &self.url)
            .field("anon_key", &if self.anon_key.is_empty() { "" } else { "***" })
            .finish()
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: "https://example.supabase.co".to_string(),
            anon_key: String::new(),
        }
    }
}

/// Root configuration (`config.toml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub log_level: String,
    pub activity: ActivitySettings,
    pub notifications: NotificationSettings,
    pub routes: RouteTable,
    pub backend: BackendSettings,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            activity: ActivitySettings::default(),
            notifications: NotificationSettings::default(),
            routes: RouteTable::default(),
            backend: BackendSettings::default(),
        }
    }
}
