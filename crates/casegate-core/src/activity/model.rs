//! Activity state model.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::{AsRefStr, Display};
use tokio::time::Instant;

/// Interaction event kinds that count as user activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InteractionKind {
    PointerDown,
    PointerMove,
    KeyDown,
    Scroll,
    TouchStart,
}

impl InteractionKind {
    /// Every kind the activity watcher subscribes to.
    pub const ALL: [InteractionKind; 5] = [
        InteractionKind::PointerDown,
        InteractionKind::PointerMove,
        InteractionKind::KeyDown,
        InteractionKind::Scroll,
        InteractionKind::TouchStart,
    ];
}

/// Visibility of the hosting document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// Last-activity bookkeeping for one session.
///
/// Pure over the instants it is handed, so the idle arithmetic can be checked
/// without any timer running.
#[derive(Debug, Clone, Copy)]
pub struct ActivityState {
    last_activity: Instant,
    threshold: Duration,
}

impl ActivityState {
    pub fn new(now: Instant, threshold: Duration) -> Self {
        Self {
            last_activity: now,
            threshold,
        }
    }

    /// Records activity at `now`. The timestamp never moves backwards.
    pub fn record(&mut self, now: Instant) {
        if now > self.last_activity {
            self.last_activity = now;
        }
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    pub fn is_breached(&self, now: Instant) -> bool {
        self.idle_for(now) >= self.threshold
    }
}
