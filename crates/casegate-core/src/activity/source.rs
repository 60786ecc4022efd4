//! Interaction source trait.

use super::model::{InteractionKind, Visibility};
use std::sync::Arc;

/// Callback invoked for an interaction event.
pub type InteractionListener = Arc<dyn Fn(InteractionKind) + Send + Sync>;

/// Callback invoked when document visibility changes.
pub type VisibilityListener = Arc<dyn Fn(Visibility) + Send + Sync>;

/// Handle returned on registration, used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Registration options mirroring the host's event-listener options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// A passive listener never blocks the default handling of the event.
    pub passive: bool,
}

impl ListenerOptions {
    pub const PASSIVE: Self = Self { passive: true };
}

/// The document/window scope that emits interaction and visibility events.
///
/// The gating layer only reads visibility; it never changes it.
pub trait InteractionSource: Send + Sync {
    fn add_listener(
        &self,
        kind: InteractionKind,
        options: ListenerOptions,
        listener: InteractionListener,
    ) -> ListenerId;

    fn add_visibility_listener(&self, listener: VisibilityListener) -> ListenerId;

    /// Removes a listener. Returns false when the id was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;

    fn visibility(&self) -> Visibility;
}
