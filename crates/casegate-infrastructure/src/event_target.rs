//! Listener registry standing in for the browser document/window.
//!
//! The host (a webview bridge, a test, the CLI) feeds events in through
//! [`EventTargetRegistry::dispatch`] and [`EventTargetRegistry::set_visibility`].

use casegate_core::activity::{
    InteractionKind, InteractionListener, InteractionSource, ListenerId, ListenerOptions,
    Visibility, VisibilityListener,
};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

struct InteractionEntry {
    kind: InteractionKind,
    options: ListenerOptions,
    listener: InteractionListener,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    interactions: BTreeMap<ListenerId, InteractionEntry>,
    visibility_listeners: BTreeMap<ListenerId, VisibilityListener>,
    visibility: Visibility,
}

impl Registry {
    fn allocate(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }
}

#[derive(Default)]
pub struct EventTargetRegistry {
    registry: Mutex<Registry>,
}

impl EventTargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers an interaction event to every listener of that kind.
    /// Returns the number of listeners invoked.
    pub fn dispatch(&self, kind: InteractionKind) -> usize {
        let listeners: Vec<InteractionListener> = self
            .lock()
            .interactions
            .values()
            .filter(|entry| entry.kind == kind)
            .map(|entry| entry.listener.clone())
            .collect();
        for listener in &listeners {
            listener(kind);
        }
        listeners.len()
    }

    /// Changes document visibility and notifies listeners if it changed.
    pub fn set_visibility(&self, visibility: Visibility) {
        let listeners: Vec<VisibilityListener> = {
            let mut registry = self.lock();
            if registry.visibility == visibility {
                return;
            }
            registry.visibility = visibility;
            registry.visibility_listeners.values().cloned().collect()
        };
        for listener in &listeners {
            listener(visibility);
        }
    }

    pub fn interaction_listener_count(&self) -> usize {
        self.lock().interactions.len()
    }

    pub fn visibility_listener_count(&self) -> usize {
        self.lock().visibility_listeners.len()
    }

    /// Total of interaction and visibility listeners.
    pub fn listener_count(&self) -> usize {
        let registry = self.lock();
        registry.interactions.len() + registry.visibility_listeners.len()
    }

    pub fn all_passive(&self) -> bool {
        self.lock()
            .interactions
            .values()
            .all(|entry| entry.options.passive)
    }

    pub fn listens_to(&self, kind: InteractionKind) -> bool {
        self.lock()
            .interactions
            .values()
            .any(|entry| entry.kind == kind)
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InteractionSource for EventTargetRegistry {
    fn add_listener(
        &self,
        kind: InteractionKind,
        options: ListenerOptions,
        listener: InteractionListener,
    ) -> ListenerId {
        let mut registry = self.lock();
        let id = registry.allocate();
        registry.interactions.insert(
            id,
            InteractionEntry {
                kind,
                options,
                listener,
            },
        );
        id
    }

    fn add_visibility_listener(&self, listener: VisibilityListener) -> ListenerId {
        let mut registry = self.lock();
        let id = registry.allocate();
        registry.visibility_listeners.insert(id, listener);
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut registry = self.lock();
        registry.interactions.remove(&id).is_some()
            || registry.visibility_listeners.remove(&id).is_some()
    }

    fn visibility(&self) -> Visibility {
        self.lock().visibility
    }
}
