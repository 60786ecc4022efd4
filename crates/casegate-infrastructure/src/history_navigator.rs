//! Navigator that records a history stack instead of driving a real router.

use casegate_core::routing::{Navigator, Redirect};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

#[derive(Default)]
pub struct HistoryNavigator {
    history: Mutex<Vec<Redirect>>,
    outlet_renders: AtomicUsize,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirects(&self) -> Vec<Redirect> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_redirect(&self) -> Option<Redirect> {
        self.redirects().pop()
    }

    pub fn outlet_renders(&self) -> usize {
        self.outlet_renders.load(Ordering::SeqCst)
    }
}

impl Navigator for HistoryNavigator {
    fn redirect(&self, redirect: Redirect) {
        tracing::debug!("[HistoryNavigator] -> {}", redirect.path);
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(redirect);
    }

    fn render_outlet(&self) {
        self.outlet_renders.fetch_add(1, Ordering::SeqCst);
    }
}
