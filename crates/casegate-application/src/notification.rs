//! Notification relay.
//!
//! [`NotificationBus`] is a publish/subscribe registry: any code path publishes
//! a [`Toast`], every subscribed display surface receives it. A
//! [`ToastSurface`] is one such display: it subscribes on mount, unsubscribes
//! on drop, and removes each toast after its display duration.

use casegate_core::notification::{Notification, NotificationId, Toast};
use casegate_core::{CasegateError, Result};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;

/// Handler invoked for every published toast.
pub type NotificationHandler = Arc<dyn Fn(&Toast) + Send + Sync>;

struct BusInner {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(u64, NotificationHandler)>>,
}

/// Process-wide or scoped toast bus. Cloning shares the registry.
#[derive(Clone)]
pub struct NotificationBus {
    inner: Arc<BusInner>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                next_id: AtomicU64::new(1),
                handlers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Publishes a toast to every subscriber and returns how many received it.
    ///
    /// With no subscriber the toast goes to the log instead.
    pub fn publish(&self, toast: Toast) -> usize {
        // Handlers run outside the lock so they may publish or unsubscribe.
        let handlers: Vec<NotificationHandler> = lock(&self.inner.handlers)
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        if handlers.is_empty() {
            tracing::info!(
                title = %toast.title,
                description = ?toast.description,
                variant = ?toast.variant,
                "[NotificationBus] No display surface registered; toast logged"
            );
            return 0;
        }

        for handler in &handlers {
            handler(&toast);
        }
        handlers.len()
    }

    /// Registers a handler. It stays registered until the returned
    /// [`Subscription`] is dropped or unsubscribed.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Toast) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.inner.handlers).push((id, Arc::new(handler)));
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner.handlers).len()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A live registration on a [`NotificationBus`].
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            lock(&bus.handlers).retain(|(id, _)| *id != self.id);
        }
    }
}

static GLOBAL_BUS: Lazy<NotificationBus> = Lazy::new(NotificationBus::new);

/// The process-wide bus.
pub fn global() -> &'static NotificationBus {
    &GLOBAL_BUS
}

/// Publishes a toast on the process-wide bus.
pub fn notify(toast: Toast) -> usize {
    global().publish(toast)
}

/// An ordered list of visible toasts fed by a bus.
pub struct ToastSurface {
    toasts: Arc<Mutex<Vec<Notification>>>,
    _subscription: Subscription,
}

impl ToastSurface {
    /// Mounts a surface on `bus`. Each toast it receives is removed again
    /// after `display`.
    ///
    /// # Errors
    ///
    /// Fails when called outside a tokio runtime, which drives the removal timers.
    pub fn mount(bus: &NotificationBus, display: Duration) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            CasegateError::internal(format!("ToastSurface requires a tokio runtime: {}", e))
        })?;

        let toasts: Arc<Mutex<Vec<Notification>>> = Arc::new(Mutex::new(Vec::new()));
        let list = Arc::downgrade(&toasts);

        let subscription = bus.subscribe(move |toast| {
            let Some(list) = list.upgrade() else {
                return;
            };
            let notification = Notification::from_toast(toast.clone());
            let id = notification.id;
            lock(&list).push(notification);

            let list = Arc::downgrade(&list);
            runtime.spawn(async move {
                tokio::time::sleep(display).await;
                if let Some(list) = list.upgrade() {
                    remove_by_id(&list, id);
                }
            });
        });

        Ok(Self {
            toasts,
            _subscription: subscription,
        })
    }

    /// Visible toasts in insertion order.
    pub fn toasts(&self) -> Vec<Notification> {
        lock(&self.toasts).clone()
    }

    /// Removes a toast now. Unknown ids are ignored.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        remove_by_id(&self.toasts, id)
    }
}

fn remove_by_id(list: &Mutex<Vec<Notification>>, id: NotificationId) -> bool {
    let mut list = lock(list);
    let before = list.len();
    list.retain(|n| n.id != id);
    list.len() != before
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use casegate_core::config::TOAST_DISPLAY_DURATION;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_publish_without_subscriber_is_logged_not_thrown() {
        let bus = NotificationBus::new();
        assert_eq!(bus.publish(Toast::new("X")), 0);
    }

    #[test]
    fn test_subscription_drop_unregisters() {
        let bus = NotificationBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let subscription = bus.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(bus.publish(Toast::new("one")), 1);
        subscription.unsubscribe();
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(Toast::new("two")), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_surfaces_coexist() {
        let bus = NotificationBus::new();
        let _a = bus.subscribe(|_| {});
        let _b = bus.subscribe(|_| {});
        assert_eq!(bus.publish(Toast::new("both")), 2);
    }

    #[test]
    fn test_global_bus_is_shared() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let _subscription = global().subscribe(move |toast| {
            if toast.title == "global-bus-check" {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        assert!(notify(Toast::new("global-bus-check")) >= 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_mount_outside_runtime_fails() {
        let bus = NotificationBus::new();
        assert!(ToastSurface::mount(&bus, TOAST_DISPLAY_DURATION).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_toast_expires_after_display_duration() {
        let bus = NotificationBus::new();
        let surface = ToastSurface::mount(&bus, TOAST_DISPLAY_DURATION).unwrap();

        bus.publish(Toast::new("X").description("saved"));
        let toasts = surface.toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].title, "X");

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(surface.toasts().len(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(surface.toasts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_then_stale_timer_is_noop() {
        let bus = NotificationBus::new();
        let surface = ToastSurface::mount(&bus, TOAST_DISPLAY_DURATION).unwrap();

        bus.publish(Toast::new("first"));
        let first = surface.toasts()[0].id;
        assert!(surface.dismiss(first));
        assert!(!surface.dismiss(first));

        tokio::time::sleep(Duration::from_secs(1)).await;
        bus.publish(Toast::new("second"));

        // The first toast's timer fires here against an id that is gone.
        tokio::time::sleep(Duration::from_millis(4_500)).await;
        let remaining = surface.toasts();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].title, "second");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ids_are_unique_and_ordered() {
        let bus = NotificationBus::new();
        let surface = ToastSurface::mount(&bus, TOAST_DISPLAY_DURATION).unwrap();
        bus.publish(Toast::new("a"));
        bus.publish(Toast::new("b"));

        let toasts = surface.toasts();
        assert_eq!(toasts[0].title, "a");
        assert_eq!(toasts[1].title, "b");
        assert_ne!(toasts[0].id, toasts[1].id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_surface_unsubscribes() {
        let bus = NotificationBus::new();
        let surface = ToastSurface::mount(&bus, TOAST_DISPLAY_DURATION).unwrap();
        assert_eq!(bus.subscriber_count(), 1);
        drop(surface);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
