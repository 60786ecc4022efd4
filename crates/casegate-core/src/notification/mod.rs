//! Notification domain module.
//!
//! Transient user-visible messages ("toasts") requested from any code path.

mod model;

pub use model::{Notification, NotificationId, Toast, ToastVariant};
