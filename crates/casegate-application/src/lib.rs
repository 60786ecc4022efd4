//! Application layer for Casegate.
//!
//! This crate implements the gating use cases on top of the domain traits in
//! `casegate-core`: role resolution, route guarding, idle-timeout logout and
//! the notification relay.

pub mod access_usecase;
pub mod activity_watcher;
pub mod notification;
pub mod role_resolver;
pub mod route_guard;

pub use access_usecase::{AccessDependencies, AccessUseCase};
pub use activity_watcher::{ActivityWatcher, WatchExit, WatcherHandle, WatcherLifecycle};
pub use notification::{NotificationBus, Subscription, ToastSurface};
pub use role_resolver::{AccessState, RoleResolver};
pub use route_guard::{GuardDecision, GuardKind, GuardState, RouteGuard};
