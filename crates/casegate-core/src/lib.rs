//! Domain layer for Casegate.
//!
//! Models and collaborator traits for portal access gating: sessions,
//! principal profiles, routing, user activity and notifications.

pub mod activity;
pub mod auth;
pub mod config;
pub mod error;
pub mod notification;
pub mod principal;
pub mod routing;

// Re-export common error type
pub use error::{CasegateError, Result};
