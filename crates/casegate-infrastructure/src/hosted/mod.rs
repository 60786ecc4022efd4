//! Adapters for the hosted backend-as-a-service.
//!
//! - `backend`: shared HTTP client and status mapping
//! - `auth_client`: `SessionStore` over the hosted auth API
//! - `profile_store`: `ProfileStore` over the hosted REST API

mod auth_client;
mod backend;
mod profile_store;

pub use auth_client::HostedAuthClient;
pub use backend::HostedBackend;
pub use profile_store::RestProfileStore;
