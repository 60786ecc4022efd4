pub mod config_service;
pub mod event_target;
pub mod history_navigator;
pub mod hosted;
pub mod memory_profile_store;
pub mod memory_session_store;
pub mod paths;

pub use crate::config_service::ConfigService;
pub use crate::event_target::EventTargetRegistry;
pub use crate::history_navigator::HistoryNavigator;
pub use crate::hosted::{HostedAuthClient, HostedBackend, RestProfileStore};
pub use crate::memory_profile_store::InMemoryProfileStore;
pub use crate::memory_session_store::InMemorySessionStore;
