//! Principal domain module.
//!
//! A principal profile is the row describing a subject's role and tenant
//! membership. It is the only input to the internal/external classification.

mod model;
mod store;

pub use model::{InternalRole, PrincipalProfile, Role};
pub use store::ProfileStore;
