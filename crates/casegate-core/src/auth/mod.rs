//! Authentication domain module.
//!
//! Holds the session value handed out by the hosted identity provider and the
//! trait the rest of the workspace uses to reach it.
//!
//! # Module Structure
//!
//! - `model`: `Session`, `SubjectId`, `SessionChange`
//! - `store`: the `SessionStore` trait

mod model;
mod store;

pub use model::{Session, SessionChange, SubjectId};
pub use store::SessionStore;
