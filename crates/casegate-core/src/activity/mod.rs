//! Activity domain module.
//!
//! Models the user-interaction signals that keep a client session alive and
//! the host surface (document/window) that emits them.
//!
//! # Module Structure
//!
//! - `model`: `InteractionKind`, `Visibility`, `ActivityState`
//! - `source`: `InteractionSource` trait and listener types

mod model;
mod source;

pub use model::{ActivityState, InteractionKind, Visibility};
pub use source::{
    InteractionListener, InteractionSource, ListenerId, ListenerOptions, VisibilityListener,
};
