//! Routing domain module.
//!
//! - `portal`: the two portals and their route table
//! - `navigator`: the router surface used to perform redirects

mod navigator;
mod portal;

pub use navigator::{Navigator, Redirect, RedirectState};
pub use portal::{Portal, RouteTable};
