//! Mounting, patching and event routing for `vdom` views on a live `dom`
//! document.

mod app;
pub mod patcher;
pub mod router;

pub use crate::app::{Dispatch, Runtime, RuntimeConfig, RuntimeError, ValidationMode};
pub use crate::patcher::{PatchError, apply, materialize};
pub use crate::router::Router;
