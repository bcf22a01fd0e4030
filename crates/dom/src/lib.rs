//! In-process live document tree: the mutable side of rendering.

mod document;
pub mod event;
pub mod serialize;
pub mod snapshot;

pub use crate::document::{Document, DomError, Mutation, NodeType};
pub use crate::event::{Event, Listener, dispatch_event};
pub use core_types::{ListenerId, NodeId};
