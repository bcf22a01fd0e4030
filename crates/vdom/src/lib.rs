//! Declarative view trees and their positional diff.

pub mod diff;
pub mod events;
pub mod patch;
pub mod traverse;
pub mod validate;
mod view;

pub use crate::diff::{changed, diff, diff_quirks, diff_root};
pub use crate::events::EventMap;
pub use crate::patch::{Patch, PatchStats, QuirkPatch};
pub use crate::validate::{ViewError, ViewPath, validate};
pub use crate::view::{Element, Events, Handler, IDENTITY_KEY, Quirks, View, ViewKind};
