//! Structural checks for freshly rendered view trees.
//!
//! The differ and the event mapper accept any tree; these checks catch the
//! authoring mistakes that would otherwise surface as silently wrong patches or
//! unreachable handlers.

use crate::view::{IDENTITY_KEY, View};
use std::collections::HashMap;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewError {
    EmptyTag {
        path: ViewPath,
    },
    EmptyQuirkKey {
        path: ViewPath,
    },
    /// The element declares handlers but has no identity key, so routing can
    /// never reach them.
    MissingIdentityKey {
        path: ViewPath,
        tag: String,
        event_types: Vec<String>,
    },
    DuplicateIdentityKey {
        key: String,
        first: ViewPath,
        second: ViewPath,
    },
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewError::EmptyTag { path } => write!(f, "element at {path} has an empty tag"),
            ViewError::EmptyQuirkKey { path } => {
                write!(f, "element at {path} has an empty quirk key")
            }
            ViewError::MissingIdentityKey {
                path,
                tag,
                event_types,
            } => write!(
                f,
                "<{tag}> at {path} handles {} but has no `{IDENTITY_KEY}` quirk",
                event_types.join(", ")
            ),
            ViewError::DuplicateIdentityKey { key, first, second } => write!(
                f,
                "identity key {key:?} used at {first} and again at {second}"
            ),
        }
    }
}

impl std::error::Error for ViewError {}

/// Child-index path from the root, rendered as `/0/3/1` (`/` is the root).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewPath(pub Vec<usize>);

impl fmt::Display for ViewPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for index in &self.0 {
            write!(f, "/{index}")?;
        }
        Ok(())
    }
}

/// Collect every structural problem in `view`, in pre-order.
pub fn validate(view: &View) -> Vec<ViewError> {
    let mut errors = Vec::new();
    let mut seen: HashMap<String, ViewPath> = HashMap::new();
    let mut path = Vec::new();
    walk(view, &mut path, &mut seen, &mut errors);
    errors
}

fn walk(
    view: &View,
    path: &mut Vec<usize>,
    seen: &mut HashMap<String, ViewPath>,
    errors: &mut Vec<ViewError>,
) {
    let View::Element(element) = view else {
        return;
    };
    if element.tag.is_empty() {
        errors.push(ViewError::EmptyTag {
            path: ViewPath(path.clone()),
        });
    }
    if element.quirks.keys().any(|k| k.is_empty()) {
        errors.push(ViewError::EmptyQuirkKey {
            path: ViewPath(path.clone()),
        });
    }
    match element.identity() {
        Some(identity) => {
            if let Some(first) = seen.get(identity) {
                errors.push(ViewError::DuplicateIdentityKey {
                    key: identity.to_string(),
                    first: first.clone(),
                    second: ViewPath(path.clone()),
                });
            } else {
                seen.insert(identity.to_string(), ViewPath(path.clone()));
            }
        }
        None if !element.events.is_empty() => {
            errors.push(ViewError::MissingIdentityKey {
                path: ViewPath(path.clone()),
                tag: element.tag.to_string(),
                event_types: element.events.types().map(|t| t.to_string()).collect(),
            });
        }
        None => {}
    }
    for (index, child) in element.children.iter().enumerate() {
        path.push(index);
        walk(child, path, seen, errors);
        path.pop();
    }
}
