//! Event map extraction.
//!
//! The event map joins identity keys to the handlers declared on the element
//! carrying them. It is rebuilt from the whole view tree on every render and
//! never merged with a previous map. Elements declaring handlers without an
//! identity key are skipped here; `validate` reports them.

use crate::view::{Events, Handler, View};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default, Debug)]
pub struct EventMap {
    handlers: HashMap<Arc<str>, Events>,
    event_types: Vec<Arc<str>>,
}

impl EventMap {
    pub fn build(view: &View) -> Self {
        let mut map = EventMap::default();
        // Depth-first, pre-order; children pushed in reverse to pop in order.
        let mut stack = vec![view];
        while let Some(node) = stack.pop() {
            let View::Element(element) = node else {
                continue;
            };
            if !element.events.is_empty()
                && let Some(identity) = element.identity()
            {
                map.insert(Arc::from(identity), &element.events);
            }
            stack.extend(element.children.iter().rev());
        }
        map
    }

    fn insert(&mut self, identity: Arc<str>, events: &Events) {
        for event_type in events.types() {
            if !self.event_types.contains(event_type) {
                self.event_types.push(Arc::clone(event_type));
            }
        }
        self.handlers.insert(identity, events.clone());
    }

    pub fn handler(&self, identity: &str, event_type: &str) -> Option<&Handler> {
        self.handlers.get(identity)?.get(event_type)
    }

    pub fn handlers(&self, identity: &str) -> Option<&Events> {
        self.handlers.get(identity)
    }

    /// Distinct event types, in order of first occurrence.
    pub fn event_types(&self) -> &[Arc<str>] {
        &self.event_types
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
