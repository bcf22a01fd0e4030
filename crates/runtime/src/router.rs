//! Delegated event routing.
//!
//! One native listener per event type sits on the mount root. When it fires,
//! the router walks from the event target toward the mount root and invokes
//! the first handler found in the current event map for an ancestor's identity
//! key. Nodes above the mount root are never examined, so nested or sibling
//! mounts do not see each other's handlers.

use dom::{Document, DomError, Event, Listener, ListenerId, NodeId};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use vdom::{EventMap, Handler, IDENTITY_KEY};

pub struct Router {
    mount: NodeId,
    document: Weak<RefCell<Document>>,
    event_map: Rc<RefCell<EventMap>>,
    attached: Vec<(Arc<str>, ListenerId)>,
}

impl Router {
    pub fn new(
        document: &Rc<RefCell<Document>>,
        mount: NodeId,
        event_map: Rc<RefCell<EventMap>>,
    ) -> Self {
        Self {
            mount,
            document: Rc::downgrade(document),
            event_map,
            attached: Vec::new(),
        }
    }

    pub fn mount(&self) -> NodeId {
        self.mount
    }

    /// Event types with a native listener on the mount root, in attach order.
    pub fn attached_types(&self) -> impl Iterator<Item = &str> {
        self.attached.iter().map(|(event_type, _)| &**event_type)
    }

    /// Attach a listener for every type in the current event map that has
    /// none yet. Types that disappear from the map keep their listener; it
    /// simply finds nothing to route.
    pub fn sync_listeners(&mut self, doc: &mut Document) -> Result<usize, DomError> {
        let pending: Vec<Arc<str>> = self
            .event_map
            .borrow()
            .event_types()
            .iter()
            .filter(|ty| !self.attached.iter().any(|(known, _)| known == *ty))
            .cloned()
            .collect();
        for event_type in &pending {
            let listener = self.listener();
            let id = doc.add_event_listener(self.mount, Arc::clone(event_type), listener)?;
            log::debug!(
                target: "runtime.router",
                "listening for {event_type:?} on node {}",
                self.mount.0
            );
            self.attached.push((Arc::clone(event_type), id));
        }
        Ok(pending.len())
    }

    /// Remove every native listener this router attached.
    pub fn detach(&mut self, doc: &mut Document) {
        for (event_type, id) in self.attached.drain(..) {
            if !doc.remove_event_listener(self.mount, id) {
                log::warn!(
                    target: "runtime.router",
                    "listener for {event_type:?} was already gone from node {}",
                    self.mount.0
                );
            }
        }
    }

    fn listener(&self) -> Listener {
        let document = Weak::clone(&self.document);
        let event_map = Rc::clone(&self.event_map);
        let mount = self.mount;
        Rc::new(move |event: &Event| {
            let Some(document) = document.upgrade() else {
                return;
            };
            // Both borrows end before the handler runs; handlers re-render.
            let handler = resolve(&document.borrow(), &event_map.borrow(), mount, event);
            match handler {
                Some(handler) => handler(event),
                None => log::trace!(
                    target: "runtime.router",
                    "no handler for {:?} from node {}",
                    event.event_type(),
                    event.target().0
                ),
            }
        })
    }
}

/// Find the handler for `event`, starting at its target and stopping after
/// `mount` has been examined.
pub fn resolve(doc: &Document, map: &EventMap, mount: NodeId, event: &Event) -> Option<Handler> {
    let mut current = Some(event.target());
    while let Some(node) = current {
        if let Some(identity) = doc.attribute(node, IDENTITY_KEY)
            && let Some(handler) = map.handler(identity, event.event_type())
        {
            return Some(Rc::clone(handler));
        }
        if node == mount {
            break;
        }
        current = doc.parent(node);
    }
    None
}
