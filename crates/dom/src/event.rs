//! Native event delivery with bubbling.
//!
//! Delivery snapshots the propagation path (target up to the document root)
//! and the listeners registered along it while the document is borrowed, then
//! releases the borrow before invoking any listener. Listeners may therefore
//! mutate the document; nodes removed during delivery still receive the event
//! if they were on the snapshotted path.

use crate::document::{DomError, Document};
use core_types::NodeId;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

pub type Listener = Rc<dyn Fn(&Event)>;

#[derive(Debug)]
pub struct Event {
    event_type: Arc<str>,
    target: NodeId,
    current_target: Cell<NodeId>,
    propagation_stopped: Cell<bool>,
}

impl Event {
    pub fn new(event_type: impl Into<Arc<str>>, target: NodeId) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            current_target: Cell::new(target),
            propagation_stopped: Cell::new(false),
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Node the event originated from.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Node whose listener is currently running.
    pub fn current_target(&self) -> NodeId {
        self.current_target.get()
    }

    /// Skip ancestors that have not been reached yet. Remaining listeners on
    /// the current node still run.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

/// Deliver `event_type` at `target`, bubbling to the root. Returns the number
/// of listeners invoked.
pub fn dispatch_event(
    document: &RefCell<Document>,
    target: NodeId,
    event_type: &str,
) -> Result<usize, DomError> {
    let route = {
        let doc = document.borrow();
        if !doc.contains(target) {
            return Err(DomError::UnknownNode(target));
        }
        let mut route = Vec::new();
        let mut current = Some(target);
        while let Some(node) = current {
            let listeners = doc.listeners_for(node, event_type);
            if !listeners.is_empty() {
                route.push((node, listeners));
            }
            current = doc.parent(node);
        }
        route
    };

    log::trace!(
        target: "dom.event",
        "dispatch {event_type} at node {} ({} listening nodes)",
        target.0,
        route.len()
    );

    let event = Event::new(event_type, target);
    let mut invoked = 0;
    for (node, listeners) in route {
        if event.is_propagation_stopped() {
            break;
        }
        event.current_target.set(node);
        for listener in listeners {
            listener(&event);
            invoked += 1;
        }
    }
    Ok(invoked)
}
