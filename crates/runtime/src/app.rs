//! The render loop: state, view function, live mount and dispatch queue.
//!
//! Invariants:
//! - The live subtree under the mount element always reflects `view()` once a
//!   render has completed.
//! - State, view and event map are replaced together, after the new view has
//!   been patched in. A failing or panicking step leaves all three as they were.
//! - If patching fails partway, the mount is rebuilt from the current view so
//!   the live tree matches it again before the error is returned.
//! - Dispatches never interleave. A dispatch issued while another is being
//!   processed is queued and runs after it, in FIFO order.

use crate::patcher::{self, PatchError};
use crate::router::Router;
use core_types::RenderVersion;
use dom::{Document, DomError, Event, NodeId};
use std::cell::{Cell, Ref, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use vdom::{EventMap, Handler, View, ViewError, diff, traverse, validate};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// Reject invalid views; the previous UI stays current.
    Strict,
    /// Log findings and render anyway.
    #[default]
    Warn,
    Off,
}

#[derive(Clone, Debug, Default)]
pub struct RuntimeConfig {
    pub validation: ValidationMode,
}

#[derive(Debug)]
pub enum RuntimeError {
    MountNotFound(String),
    Unmounted,
    InvalidView(Vec<ViewError>),
    Patch(PatchError),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::MountNotFound(id) => write!(f, "no element with id {id:?} to mount on"),
            RuntimeError::Unmounted => f.write_str("runtime is not mounted"),
            RuntimeError::InvalidView(errors) => {
                write!(f, "view failed validation ({} problems)", errors.len())?;
                if let Some(first) = errors.first() {
                    write!(f, ": {first}")?;
                }
                Ok(())
            }
            RuntimeError::Patch(err) => write!(f, "patch failed: {err}"),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuntimeError::Patch(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PatchError> for RuntimeError {
    fn from(err: PatchError) -> Self {
        RuntimeError::Patch(err)
    }
}

impl From<DomError> for RuntimeError {
    fn from(err: DomError) -> Self {
        RuntimeError::Patch(PatchError::Dom(err))
    }
}

type ViewFn<S> = dyn Fn(&S, &Dispatch<S>) -> View;
type Update<S> = Box<dyn FnOnce(&S) -> S>;

struct Rendered<S> {
    state: S,
    view: View,
}

struct Inner<S: 'static> {
    document: Rc<RefCell<Document>>,
    mount: NodeId,
    config: RuntimeConfig,
    view_fn: Box<ViewFn<S>>,
    current: RefCell<Rendered<S>>,
    event_map: Rc<RefCell<EventMap>>,
    router: RefCell<Router>,
    queue: RefCell<VecDeque<Update<S>>>,
    draining: Cell<bool>,
    mounted: Cell<bool>,
    version: Cell<RenderVersion>,
}

/// A mounted application. Dropping it leaves the rendered tree in place but
/// turns every outstanding [`Dispatch`] into a no-op that reports
/// [`RuntimeError::Unmounted`].
pub struct Runtime<S: 'static> {
    inner: Rc<Inner<S>>,
}

/// Capability to schedule state updates on a runtime. Handed to every view
/// call; cheap to clone and safe to keep after the runtime is gone.
pub struct Dispatch<S: 'static> {
    inner: Weak<Inner<S>>,
}

impl<S: 'static> Clone for Dispatch<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<S: 'static> fmt::Debug for Dispatch<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("live", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl<S: 'static> Runtime<S> {
    /// Mount on the element whose `id` attribute is `mount_id`.
    pub fn mount<F>(
        document: Rc<RefCell<Document>>,
        mount_id: &str,
        initial_state: S,
        view_fn: F,
        config: RuntimeConfig,
    ) -> Result<Self, RuntimeError>
    where
        F: Fn(&S, &Dispatch<S>) -> View + 'static,
    {
        let mount = document
            .borrow()
            .get_element_by_id(mount_id)
            .ok_or_else(|| RuntimeError::MountNotFound(mount_id.to_string()))?;
        Self::mount_at(document, mount, initial_state, view_fn, config)
    }

    /// Mount on an existing element. Its current children are discarded.
    pub fn mount_at<F>(
        document: Rc<RefCell<Document>>,
        mount: NodeId,
        initial_state: S,
        view_fn: F,
        config: RuntimeConfig,
    ) -> Result<Self, RuntimeError>
    where
        F: Fn(&S, &Dispatch<S>) -> View + 'static,
    {
        let event_map = Rc::new(RefCell::new(EventMap::default()));
        let router = Router::new(&document, mount, Rc::clone(&event_map));
        let inner = Rc::new_cyclic(|weak: &Weak<Inner<S>>| {
            let dispatch = Dispatch {
                inner: Weak::clone(weak),
            };
            let view = view_fn(&initial_state, &dispatch);
            Inner {
                document,
                mount,
                config,
                view_fn: Box::new(view_fn),
                current: RefCell::new(Rendered {
                    state: initial_state,
                    view,
                }),
                event_map,
                router: RefCell::new(router),
                queue: RefCell::new(VecDeque::new()),
                draining: Cell::new(false),
                mounted: Cell::new(false),
                version: Cell::new(RenderVersion::INITIAL),
            }
        });
        inner.initial_render()?;
        Ok(Self { inner })
    }

    pub fn dispatcher(&self) -> Dispatch<S> {
        Dispatch {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn dispatch(&self, update: impl FnOnce(&S) -> S + 'static) -> Result<(), RuntimeError> {
        self.dispatcher().dispatch(update)
    }

    pub fn state(&self) -> Ref<'_, S> {
        Ref::map(self.inner.current.borrow(), |current| &current.state)
    }

    pub fn view(&self) -> Ref<'_, View> {
        Ref::map(self.inner.current.borrow(), |current| &current.view)
    }

    pub fn event_map(&self) -> Ref<'_, EventMap> {
        self.inner.event_map.borrow()
    }

    pub fn document(&self) -> &Rc<RefCell<Document>> {
        &self.inner.document
    }

    pub fn mount_node(&self) -> NodeId {
        self.inner.mount
    }

    /// Completed renders, the initial one included.
    pub fn render_count(&self) -> u64 {
        self.inner.version.get().0
    }

    /// Event types the mount root currently listens for.
    pub fn listened_event_types(&self) -> Vec<Arc<str>> {
        self.inner
            .router
            .borrow()
            .attached_types()
            .map(Arc::from)
            .collect()
    }

    /// Detach the router and clear the mount element. Later dispatches fail
    /// with [`RuntimeError::Unmounted`].
    pub fn unmount(&self) -> Result<(), RuntimeError> {
        if !self.inner.mounted.replace(false) {
            return Err(RuntimeError::Unmounted);
        }
        self.inner.queue.borrow_mut().clear();
        let mut doc = self.inner.document.borrow_mut();
        self.inner.router.borrow_mut().detach(&mut doc);
        doc.clear_children(self.inner.mount)?;
        log::debug!(target: "runtime", "unmounted from node {}", self.inner.mount.0);
        Ok(())
    }
}

impl<S: 'static> Dispatch<S> {
    /// Schedule `update`. Runs it (and anything it queues) before returning
    /// unless a dispatch is already in progress, in which case it is queued.
    pub fn dispatch(&self, update: impl FnOnce(&S) -> S + 'static) -> Result<(), RuntimeError> {
        let inner = self.inner.upgrade().ok_or(RuntimeError::Unmounted)?;
        if !inner.mounted.get() {
            return Err(RuntimeError::Unmounted);
        }
        inner.queue.borrow_mut().push_back(Box::new(update));
        if inner.draining.get() {
            log::trace!(target: "runtime", "dispatch queued behind running render");
            return Ok(());
        }
        inner.drain()
    }

    /// Event handler that dispatches `update` on every event. Errors are
    /// logged, since there is no caller to return them to.
    pub fn callback(&self, update: impl Fn(&S) -> S + 'static) -> Handler {
        let dispatch = self.clone();
        let update = Rc::new(update);
        Rc::new(move |event: &Event| {
            let update = Rc::clone(&update);
            if let Err(err) = dispatch.dispatch(move |state| update(state)) {
                log::error!(
                    target: "runtime",
                    "dispatch from {:?} on node {} failed: {err}",
                    event.event_type(),
                    event.target().0
                );
            }
        })
    }

    pub fn is_live(&self) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.mounted.get())
    }
}

impl<S: 'static> Inner<S> {
    fn initial_render(&self) -> Result<(), RuntimeError> {
        let current = self.current.borrow();
        self.check_view(&current.view)?;
        let mut doc = self.document.borrow_mut();
        self.rebuild(&mut doc, &current.view)?;
        *self.event_map.borrow_mut() = EventMap::build(&current.view);
        self.router.borrow_mut().sync_listeners(&mut doc)?;
        self.mounted.set(true);
        self.version.set(RenderVersion::INITIAL.next());
        log::debug!(
            target: "runtime",
            "mounted on node {}: {} view nodes, {} event types",
            self.mount.0,
            traverse::count_nodes(&current.view),
            self.event_map.borrow().event_types().len()
        );
        Ok(())
    }

    fn drain(self: &Rc<Self>) -> Result<(), RuntimeError> {
        let _guard = DrainGuard::enter(self);
        loop {
            let Some(update) = self.queue.borrow_mut().pop_front() else {
                return Ok(());
            };
            if let Err(err) = self.render(update) {
                let dropped = std::mem::take(&mut *self.queue.borrow_mut()).len();
                if dropped > 0 {
                    log::warn!(target: "runtime", "dropping {dropped} queued updates after failed render");
                }
                return Err(err);
            }
        }
    }

    fn render(self: &Rc<Self>, update: Update<S>) -> Result<(), RuntimeError> {
        let dispatch = Dispatch {
            inner: Rc::downgrade(self),
        };
        let (state, view) = {
            let current = self.current.borrow();
            let state = update(&current.state);
            let view = (self.view_fn)(&state, &dispatch);
            (state, view)
        };
        self.check_view(&view)?;

        let version = self.version.get().next();
        {
            let current = self.current.borrow();
            let patch = diff(Some(&current.view), Some(&view));
            if let Some(patch) = &patch {
                log::debug!(target: "runtime", "render {}: {:?}", version.0, patch.stats());
            }
            let mut doc = self.document.borrow_mut();
            if let Err(err) = patcher::apply(&mut doc, self.mount, patch.as_ref(), 0) {
                log::error!(
                    target: "runtime",
                    "render {} failed to patch ({err}); rebuilding render {}",
                    version.0,
                    self.version.get().0
                );
                if let Err(rebuild) = self.rebuild(&mut doc, &current.view) {
                    log::error!(target: "runtime", "rebuild failed: {rebuild}");
                }
                return Err(err.into());
            }
        }

        *self.event_map.borrow_mut() = EventMap::build(&view);
        *self.current.borrow_mut() = Rendered { state, view };
        self.version.set(version);
        self.router
            .borrow_mut()
            .sync_listeners(&mut self.document.borrow_mut())?;
        Ok(())
    }

    /// Replace everything under the mount with a fresh tree for `view`.
    fn rebuild(&self, doc: &mut Document, view: &View) -> Result<(), RuntimeError> {
        doc.clear_children(self.mount)?;
        let patch = diff(None, Some(view));
        patcher::apply(doc, self.mount, patch.as_ref(), 0)?;
        Ok(())
    }

    fn check_view(&self, view: &View) -> Result<(), RuntimeError> {
        if self.config.validation == ValidationMode::Off {
            return Ok(());
        }
        let errors = validate(view);
        if errors.is_empty() {
            return Ok(());
        }
        if self.config.validation == ValidationMode::Strict {
            return Err(RuntimeError::InvalidView(errors));
        }
        for err in &errors {
            log::warn!(target: "runtime", "{err}");
        }
        Ok(())
    }
}

/// Marks a drain as running and clears the mark however the drain ends. On
/// unwind the queue is cleared too, since its entries were issued against a
/// state that never became current.
struct DrainGuard<'a, S: 'static> {
    inner: &'a Inner<S>,
}

impl<'a, S: 'static> DrainGuard<'a, S> {
    fn enter(inner: &'a Inner<S>) -> Self {
        inner.draining.set(true);
        Self { inner }
    }
}

impl<S: 'static> Drop for DrainGuard<'_, S> {
    fn drop(&mut self) {
        self.inner.draining.set(false);
        if std::thread::panicking() {
            self.inner.queue.borrow_mut().clear();
        }
    }
}
