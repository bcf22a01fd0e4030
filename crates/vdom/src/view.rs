//! Declarative view trees.
//!
//! A [`View`] is rebuilt from scratch on every render pass and never mutated
//! afterwards. Elements carry string-valued quirks (attribute-like pairs),
//! event handlers and a mandatory, possibly empty, child list.

use dom::Event;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Reserved quirk key joining an element to its handlers and to the live node.
pub const IDENTITY_KEY: &str = "id";

pub type Handler = Rc<dyn Fn(&Event)>;

#[derive(Clone, Debug)]
pub enum View {
    Element(Element),
    Text(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewKind {
    Element,
    Text,
}

impl View {
    pub fn text(text: impl Into<String>) -> Self {
        View::Text(text.into())
    }

    pub fn kind(&self) -> ViewKind {
        match self {
            View::Element(_) => ViewKind::Element,
            View::Text(_) => ViewKind::Text,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            View::Element(element) => Some(&element.tag),
            View::Text(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            View::Element(element) => Some(element),
            View::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            View::Text(text) => Some(text),
            View::Element(_) => None,
        }
    }

    pub fn children(&self) -> &[View] {
        match self {
            View::Element(element) => &element.children,
            View::Text(_) => &[],
        }
    }

    pub fn identity(&self) -> Option<&str> {
        self.as_element().and_then(Element::identity)
    }
}

impl From<Element> for View {
    fn from(element: Element) -> Self {
        View::Element(element)
    }
}

impl From<&str> for View {
    fn from(text: &str) -> Self {
        View::Text(text.to_string())
    }
}

impl From<String> for View {
    fn from(text: String) -> Self {
        View::Text(text)
    }
}

#[derive(Clone, Debug)]
pub struct Element {
    pub tag: Arc<str>,
    pub quirks: Quirks,
    pub events: Events,
    pub children: Vec<View>,
}

impl Element {
    pub fn new(tag: impl Into<Arc<str>>) -> Self {
        Self {
            tag: tag.into(),
            quirks: Quirks::new(),
            events: Events::new(),
            children: Vec::new(),
        }
    }

    pub fn quirk(mut self, key: impl Into<Arc<str>>, value: impl Into<String>) -> Self {
        self.quirks.insert(key, value);
        self
    }

    /// Shorthand for the identity quirk.
    pub fn id(self, value: impl Into<String>) -> Self {
        self.quirk(IDENTITY_KEY, value)
    }

    pub fn class(self, value: impl Into<String>) -> Self {
        self.quirk("class", value)
    }

    pub fn on(mut self, event_type: impl Into<Arc<str>>, handler: Handler) -> Self {
        self.events.insert(event_type, handler);
        self
    }

    pub fn child(mut self, child: impl Into<View>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<View>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn identity(&self) -> Option<&str> {
        self.quirks.get(IDENTITY_KEY)
    }
}

/// Ordered quirk mapping. Keys keep their first insertion position; inserting
/// an existing key replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Quirks(Vec<(Arc<str>, String)>);

impl Quirks {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, key: impl Into<Arc<str>>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| &**k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &str)> {
        self.0.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Arc<str>> {
        self.0.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<Arc<str>>, V: Into<String>> FromIterator<(K, V)> for Quirks {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut quirks = Quirks::new();
        for (key, value) in iter {
            quirks.insert(key, value);
        }
        quirks
    }
}

/// Ordered event-type → handler mapping of one element.
#[derive(Clone, Default)]
pub struct Events(Vec<(Arc<str>, Handler)>);

impl Events {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, event_type: impl Into<Arc<str>>, handler: Handler) {
        let event_type = event_type.into();
        match self.0.iter_mut().find(|(t, _)| *t == event_type) {
            Some((_, existing)) => *existing = handler,
            None => self.0.push((event_type, handler)),
        }
    }

    pub fn get(&self, event_type: &str) -> Option<&Handler> {
        self.0
            .iter()
            .find(|(t, _)| &**t == event_type)
            .map(|(_, h)| h)
    }

    pub fn types(&self) -> impl Iterator<Item = &Arc<str>> {
        self.0.iter().map(|(t, _)| t)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Events {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.types()).finish()
    }
}
