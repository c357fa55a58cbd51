//! In-memory element tree used as the rendering surface.
//!
//! An [`Element`] is a cheap, clonable handle to a shared node. Children are
//! owned by their parent element; the parent link is weak, so detached
//! subtrees are freed as soon as the last handle to them is dropped.
//!
//! Event handlers are delegated: a handler bound on an element with a
//! selector fires for events dispatched from any matching descendant, so
//! replacing an element's content does not invalidate the binding.

use std::fmt;
use std::sync::{Arc, Weak};

use horizon_trellis_core::logging::targets;
use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use super::fragment::Fragment;
use super::selector::Selector;

new_key_type! {
    /// Identifies a delegated handler bound with [`Element::on`].
    pub struct HandlerId;
}

/// Tag used for text nodes.
pub const TEXT_NODE_TAG: &str = "#text";

/// A delegated event handler.
pub type EventHandler = Arc<dyn Fn(&DomEvent) + Send + Sync>;

/// An event delivered to a delegated handler.
#[derive(Clone, Debug)]
pub struct DomEvent {
    /// The event name, e.g. `"click"`.
    pub name: String,
    /// The element the event was dispatched from.
    pub target: Element,
    /// The element whose selector matched (the bound element for
    /// selector-less handlers).
    pub current: Element,
}

struct Delegated {
    event: String,
    selector: Option<Selector>,
    handler: EventHandler,
}

pub(crate) struct ElementData {
    pub(crate) tag: String,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    text: String,
    hidden: bool,
    children: Vec<Element>,
    parent: Weak<Mutex<ElementData>>,
    handlers: SlotMap<HandlerId, Delegated>,
}

/// Shared handle to an element.
#[derive(Clone)]
pub struct Element {
    inner: Arc<Mutex<ElementData>>,
}

impl Element {
    /// Create a detached element with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ElementData {
                tag: tag.into(),
                id: None,
                classes: Vec::new(),
                text: String::new(),
                hidden: false,
                children: Vec::new(),
                parent: Weak::new(),
                handlers: SlotMap::with_key(),
            })),
        }
    }

    /// Create a text node.
    pub fn text_node(text: impl Into<String>) -> Self {
        Self::new(TEXT_NODE_TAG).with_text(text)
    }

    /// Set the `id` attribute.
    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.inner.lock().id = Some(id.into());
        self
    }

    /// Add a class.
    pub fn with_class(self, class: impl Into<String>) -> Self {
        self.add_class(class);
        self
    }

    /// Set the element's own text.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    /// Start hidden.
    pub fn hidden(self) -> Self {
        self.hide();
        self
    }

    /// Append a child.
    pub fn with_child(self, child: Element) -> Self {
        self.append_child(&child);
        self
    }

    /// Append several children in order.
    pub fn with_children(self, children: impl IntoIterator<Item = Element>) -> Self {
        for child in children {
            self.append_child(&child);
        }
        self
    }

    pub(crate) fn with_data<R>(&self, f: impl FnOnce(&ElementData) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Whether both handles refer to the same element.
    pub fn ptr_eq(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The tag name.
    pub fn tag(&self) -> String {
        self.inner.lock().tag.clone()
    }

    /// The `id` attribute, if set.
    pub fn id(&self) -> Option<String> {
        self.inner.lock().id.clone()
    }

    /// The element's classes.
    pub fn classes(&self) -> Vec<String> {
        self.inner.lock().classes.clone()
    }

    /// Check for a class.
    pub fn has_class(&self, class: &str) -> bool {
        self.inner.lock().classes.iter().any(|c| c == class)
    }

    /// Add a class if not already present.
    pub fn add_class(&self, class: impl Into<String>) {
        let class = class.into();
        let mut data = self.inner.lock();
        if !data.classes.contains(&class) {
            data.classes.push(class);
        }
    }

    /// The element's own text (excluding descendants).
    pub fn text(&self) -> String {
        self.inner.lock().text.clone()
    }

    /// Replace the element's own text.
    pub fn set_text(&self, text: impl Into<String>) {
        self.inner.lock().text = text.into();
    }

    /// Own text followed by all descendant text, in document order.
    pub fn text_content(&self) -> String {
        let (mut text, children) = {
            let data = self.inner.lock();
            (data.text.clone(), data.children.clone())
        };
        for child in children {
            text.push_str(&child.text_content());
        }
        text
    }

    /// Whether the element itself is shown.
    pub fn is_visible(&self) -> bool {
        !self.inner.lock().hidden
    }

    /// Show the element.
    pub fn show(&self) {
        self.inner.lock().hidden = false;
    }

    /// Hide the element.
    pub fn hide(&self) {
        self.inner.lock().hidden = true;
    }

    /// The child elements, in order.
    pub fn children(&self) -> Vec<Element> {
        self.inner.lock().children.clone()
    }

    /// Number of child elements.
    pub fn child_count(&self) -> usize {
        self.inner.lock().children.len()
    }

    /// The parent element, if attached.
    pub fn parent(&self) -> Option<Element> {
        self.inner.lock().parent.upgrade().map(|inner| Element { inner })
    }

    /// Append `child` as the last child, moving it from any previous parent.
    pub fn append_child(&self, child: &Element) {
        if self.ptr_eq(child) {
            tracing::warn!(target: targets::DOM, "refusing to append an element to itself");
            return;
        }
        child.detach();
        self.inner.lock().children.push(child.clone());
        child.inner.lock().parent = Arc::downgrade(&self.inner);
    }

    /// Insert `child` just before `reference`, moving it from any previous
    /// parent. Appends if `reference` is not a child of this element.
    pub fn insert_before(&self, child: &Element, reference: &Element) {
        if self.ptr_eq(child) || child.ptr_eq(reference) {
            return;
        }
        child.detach();
        {
            let mut data = self.inner.lock();
            match data.children.iter().position(|c| c.ptr_eq(reference)) {
                Some(index) => data.children.insert(index, child.clone()),
                None => data.children.push(child.clone()),
            }
        }
        child.inner.lock().parent = Arc::downgrade(&self.inner);
    }

    /// Detach from the parent element without unbinding handlers.
    pub fn detach(&self) {
        let parent = std::mem::take(&mut self.inner.lock().parent);
        if let Some(parent) = parent.upgrade() {
            parent
                .lock()
                .children
                .retain(|c| !Arc::ptr_eq(&c.inner, &self.inner));
        }
    }

    /// Replace the element's text and children with `content`.
    pub fn set_content(&self, content: impl Into<Fragment>) {
        let old = {
            let mut data = self.inner.lock();
            data.text.clear();
            std::mem::take(&mut data.children)
        };
        for child in old {
            child.inner.lock().parent = Weak::new();
        }
        for node in content.into().into_nodes() {
            self.append_child(&node);
        }
    }

    /// Detach and return all children.
    pub fn take_children(&self) -> Vec<Element> {
        let children = std::mem::take(&mut self.inner.lock().children);
        for child in &children {
            child.inner.lock().parent = Weak::new();
        }
        children
    }

    /// Remove all text and children.
    pub fn clear(&self) {
        self.set_content(Fragment::new());
    }

    /// First descendant (depth-first, document order) matching `selector`.
    ///
    /// Unparsable selectors match nothing.
    pub fn find_first(&self, selector: &str) -> Option<Element> {
        let selector = parse_or_warn(selector)?;
        self.find_first_matching(&selector)
    }

    /// First descendant matching an already parsed selector.
    pub fn find_first_matching(&self, selector: &Selector) -> Option<Element> {
        for child in self.children() {
            if selector.matches(&child) {
                return Some(child);
            }
            if let Some(found) = child.find_first_matching(selector) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants matching `selector`, in document order.
    pub fn find_all(&self, selector: &str) -> Vec<Element> {
        let mut found = Vec::new();
        if let Some(selector) = parse_or_warn(selector) {
            self.collect_matching(&selector, &mut found);
        }
        found
    }

    fn collect_matching(&self, selector: &Selector, found: &mut Vec<Element>) {
        for child in self.children() {
            if selector.matches(&child) {
                found.push(child.clone());
            }
            child.collect_matching(selector, found);
        }
    }

    /// Detach from the parent and unbind every delegated handler.
    pub fn remove(&self) {
        self.off_all();
        self.detach();
    }

    /// Bind a delegated handler.
    ///
    /// With a selector, the handler fires for events dispatched from
    /// matching descendants; without one it fires for events reaching this
    /// element. Returns `None` if the selector cannot be parsed.
    pub fn on<F>(&self, event: impl Into<String>, selector: Option<&str>, handler: F) -> Option<HandlerId>
    where
        F: Fn(&DomEvent) + Send + Sync + 'static,
    {
        let selector = match selector {
            Some(text) => Some(parse_or_warn(text)?),
            None => None,
        };
        let delegated = Delegated {
            event: event.into(),
            selector,
            handler: Arc::new(handler),
        };
        Some(self.inner.lock().handlers.insert(delegated))
    }

    /// Unbind one handler. Returns `true` if it was bound.
    pub fn off(&self, id: HandlerId) -> bool {
        self.inner.lock().handlers.remove(id).is_some()
    }

    /// Unbind every handler.
    pub fn off_all(&self) {
        self.inner.lock().handlers.clear();
    }

    /// Number of bound handlers.
    pub fn handler_count(&self) -> usize {
        self.inner.lock().handlers.len()
    }

    /// Dispatch `event` from `target`, bubbling up to this element.
    ///
    /// Only handlers bound on this element are considered. Returns the number
    /// of handler invocations; zero if `target` is not inside this element.
    pub fn dispatch(&self, event: &str, target: &Element) -> usize {
        let mut path = Vec::new();
        let mut current = Some(target.clone());
        while let Some(node) = current {
            let reached_self = node.ptr_eq(self);
            path.push(node.clone());
            if reached_self {
                break;
            }
            current = node.parent();
        }
        if !path.last().is_some_and(|last| last.ptr_eq(self)) {
            return 0;
        }

        let handlers: Vec<(Option<Selector>, EventHandler)> = self
            .inner
            .lock()
            .handlers
            .values()
            .filter(|d| d.event == event)
            .map(|d| (d.selector.clone(), d.handler.clone()))
            .collect();

        let mut invoked = 0;
        for node in &path {
            let is_self = node.ptr_eq(self);
            for (selector, handler) in &handlers {
                let hit = match selector {
                    Some(selector) => !is_self && selector.matches(node),
                    None => is_self,
                };
                if hit {
                    handler(&DomEvent {
                        name: event.to_string(),
                        target: target.clone(),
                        current: node.clone(),
                    });
                    invoked += 1;
                }
            }
        }
        invoked
    }

    /// Serialize the subtree to HTML-like markup for inspection.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        let (tag, id, classes, text, hidden, children) = {
            let data = self.inner.lock();
            (
                data.tag.clone(),
                data.id.clone(),
                data.classes.join(" "),
                data.text.clone(),
                data.hidden,
                data.children.clone(),
            )
        };

        if tag == TEXT_NODE_TAG {
            out.push_str(&escape(&text));
            return;
        }

        out.push('<');
        out.push_str(&tag);
        if let Some(id) = id {
            out.push_str(&format!(" id=\"{}\"", escape(&id)));
        }
        if !classes.is_empty() {
            out.push_str(&format!(" class=\"{}\"", escape(&classes)));
        }
        if hidden {
            out.push_str(" style=\"display: none\"");
        }
        out.push('>');
        out.push_str(&escape(&text));
        for child in children {
            child.write_markup(out);
        }
        out.push_str("</");
        out.push_str(&tag);
        out.push('>');
    }
}

fn parse_or_warn(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(selector) => Some(selector),
        Err(err) => {
            tracing::warn!(target: targets::DOM, %err, "ignoring unparsable selector");
            None
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Element").field(&self.to_markup()).finish()
    }
}

// Ensure Element is Send + Sync
static_assertions::assert_impl_all!(Element: Send, Sync);
