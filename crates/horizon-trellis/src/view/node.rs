//! The generic view tree engine.

use std::fmt;
use std::sync::Arc;

use horizon_trellis_core::logging::targets;
use horizon_trellis_core::{NodeBase, NodeId};
use indexmap::IndexMap;
use serde_json::Value;

use super::{AddOptions, ChildKey, ChildSlot, View, view_cast, view_cast_mut};
use crate::dom::{DomEvent, Element, EventHandler, Fragment, HandlerId};
use crate::template::{DataProvider, ModelData, Template, TemplateData};

/// Hook invoked with the root element after every render.
pub type RenderHook = Box<dyn FnMut(&Element) + Send>;

/// A declarative event binding, delegated from the view's root element.
#[derive(Clone)]
pub struct EventBinding {
    /// Event name, e.g. `"click"`.
    pub event: String,
    /// Selector of descendants the handler applies to; `None` for the root.
    pub selector: Option<String>,
    /// The handler.
    pub handler: EventHandler,
}

impl EventBinding {
    /// Create a binding.
    pub fn new<F>(event: impl Into<String>, selector: Option<&str>, handler: F) -> Self
    where
        F: Fn(&DomEvent) + Send + Sync + 'static,
    {
        Self {
            event: event.into(),
            selector: selector.map(str::to_string),
            handler: Arc::new(handler),
        }
    }
}

impl fmt::Debug for EventBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBinding")
            .field("event", &self.event)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

/// Construction options for a [`ViewNode`].
#[derive(Default)]
pub struct ViewOptions {
    tag: Option<String>,
    element_id: Option<String>,
    classes: Vec<String>,
    element: Option<Element>,
    name: Option<String>,
    template: Option<Template>,
    unwrap: bool,
    model: Option<Arc<dyn ModelData>>,
    data: DataProvider,
    helpers: TemplateData,
    events: Vec<EventBinding>,
    on_render: Option<RenderHook>,
}

impl ViewOptions {
    /// Default options: a `div` root, no template.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag of the generated root element.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// `id` attribute of the generated root element.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.element_id = Some(id.into());
        self
    }

    /// Add a class to the generated root element.
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Use an existing element as the root instead of generating one.
    pub fn element(mut self, element: Element) -> Self {
        self.element = Some(element);
        self
    }

    /// Debug name recorded in the node registry.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Template rendered into the root element.
    pub fn template(mut self, template: Template) -> Self {
        self.template = Some(template);
        self
    }

    /// Let the template's single outermost element become the root.
    pub fn unwrap(mut self, unwrap: bool) -> Self {
        self.unwrap = unwrap;
        self
    }

    /// Bind a model.
    pub fn model<M: ModelData + 'static>(mut self, model: M) -> Self {
        self.model = Some(Arc::new(model));
        self
    }

    /// Bind a shared model.
    pub fn model_arc(mut self, model: Arc<dyn ModelData>) -> Self {
        self.model = Some(model);
        self
    }

    /// Override where template data comes from.
    pub fn data(mut self, data: DataProvider) -> Self {
        self.data = data;
        self
    }

    /// Add a render helper, merged over the template data.
    pub fn helper(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.helpers.insert(key.into(), value.into());
        self
    }

    /// Add a declarative event binding.
    pub fn on<F>(mut self, event: impl Into<String>, selector: Option<&str>, handler: F) -> Self
    where
        F: Fn(&DomEvent) + Send + Sync + 'static,
    {
        self.events.push(EventBinding::new(event, selector, handler));
        self
    }

    /// Hook invoked after every render.
    pub fn on_render<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&Element) + Send + 'static,
    {
        self.on_render = Some(Box::new(hook));
        self
    }

    /// Set the tag only if none was chosen.
    pub(crate) fn or_tag(mut self, tag: &str) -> Self {
        if self.tag.is_none() {
            self.tag = Some(tag.to_string());
        }
        self
    }
}

impl fmt::Debug for ViewOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewOptions")
            .field("tag", &self.tag)
            .field("name", &self.name)
            .field("unwrap", &self.unwrap)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

/// A node in a view tree.
///
/// Owns its child views, keyed by [`ChildKey`] in insertion order. Children
/// added after the node has rendered are rendered and attached immediately;
/// before that they wait for the next [`render`](ViewNode::render).
pub struct ViewNode {
    base: NodeBase,
    element: Element,
    children: IndexMap<ChildKey, ChildSlot>,
    rendered: bool,
    template: Option<Template>,
    unwrap: bool,
    model: Option<Arc<dyn ModelData>>,
    data: DataProvider,
    helpers: TemplateData,
    events: Vec<EventBinding>,
    bound: Vec<HandlerId>,
    on_render: Option<RenderHook>,
}

impl ViewNode {
    /// Create a node with default options.
    pub fn new() -> Self {
        Self::with_options(ViewOptions::new())
    }

    /// Create a node from options.
    pub fn with_options(options: ViewOptions) -> Self {
        Self::with_options_as::<ViewNode>(options)
    }

    /// Create a node registered under the type name of `T`.
    pub(crate) fn with_options_as<T: 'static>(options: ViewOptions) -> Self {
        let base = NodeBase::new::<T>();
        let tag = options.tag.unwrap_or_else(|| "div".to_string());
        base.set_name(options.name.unwrap_or_else(|| tag.clone()));

        let element = options.element.unwrap_or_else(|| {
            let mut element = Element::new(tag);
            if let Some(id) = options.element_id {
                element = element.with_id(id);
            }
            for class in options.classes {
                element = element.with_class(class);
            }
            element
        });

        let mut node = Self {
            base,
            element,
            children: IndexMap::new(),
            rendered: false,
            template: options.template,
            unwrap: options.unwrap,
            model: options.model,
            data: options.data,
            helpers: options.helpers,
            events: options.events,
            bound: Vec::new(),
            on_render: options.on_render,
        };
        node.delegate_events();
        tracing::trace!(target: targets::VIEW, node = ?node.base.id(), "created view node");
        node
    }

    /// The node's registry identifier.
    pub fn node_id(&self) -> NodeId {
        self.base.id()
    }

    /// The parent node, if this node has been added to one.
    pub fn parent(&self) -> Option<NodeId> {
        self.base.parent()
    }

    /// The node's debug name.
    pub fn name(&self) -> String {
        self.base.name()
    }

    /// A handle to the current root element.
    pub fn element(&self) -> Element {
        self.element.clone()
    }

    /// Whether the node has been rendered.
    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    /// Whether unwrap mode is enabled.
    pub fn is_unwrapped(&self) -> bool {
        self.unwrap
    }

    /// The bound model.
    pub fn model(&self) -> Option<&Arc<dyn ModelData>> {
        self.model.as_ref()
    }

    /// Replace the bound model. Takes effect on the next render.
    pub fn set_model(&mut self, model: Option<Arc<dyn ModelData>>) {
        self.model = model;
    }

    /// Replace the template. Takes effect on the next render.
    pub fn set_template(&mut self, template: Option<Template>) {
        self.template = template;
    }

    /// The data the template would receive right now.
    pub fn template_data(&self) -> TemplateData {
        self.data.resolve(self.model.as_deref(), &self.helpers)
    }

    /// Swap in a new root element, moving the event bindings over.
    pub fn set_element(&mut self, element: Element) {
        self.undelegate_events();
        self.element = element;
        self.delegate_events();
    }

    /// Rebind the declarative event handlers on the root element.
    pub fn delegate_events(&mut self) {
        self.undelegate_events();
        for binding in &self.events {
            let handler = binding.handler.clone();
            let bound = self.element.on(binding.event.clone(), binding.selector.as_deref(), move |event| {
                handler(event)
            });
            match bound {
                Some(id) => self.bound.push(id),
                None => tracing::warn!(
                    target: targets::VIEW,
                    event = %binding.event,
                    selector = ?binding.selector,
                    "skipping event binding with unparsable selector"
                ),
            }
        }
    }

    fn undelegate_events(&mut self) {
        for id in self.bound.drain(..) {
            self.element.off(id);
        }
    }

    // =========================================================================
    // Children
    // =========================================================================

    /// Add a child view.
    ///
    /// If this node is already rendered, the child is rendered and attached
    /// straight away. Returns the child, now owned by this node.
    pub fn add_child<V: View>(&mut self, options: AddOptions, child: V) -> &mut dyn View {
        self.add_boxed(options, Box::new(child))
    }

    /// Add an already boxed child view. See [`add_child`](Self::add_child).
    pub fn add_boxed(&mut self, options: AddOptions, child: Box<dyn View>) -> &mut dyn View {
        let index = self.insert_slot(options, child);
        if self.rendered {
            self.render_child_at(index);
        }
        self.children[index].view.as_mut()
    }

    /// Register a child without rendering it, returning its key.
    pub fn insert_child<V: View>(&mut self, options: AddOptions, child: V) -> ChildKey {
        self.insert_boxed(options, Box::new(child))
    }

    /// Register a boxed child without rendering it, returning its key.
    pub fn insert_boxed(&mut self, options: AddOptions, child: Box<dyn View>) -> ChildKey {
        let index = self.insert_slot(options, child);
        self.children
            .get_index(index)
            .map(|(key, _)| key.clone())
            .unwrap_or_else(ChildKey::unique)
    }

    fn insert_slot(&mut self, options: AddOptions, mut child: Box<dyn View>) -> usize {
        let key = match options.key {
            Some(key) => key,
            None => self.fresh_key(),
        };
        if self.children.contains_key(key.as_str()) {
            tracing::debug!(target: targets::VIEW, %key, "replacing existing child");
            self.remove_child(key.as_str());
        }

        if let Err(err) = child.set_parent(Some(self.base.id())) {
            tracing::warn!(target: targets::VIEW, %key, %err, "could not record child parent");
        }
        tracing::trace!(target: targets::VIEW, parent = ?self.base.id(), %key, "added child");

        let slot = ChildSlot {
            insertion_point: options.insertion_point,
            view: child,
        };
        self.children.insert_full(key, slot).0
    }

    /// Move the child under `key` to sit just before the child under
    /// `before`, in both child order and the rendered element tree.
    pub(crate) fn move_child_before(&mut self, key: &str, before: &str) {
        let (Some(from), Some(to)) = (self.children.get_index_of(key), self.children.get_index_of(before)) else {
            return;
        };
        if from == to {
            return;
        }
        let to = if from < to { to - 1 } else { to };
        self.children.move_index(from, to);

        let moved = self.children[to].view.element();
        let anchor = self.children[to + 1].view.element();
        if let Some(parent) = anchor.parent() {
            if moved.parent().is_some_and(|p| p.ptr_eq(&parent)) {
                parent.insert_before(&moved, &anchor);
            }
        }
    }

    fn fresh_key(&self) -> ChildKey {
        loop {
            let key = ChildKey::unique();
            if !self.children.contains_key(key.as_str()) {
                return key;
            }
        }
    }

    /// Look up a child view.
    pub fn child(&self, key: &str) -> Option<&dyn View> {
        self.children.get(key).map(|slot| slot.view.as_ref())
    }

    /// Look up a child view mutably.
    pub fn child_mut(&mut self, key: &str) -> Option<&mut dyn View> {
        match self.children.get_mut(key) {
            Some(slot) => Some(slot.view.as_mut()),
            None => None,
        }
    }

    /// Look up a child and downcast it.
    pub fn child_as<V: View>(&self, key: &str) -> Option<&V> {
        self.child(key).and_then(view_cast::<V>)
    }

    /// Look up a child mutably and downcast it.
    pub fn child_as_mut<V: View>(&mut self, key: &str) -> Option<&mut V> {
        self.child_mut(key).and_then(view_cast_mut::<V>)
    }

    /// Whether a child exists under `key`.
    pub fn has_child(&self, key: &str) -> bool {
        self.children.contains_key(key)
    }

    /// Child keys in insertion order.
    pub fn child_keys(&self) -> Vec<ChildKey> {
        self.children.keys().cloned().collect()
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Where a child attaches, if it exists.
    pub fn insertion_point(&self, key: &str) -> Option<Option<&str>> {
        self.children
            .get(key)
            .map(|slot| slot.insertion_point.as_deref())
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Render the template (if any), then every child, then run the
    /// post-render hook.
    #[tracing::instrument(skip(self), target = "horizon_trellis::view", level = "trace", fields(node = ?self.base.id()))]
    pub fn render(&mut self) -> &mut Self {
        if let Some(template) = self.template.clone() {
            let data = self.template_data();
            let fragment = template.render(&data);
            if self.unwrap {
                self.apply_unwrapped(fragment);
            } else {
                self.element.set_content(fragment);
            }
        }

        self.render_all();

        if let Some(hook) = self.on_render.as_mut() {
            hook(&self.element);
        }

        self.rendered = true;
        self
    }

    fn apply_unwrapped(&mut self, fragment: Fragment) {
        let Some(root) = fragment.single_root().cloned() else {
            tracing::warn!(
                target: targets::VIEW,
                node = ?self.base.id(),
                top_level = fragment.len(),
                "unwrap needs exactly one outermost element, rendering wrapped instead"
            );
            self.element.set_content(fragment);
            return;
        };

        if !self.rendered {
            self.set_element(root);
        } else {
            // Keep the root that is already on screen; refresh what is inside.
            self.element.set_content(Fragment::from(root.take_children()));
            self.element.set_text(root.text());
            self.delegate_events();
        }
    }

    /// Render every child, in insertion order.
    pub fn render_all(&mut self) {
        for index in 0..self.children.len() {
            self.render_child_at(index);
        }
    }

    /// Render one child and append its element at its insertion point.
    ///
    /// Does nothing if there is no child under `key`.
    pub fn render_child(&mut self, key: &str) {
        match self.children.get_index_of(key) {
            Some(index) => self.render_child_at(index),
            None => tracing::trace!(target: targets::VIEW, key, "render_child: no such child"),
        }
    }

    fn render_child_at(&mut self, index: usize) {
        let Some((key, slot)) = self.children.get_index_mut(index) else {
            return;
        };
        slot.view.render();

        let target = match &slot.insertion_point {
            Some(selector) => match self.element.find_first(selector) {
                Some(target) => target,
                None => {
                    tracing::debug!(
                        target: targets::VIEW,
                        %key,
                        selector = selector.as_str(),
                        "insertion point not found, child left detached"
                    );
                    return;
                }
            },
            None => self.element.clone(),
        };
        target.append_child(&slot.view.element());
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Remove one child, tearing it down. Returns `false` if absent.
    pub fn remove_child(&mut self, key: &str) -> bool {
        match self.children.shift_remove(key) {
            Some(mut slot) => {
                slot.view.remove();
                tracing::trace!(target: targets::VIEW, parent = ?self.base.id(), key, "removed child");
                true
            }
            None => false,
        }
    }

    /// Remove every child, in insertion order.
    pub fn remove_all(&mut self) {
        for key in self.child_keys() {
            self.remove_child(key.as_str());
        }
    }

    /// Remove all children, then detach this node's element and unbind its
    /// handlers.
    #[tracing::instrument(skip(self), target = "horizon_trellis::view", level = "trace", fields(node = ?self.base.id()))]
    pub fn remove(&mut self) {
        self.remove_all();
        self.bound.clear();
        self.element.remove();
        if let Err(err) = self.base.set_parent(None) {
            tracing::trace!(target: targets::VIEW, %err, "node already unregistered");
        }
    }
}

impl Default for ViewNode {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ViewNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewNode")
            .field("id", &self.base.id())
            .field("rendered", &self.rendered)
            .field("unwrap", &self.unwrap)
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl View for ViewNode {
    fn node_id(&self) -> NodeId {
        self.base.id()
    }

    fn element(&self) -> Element {
        self.element.clone()
    }

    fn render(&mut self) {
        ViewNode::render(self);
    }

    fn remove(&mut self) {
        ViewNode::remove(self);
    }

    fn is_rendered(&self) -> bool {
        self.rendered
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

// Child views are `Send` but not `Sync`, so neither is the node.
static_assertions::assert_impl_all!(ViewNode: Send);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_root_element() {
        let node = ViewNode::with_options(ViewOptions::new().id("main").class("page").name("page"));
        assert_eq!(node.element().to_markup(), "<div id=\"main\" class=\"page\"></div>");
        assert_eq!(node.name(), "page");
        assert!(!node.is_rendered());
        assert!(node.parent().is_none());
    }

    #[test]
    fn test_existing_element_is_used() {
        let existing = Element::new("section").with_id("app");
        let node = ViewNode::with_options(ViewOptions::new().element(existing.clone()));
        assert!(node.element().ptr_eq(&existing));
        assert_eq!(node.name(), "div");
    }

    #[test]
    fn test_render_without_template_keeps_content() {
        let root = Element::new("div").with_child(Element::new("span"));
        let mut node = ViewNode::with_options(ViewOptions::new().element(root.clone()));
        node.render();
        assert_eq!(root.to_markup(), "<div><span></span></div>");
        assert!(node.is_rendered());
    }

    #[test]
    fn test_set_element_moves_bindings() {
        let mut node = ViewNode::with_options(ViewOptions::new().on("click", None, |_| {}));
        let old = node.element();
        assert_eq!(old.handler_count(), 1);

        let new = Element::new("nav");
        node.set_element(new.clone());
        assert_eq!(old.handler_count(), 0);
        assert_eq!(new.handler_count(), 1);

        node.delegate_events();
        assert_eq!(new.handler_count(), 1);
    }

    #[test]
    fn test_unparsable_binding_is_skipped() {
        let node = ViewNode::with_options(ViewOptions::new().on("click", Some("a > b"), |_| {}));
        assert_eq!(node.element().handler_count(), 0);
    }

    #[test]
    fn test_child_as_mut() {
        let mut node = ViewNode::new();
        node.add_child(AddOptions::new().key("inner"), ViewNode::new());
        let inner = node.child_as_mut::<ViewNode>("inner").unwrap();
        inner.set_template(Some(Template::fixed(|| Element::new("b").into())));
        node.render();
        assert_eq!(node.element().to_markup(), "<div><div><b></b></div></div>");
        assert_eq!(node.insertion_point("inner"), Some(None));
    }

    #[test]
    fn test_generated_key_skips_caller_keys() {
        let next: u64 = ChildKey::unique().as_str()["view".len()..].parse().unwrap();
        let mut node = ViewNode::new();
        for n in next + 1..next + 257 {
            node.insert_child(AddOptions::new().key(format!("view{n}")), ViewNode::new());
        }

        let generated = node.insert_child(AddOptions::new(), ViewNode::new());
        assert_eq!(node.child_count(), 257);
        for n in next + 1..next + 257 {
            assert!(node.has_child(&format!("view{n}")));
        }
        assert!(node.has_child(generated.as_str()));
    }

    #[test]
    fn test_move_child_before_reorders_elements() {
        let mut node = ViewNode::new();
        for key in ["a", "b", "c"] {
            let tag = key.to_string();
            node.insert_child(
                AddOptions::new().key(key),
                ViewNode::with_options(ViewOptions::new().tag(tag)),
            );
        }
        node.render();

        node.move_child_before("c", "b");
        let keys: Vec<String> = node.child_keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["a", "c", "b"]);
        assert_eq!(node.element().to_markup(), "<div><a></a><c></c><b></b></div>");

        node.move_child_before("a", "b");
        assert_eq!(node.element().to_markup(), "<div><c></c><a></a><b></b></div>");
    }
}
