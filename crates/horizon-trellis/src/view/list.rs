//! Collection-backed list views.
//!
//! A [`ListNode`] keeps one child view per item of a [`Collection`], keyed
//! by the item's [`ItemId`], and drives two optional overlays: a *fallback*
//! shown while the collection is empty and idle, and a *loading* indicator
//! shown while a fetch is in flight.
//!
//! Overlays come in two forms. By default they are selector toggles: the
//! elements matching `fallback_selector` / `loading_selector` inside the
//! rendered template are shown or hidden. Alternatively a factory can be
//! supplied, in which case the overlay is a full child view stored under the
//! reserved key `"fallback"` or `"loading"`.
//!
//! Collection slots hold a weak reference to the list's state, so dropping
//! the `ListNode` is enough to stop reacting to the collection.
//!
//! Collection mutations must not be made from inside
//! [`ListNode::with_view`] / [`ListNode::with_view_mut`] closures or item
//! render hooks: the list's state lock is held there.

use std::fmt;
use std::sync::Arc;

use horizon_trellis_core::logging::targets;
use horizon_trellis_core::{ConnectionId, NodeId, PerfSpan};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::{AddOptions, ChildKey, View, ViewNode, ViewOptions};
use crate::dom::{Element, Selector};
use crate::model::{Collection, ItemId, Record};

/// Produces the view for one item.
pub type ItemFactory<T> = Arc<dyn Fn(ItemContext<T>) -> Box<dyn View> + Send + Sync>;

/// Produces an overlay view.
pub type OverlayFactory = Arc<dyn Fn() -> Box<dyn View> + Send + Sync>;

/// What an item factory is given.
pub struct ItemContext<T> {
    /// The item's identity, also its child key.
    pub id: ItemId,
    /// The item.
    pub model: Arc<T>,
    /// The list's node.
    pub parent: NodeId,
}

impl<T> Clone for ItemContext<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            model: self.model.clone(),
            parent: self.parent,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ItemContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemContext")
            .field("id", &self.id)
            .field("model", &self.model)
            .field("parent", &self.parent)
            .finish()
    }
}

/// Errors raised while building a [`ListNode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListError {
    /// No collection was supplied.
    #[error("A list view requires a collection")]
    MissingDataSource,
    /// No item factory was supplied.
    #[error("A list view requires an item view factory")]
    MissingItemFactory,
}

/// Selector and rendering configuration for a [`ListNode`].
///
/// Deserializable, so lists can be configured from JSON:
///
/// ```
/// use horizon_trellis::view::ListOptions;
///
/// let options: ListOptions =
///     serde_json::from_str(r#"{ "list_selector": "ul.items" }"#).unwrap();
/// assert_eq!(options.list_selector.as_deref(), Some("ul.items"));
/// assert!(options.eager_child_render);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListOptions {
    /// Where item views attach; the list's root when `None`.
    pub list_selector: Option<String>,
    /// Elements shown while the collection is empty and idle.
    pub fallback_selector: Option<String>,
    /// Elements shown while a fetch is in flight.
    pub loading_selector: Option<String>,
    /// Render item views as soon as they are added to a rendered list,
    /// rather than waiting for the next full render.
    pub eager_child_render: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            list_selector: None,
            fallback_selector: None,
            loading_selector: None,
            eager_child_render: true,
        }
    }
}

impl ListOptions {
    /// Check that every configured selector parses.
    pub fn validate(&self) -> crate::Result<()> {
        for selector in [
            &self.list_selector,
            &self.fallback_selector,
            &self.loading_selector,
        ]
        .into_iter()
        .flatten()
        {
            Selector::parse(selector)?;
        }
        Ok(())
    }
}

enum Overlay {
    Toggle(String),
    Subview {
        key: &'static str,
        insertion_point: Option<String>,
        factory: OverlayFactory,
    },
}

impl Overlay {
    fn configure(
        key: &'static str,
        selector: Option<String>,
        factory: Option<OverlayFactory>,
    ) -> Option<Self> {
        match (factory, selector) {
            (Some(factory), insertion_point) => Some(Self::Subview {
                key,
                insertion_point,
                factory,
            }),
            (None, Some(selector)) => Some(Self::Toggle(selector)),
            (None, None) => None,
        }
    }

    fn show(&self, view: &mut ViewNode) {
        match self {
            Self::Toggle(selector) => {
                for element in view.element().find_all(selector) {
                    element.show();
                }
            }
            Self::Subview {
                key,
                insertion_point,
                factory,
            } => {
                if view.has_child(key) {
                    return;
                }
                let options = AddOptions {
                    insertion_point: insertion_point.clone(),
                    key: Some(ChildKey::from(*key)),
                };
                view.add_boxed(options, factory());
            }
        }
    }

    fn hide(&self, view: &mut ViewNode) {
        match self {
            Self::Toggle(selector) => {
                for element in view.element().find_all(selector) {
                    element.hide();
                }
            }
            Self::Subview { key, .. } => {
                view.remove_child(key);
            }
        }
    }

    fn is_shown(&self, view: &ViewNode) -> bool {
        match self {
            Self::Toggle(selector) => {
                let matched = view.element().find_all(selector);
                !matched.is_empty() && matched.iter().all(Element::is_visible)
            }
            Self::Subview { key, .. } => view.has_child(key),
        }
    }
}

struct ListState<T> {
    view: ViewNode,
    collection: Arc<Collection<T>>,
    factory: ItemFactory<T>,
    options: ListOptions,
    fallback: Option<Overlay>,
    loading: Option<Overlay>,
    is_loading: bool,
}

impl<T: Send + Sync + 'static> ListState<T> {
    fn materialize(&mut self, record: Record<T>) -> ChildKey {
        let context = ItemContext {
            id: record.id,
            model: record.item,
            parent: self.view.node_id(),
        };
        let child = (self.factory)(context);
        let options = AddOptions {
            insertion_point: self.options.list_selector.clone(),
            key: Some(ChildKey::from(record.id)),
        };
        self.view.insert_boxed(options, child)
    }

    fn add_item(&mut self, record: Record<T>) {
        let id = record.id;
        let key = self.materialize(record);
        tracing::trace!(target: targets::LIST, item = %id, "item view added");
        if self.view.is_rendered() && self.options.eager_child_render {
            self.view.render_child(key.as_str());
        }
        self.place_in_order(id, &key);
        if self.view.is_rendered() {
            self.sync_fallback();
        }
    }

    /// Keep the item's view ahead of the next item the collection holds.
    fn place_in_order(&mut self, id: ItemId, key: &ChildKey) {
        let ids = self.collection.ids();
        let Some(position) = ids.iter().position(|other| *other == id) else {
            return;
        };
        let next = ids[position + 1..]
            .iter()
            .map(|next| ChildKey::from(*next))
            .find(|next| self.view.has_child(next.as_str()));
        if let Some(next) = next {
            self.view.move_child_before(key.as_str(), next.as_str());
        }
    }

    fn remove_item(&mut self, id: ItemId) {
        let removed = self.view.remove_child(&id.to_string());
        tracing::trace!(target: targets::LIST, item = %id, removed, "item view removed");
        if removed && self.view.is_rendered() {
            self.sync_fallback();
        }
    }

    fn reset_items(&mut self) {
        let _perf = PerfSpan::new("list_reset");
        for key in self.item_keys() {
            self.view.remove_child(key.as_str());
        }

        let keys: Vec<ChildKey> = self
            .collection
            .records()
            .into_iter()
            .map(|record| self.materialize(record))
            .collect();
        tracing::debug!(target: targets::LIST, count = keys.len(), "item views reset");

        if self.view.is_rendered() {
            if self.options.eager_child_render {
                for key in &keys {
                    self.view.render_child(key.as_str());
                }
            }
            self.sync_fallback();
        }
    }

    fn item_keys(&self) -> Vec<ChildKey> {
        self.view
            .child_keys()
            .into_iter()
            .filter(|key| !key.is_overlay())
            .collect()
    }

    fn fetch_started(&mut self) {
        self.is_loading = true;
        self.show_loading();
        self.hide_fallback();
    }

    fn fetch_completed(&mut self) {
        self.is_loading = false;
        self.hide_loading();
        self.toggle_fallback();
    }

    fn render(&mut self) {
        self.view.render();
        self.sync_overlays();
    }

    fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
        if self.view.is_rendered() {
            self.sync_overlays();
        }
    }

    fn sync_overlays(&mut self) {
        if self.is_loading {
            self.show_loading();
            self.hide_fallback();
        } else {
            self.hide_loading();
            self.toggle_fallback();
        }
    }

    fn sync_fallback(&mut self) {
        if self.is_loading {
            self.hide_fallback();
        } else {
            self.toggle_fallback();
        }
    }

    fn toggle_fallback(&mut self) {
        if self.collection.is_empty() {
            self.show_fallback();
        } else {
            self.hide_fallback();
        }
    }

    fn show_fallback(&mut self) {
        if let Some(overlay) = &self.fallback {
            overlay.show(&mut self.view);
        }
    }

    fn hide_fallback(&mut self) {
        if let Some(overlay) = &self.fallback {
            overlay.hide(&mut self.view);
        }
    }

    fn show_loading(&mut self) {
        if let Some(overlay) = &self.loading {
            overlay.show(&mut self.view);
        }
    }

    fn hide_loading(&mut self) {
        if let Some(overlay) = &self.loading {
            overlay.hide(&mut self.view);
        }
    }
}

/// Wrap a state action as a collection slot holding only a weak reference.
fn forward<T, A, F>(state: &Arc<Mutex<ListState<T>>>, action: F) -> impl Fn(&A) + Send + Sync + 'static
where
    T: Send + Sync + 'static,
    A: 'static,
    F: Fn(&mut ListState<T>, &A) + Send + Sync + 'static,
{
    let weak = Arc::downgrade(state);
    move |args: &A| {
        if let Some(state) = weak.upgrade() {
            let mut guard = state.lock();
            action(&mut *guard, args);
        }
    }
}

struct Subscriptions {
    added: ConnectionId,
    removed: ConnectionId,
    reset: ConnectionId,
    fetch_started: ConnectionId,
    fetch_completed: ConnectionId,
}

impl Subscriptions {
    fn connect<T: Send + Sync + 'static>(
        collection: &Collection<T>,
        state: &Arc<Mutex<ListState<T>>>,
    ) -> Self {
        let signals = collection.signals();
        Self {
            added: signals.item_added.connect(forward(state, |list, record: &Record<T>| {
                list.add_item(record.clone())
            })),
            removed: signals.item_removed.connect(forward(state, |list, record: &Record<T>| {
                list.remove_item(record.id)
            })),
            reset: signals
                .reset
                .connect(forward(state, |list, _: &()| list.reset_items())),
            fetch_started: signals
                .fetch_started
                .connect(forward(state, |list, _: &()| list.fetch_started())),
            fetch_completed: signals
                .fetch_completed
                .connect(forward(state, |list, _: &()| list.fetch_completed())),
        }
    }

    fn disconnect<T: Send + Sync + 'static>(self, collection: &Collection<T>) {
        let signals = collection.signals();
        signals.item_added.disconnect(self.added);
        signals.item_removed.disconnect(self.removed);
        signals.reset.disconnect(self.reset);
        signals.fetch_started.disconnect(self.fetch_started);
        signals.fetch_completed.disconnect(self.fetch_completed);
    }
}

/// Builder for [`ListNode`].
pub struct ListNodeBuilder<T> {
    collection: Option<Arc<Collection<T>>>,
    factory: Option<ItemFactory<T>>,
    options: ListOptions,
    view: ViewOptions,
    fallback_view: Option<OverlayFactory>,
    loading_view: Option<OverlayFactory>,
}

impl<T: Send + Sync + 'static> ListNodeBuilder<T> {
    fn new() -> Self {
        Self {
            collection: None,
            factory: None,
            options: ListOptions::default(),
            view: ViewOptions::new(),
            fallback_view: None,
            loading_view: None,
        }
    }

    /// The collection to mirror. Required.
    pub fn collection(mut self, collection: Arc<Collection<T>>) -> Self {
        self.collection = Some(collection);
        self
    }

    /// The view to build for each item. Required (or use
    /// [`item_factory`](Self::item_factory)).
    pub fn item_view<F, V>(mut self, build: F) -> Self
    where
        F: Fn(ItemContext<T>) -> V + Send + Sync + 'static,
        V: View,
    {
        self.factory = Some(Arc::new(move |context| Box::new(build(context)) as Box<dyn View>));
        self
    }

    /// A pre-boxed item factory.
    pub fn item_factory(mut self, factory: ItemFactory<T>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Replace all list options.
    pub fn options(mut self, options: ListOptions) -> Self {
        self.options = options;
        self
    }

    /// Where item views attach.
    pub fn list_selector(mut self, selector: impl Into<String>) -> Self {
        self.options.list_selector = Some(selector.into());
        self
    }

    /// Elements toggled as the empty-collection fallback.
    pub fn fallback_selector(mut self, selector: impl Into<String>) -> Self {
        self.options.fallback_selector = Some(selector.into());
        self
    }

    /// Elements toggled as the loading indicator.
    pub fn loading_selector(mut self, selector: impl Into<String>) -> Self {
        self.options.loading_selector = Some(selector.into());
        self
    }

    /// Whether items added to a rendered list render immediately.
    pub fn eager_child_render(mut self, eager: bool) -> Self {
        self.options.eager_child_render = eager;
        self
    }

    /// Options for the list's own view. The tag defaults to `ul`.
    pub fn view(mut self, options: ViewOptions) -> Self {
        self.view = options;
        self
    }

    /// Show the fallback as a child view, attached at `fallback_selector`
    /// if one is set.
    pub fn fallback_view<F, V>(mut self, build: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: View,
    {
        self.fallback_view = Some(Arc::new(move || Box::new(build()) as Box<dyn View>));
        self
    }

    /// Show the loading indicator as a child view, attached at
    /// `loading_selector` if one is set.
    pub fn loading_view<F, V>(mut self, build: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: View,
    {
        self.loading_view = Some(Arc::new(move || Box::new(build()) as Box<dyn View>));
        self
    }

    /// Build the list and materialize a view for every current item.
    pub fn build(self) -> Result<ListNode<T>, ListError> {
        let collection = self.collection.ok_or(ListError::MissingDataSource)?;
        let factory = self.factory.ok_or(ListError::MissingItemFactory)?;

        let view = ViewNode::with_options_as::<ListNode<T>>(self.view.or_tag("ul"));
        let node_id = view.node_id();

        let fallback = Overlay::configure(
            ChildKey::FALLBACK,
            self.options.fallback_selector.clone(),
            self.fallback_view,
        );
        let loading = Overlay::configure(
            ChildKey::LOADING,
            self.options.loading_selector.clone(),
            self.loading_view,
        );

        let state = Arc::new(Mutex::new(ListState {
            view,
            collection: collection.clone(),
            factory,
            options: self.options,
            fallback,
            loading,
            is_loading: collection.is_fetching(),
        }));

        let subscriptions = Subscriptions::connect(&collection, &state);
        state.lock().reset_items();

        tracing::debug!(target: targets::LIST, node = ?node_id, items = collection.len(), "list view built");

        Ok(ListNode {
            node_id,
            state,
            collection,
            subscriptions: Some(subscriptions),
        })
    }
}

/// A view mirroring a [`Collection`], one child view per item.
///
/// # Example
///
/// ```
/// use horizon_trellis::dom::Element;
/// use horizon_trellis::model::Collection;
/// use horizon_trellis::template::Template;
/// use horizon_trellis::view::{ListNode, ViewNode, ViewOptions};
///
/// let tasks = Collection::shared(vec!["write docs".to_string()]);
///
/// let mut list = ListNode::builder()
///     .collection(tasks.clone())
///     .item_view(|item| {
///         ViewNode::with_options(ViewOptions::new().tag("li").template(Template::fixed(move || {
///             Element::text_node(item.model.as_str()).into()
///         })))
///     })
///     .build()
///     .unwrap();
///
/// list.render();
/// tasks.push("ship it".to_string());
///
/// assert_eq!(
///     list.element().to_markup(),
///     "<ul><li>write docs</li><li>ship it</li></ul>"
/// );
/// ```
pub struct ListNode<T: Send + Sync + 'static> {
    node_id: NodeId,
    state: Arc<Mutex<ListState<T>>>,
    collection: Arc<Collection<T>>,
    subscriptions: Option<Subscriptions>,
}

impl<T: Send + Sync + 'static> ListNode<T> {
    /// Start building a list.
    pub fn builder() -> ListNodeBuilder<T> {
        ListNodeBuilder::new()
    }

    /// The mirrored collection.
    pub fn collection(&self) -> &Arc<Collection<T>> {
        &self.collection
    }

    /// The list's options.
    pub fn options(&self) -> ListOptions {
        self.state.lock().options.clone()
    }

    /// A handle to the list's root element.
    pub fn element(&self) -> Element {
        self.state.lock().view.element()
    }

    /// Whether the list has been rendered.
    pub fn is_rendered(&self) -> bool {
        self.state.lock().view.is_rendered()
    }

    /// Whether a fetch is in flight, as far as this list knows.
    pub fn is_loading(&self) -> bool {
        self.state.lock().is_loading
    }

    /// Set the loading flag. Once rendered, overlays follow immediately;
    /// before that they follow on the first render.
    pub fn set_loading(&self, loading: bool) {
        self.state.lock().set_loading(loading);
    }

    /// Render the list's template, every item view, then sync overlays.
    #[tracing::instrument(skip(self), target = "horizon_trellis::list", level = "trace", fields(node = ?self.node_id))]
    pub fn render(&mut self) -> &mut Self {
        self.state.lock().render();
        self
    }

    /// Materialize a view for `record`.
    pub fn add_item(&self, record: Record<T>) {
        self.state.lock().add_item(record);
    }

    /// Remove the view for `id`. Does nothing if there is none.
    pub fn remove_item(&self, id: ItemId) {
        self.state.lock().remove_item(id);
    }

    /// Rebuild every item view from the collection's current contents.
    pub fn reset_items(&self) {
        self.state.lock().reset_items();
    }

    /// Show the fallback overlay.
    pub fn show_fallback(&self) {
        self.state.lock().show_fallback();
    }

    /// Hide the fallback overlay.
    pub fn hide_fallback(&self) {
        self.state.lock().hide_fallback();
    }

    /// Show the fallback if the collection is empty, hide it otherwise.
    pub fn toggle_fallback(&self) {
        self.state.lock().toggle_fallback();
    }

    /// Show the loading overlay.
    pub fn show_loading(&self) {
        self.state.lock().show_loading();
    }

    /// Hide the loading overlay.
    pub fn hide_loading(&self) {
        self.state.lock().hide_loading();
    }

    /// Whether the fallback overlay is currently shown.
    pub fn is_fallback_visible(&self) -> bool {
        let state = self.state.lock();
        state
            .fallback
            .as_ref()
            .is_some_and(|overlay| overlay.is_shown(&state.view))
    }

    /// Whether the loading overlay is currently shown.
    pub fn is_loading_visible(&self) -> bool {
        let state = self.state.lock();
        state
            .loading
            .as_ref()
            .is_some_and(|overlay| overlay.is_shown(&state.view))
    }

    /// Keys of the item views, in insertion order.
    pub fn item_keys(&self) -> Vec<ChildKey> {
        self.state.lock().item_keys()
    }

    /// Number of item views.
    pub fn item_count(&self) -> usize {
        self.state.lock().item_keys().len()
    }

    /// Whether an item view exists for `id`.
    pub fn has_item(&self, id: ItemId) -> bool {
        self.state.lock().view.has_child(&id.to_string())
    }

    /// Run `f` with the list's underlying view.
    pub fn with_view<R>(&self, f: impl FnOnce(&ViewNode) -> R) -> R {
        f(&self.state.lock().view)
    }

    /// Run `f` with the list's underlying view, mutably.
    pub fn with_view_mut<R>(&self, f: impl FnOnce(&mut ViewNode) -> R) -> R {
        f(&mut self.state.lock().view)
    }

    /// Stop reacting to the collection.
    pub fn stop_listening(&mut self) {
        if let Some(subscriptions) = self.subscriptions.take() {
            subscriptions.disconnect(&self.collection);
            tracing::trace!(target: targets::LIST, node = ?self.node_id, "collection subscriptions dropped");
        }
    }

    /// Stop listening, then tear down every child and the list's element.
    #[tracing::instrument(skip(self), target = "horizon_trellis::list", level = "trace", fields(node = ?self.node_id))]
    pub fn remove(&mut self) {
        self.stop_listening();
        self.state.lock().view.remove();
    }
}

impl<T: Send + Sync + 'static> Drop for ListNode<T> {
    fn drop(&mut self) {
        self.stop_listening();
    }
}

impl<T: Send + Sync + 'static> fmt::Debug for ListNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListNode")
            .field("node_id", &self.node_id)
            .field("items", &self.item_count())
            .field("listening", &self.subscriptions.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: Send + Sync + 'static> View for ListNode<T> {
    fn node_id(&self) -> NodeId {
        self.node_id
    }

    fn element(&self) -> Element {
        ListNode::element(self)
    }

    fn render(&mut self) {
        ListNode::render(self);
    }

    fn remove(&mut self) {
        ListNode::remove(self);
    }

    fn is_rendered(&self) -> bool {
        ListNode::is_rendered(self)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

// Ensure ListNode is Send + Sync
static_assertions::assert_impl_all!(ListNode<String>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Template;

    fn item_view(context: ItemContext<String>) -> ViewNode {
        let text = context.model.to_string();
        ViewNode::with_options(
            ViewOptions::new()
                .tag("li")
                .template(Template::fixed(move || Element::text_node(text.clone()).into())),
        )
    }

    fn shell() -> Template {
        Template::fixed(|| {
            vec![
                Element::new("ul").with_class("items"),
                Element::new("p").with_class("empty"),
                Element::new("p").with_class("spinner"),
            ]
            .into()
        })
    }

    fn list(collection: &Arc<Collection<String>>) -> ListNode<String> {
        ListNode::builder()
            .collection(collection.clone())
            .item_view(item_view)
            .view(ViewOptions::new().tag("div").template(shell()))
            .list_selector(".items")
            .fallback_selector(".empty")
            .loading_selector(".spinner")
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_requires_collection_and_factory() {
        let missing_collection = ListNode::<String>::builder().item_view(item_view).build();
        assert_eq!(missing_collection.err(), Some(ListError::MissingDataSource));

        let missing_factory = ListNode::<String>::builder()
            .collection(Collection::shared(Vec::new()))
            .build();
        assert_eq!(missing_factory.err(), Some(ListError::MissingItemFactory));
    }

    #[test]
    fn test_default_tag_is_ul() {
        let list = ListNode::builder()
            .collection(Collection::<String>::shared(Vec::new()))
            .item_view(item_view)
            .build()
            .unwrap();
        assert_eq!(list.element().tag(), "ul");
    }

    #[test]
    fn test_existing_items_materialized_on_build() {
        let collection = Collection::shared(vec!["a".to_string(), "b".to_string()]);
        let list = list(&collection);

        assert_eq!(list.item_count(), 2);
        for id in collection.ids() {
            assert!(list.has_item(id));
        }
        assert!(!list.is_rendered());
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: ListOptions = serde_json::from_str(r#"{"fallback_selector": ".empty"}"#).unwrap();
        assert_eq!(options.fallback_selector.as_deref(), Some(".empty"));
        assert!(options.list_selector.is_none());
        assert!(options.eager_child_render);
    }

    #[test]
    fn test_options_validate() {
        let mut options = ListOptions::default();
        options.list_selector = Some("ul.items".into());
        assert!(options.validate().is_ok());

        options.loading_selector = Some("ul > li".into());
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_fetch_scenario() {
        let collection = Collection::shared(Vec::new());
        let mut list = list(&collection);

        assert!(!list.is_loading());
        list.render();
        assert!(list.is_fallback_visible());
        assert!(!list.is_loading_visible());

        collection.begin_fetch();
        assert!(list.is_loading());
        assert!(list.is_loading_visible());
        assert!(!list.is_fallback_visible());

        collection.push("one".into());
        collection.push("two".into());
        assert!(!list.is_fallback_visible());

        collection.finish_fetch();
        assert!(!list.is_loading_visible());
        assert!(!list.is_fallback_visible());
        assert_eq!(list.item_count(), 2);
    }

    #[test]
    fn test_drop_disconnects() {
        let collection = Collection::<String>::shared(Vec::new());
        let list = list(&collection);
        assert_eq!(collection.signals().item_added.connection_count(), 1);

        drop(list);
        assert_eq!(collection.signals().item_added.connection_count(), 0);
        assert_eq!(collection.signals().fetch_completed.connection_count(), 0);
    }
}
