//! Integration tests for collection-backed list views.

use std::sync::Arc;

use horizon_trellis::dom::Element;
use horizon_trellis::model::{Collection, FetchMode, ItemId};
use horizon_trellis::template::Template;
use horizon_trellis::view::{AddOptions, ItemContext, ListNode, ListOptions, View, ViewNode, ViewOptions};
use horizon_trellis::{NodeId, global_registry};
use parking_lot::Mutex;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn item_view(item: ItemContext<String>) -> ViewNode {
    let title = item.model.to_string();
    ViewNode::with_options(
        ViewOptions::new()
            .tag("li")
            .template(Template::fixed(move || Element::text_node(title.clone()).into())),
    )
}

fn shell() -> ViewOptions {
    ViewOptions::new().tag("div").template(Template::fixed(|| {
        vec![
            Element::new("ul").with_class("items"),
            Element::new("p").with_class("empty"),
            Element::new("p").with_class("loading"),
        ]
        .into()
    }))
}

fn list_for(collection: &Arc<Collection<String>>) -> ListNode<String> {
    ListNode::builder()
        .collection(collection.clone())
        .item_view(item_view)
        .view(shell())
        .options(ListOptions {
            list_selector: Some(".items".into()),
            fallback_selector: Some(".empty".into()),
            loading_selector: Some(".loading".into()),
            ..ListOptions::default()
        })
        .build()
        .unwrap()
}

fn items_markup(list: &ListNode<String>) -> String {
    list.element()
        .find_first(".items")
        .map(|ul| ul.to_markup())
        .unwrap_or_default()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn assert_overlays(list: &ListNode<String>) {
    let empty = list.collection().is_empty();
    assert_eq!(list.is_fallback_visible(), empty && !list.is_loading());
    assert_eq!(list.is_loading_visible(), list.is_loading());
}

#[test]
fn test_items_before_first_render_attach_in_order() {
    init_tracing();
    let collection = Collection::shared(strings(&["a", "b", "c"]));
    let mut list = list_for(&collection);
    assert_eq!(list.item_count(), 3);

    list.render();
    assert_eq!(items_markup(&list), "<ul class=\"items\"><li>a</li><li>b</li><li>c</li></ul>");

    let keys: Vec<String> = list.item_keys().iter().map(|k| k.to_string()).collect();
    let ids: Vec<String> = collection.ids().iter().map(ItemId::to_string).collect();
    assert_eq!(keys, ids);
}

#[test]
fn test_reset_leaves_no_stale_children() {
    let collection = Collection::shared(strings(&["a", "b", "c"]));
    let mut list = list_for(&collection);
    list.render();

    collection.reset(strings(&["x", "y"]));
    assert_eq!(list.item_count(), 2);
    assert_eq!(items_markup(&list), "<ul class=\"items\"><li>x</li><li>y</li></ul>");
    for id in collection.ids() {
        assert!(list.has_item(id));
    }
}

#[test]
fn test_remove_resolves_by_identity() {
    let collection = Collection::shared(strings(&["a", "b", "c"]));
    let mut list = list_for(&collection);
    list.render();

    let ids = collection.ids();
    collection.remove(ids[1]);

    assert!(!list.has_item(ids[1]));
    assert_eq!(list.item_count(), 2);
    assert_eq!(items_markup(&list), "<ul class=\"items\"><li>a</li><li>c</li></ul>");

    // A record the list never saw is ignored.
    list.remove_item(ItemId::next());
    assert_eq!(list.item_count(), 2);
}

#[test]
fn test_push_after_render_attaches_immediately() {
    let collection = Collection::shared(strings(&["a"]));
    let mut list = list_for(&collection);
    list.render();

    collection.push("b".into());
    assert_eq!(items_markup(&list), "<ul class=\"items\"><li>a</li><li>b</li></ul>");
}

#[test]
fn test_deferred_child_render() {
    let collection = Collection::<String>::shared(Vec::new());
    let mut list = ListNode::builder()
        .collection(collection.clone())
        .item_view(item_view)
        .eager_child_render(false)
        .build()
        .unwrap();
    list.render();

    let id = collection.push("late".into());
    assert!(list.has_item(id));
    assert_eq!(list.element().to_markup(), "<ul></ul>");

    list.render();
    assert_eq!(list.element().to_markup(), "<ul><li>late</li></ul>");
}

#[test]
fn test_fetch_scenario() {
    init_tracing();
    let collection = Collection::<String>::shared(Vec::new());
    let mut list = list_for(&collection);
    assert!(!list.is_loading());

    list.render();
    assert!(list.is_fallback_visible());
    assert!(!list.is_loading_visible());

    collection.begin_fetch();
    assert!(list.is_loading_visible());
    assert!(!list.is_fallback_visible());

    collection.push("one".into());
    collection.push("two".into());
    collection.finish_fetch();

    assert!(!list.is_loading_visible());
    assert!(!list.is_fallback_visible());
    assert_eq!(list.item_count(), 2);
}

#[test]
fn test_fallback_follows_emptiness_and_loading() {
    let collection = Collection::<String>::shared(Vec::new());
    let mut list = list_for(&collection);
    list.render();
    assert_overlays(&list);

    let id = collection.push("a".into());
    assert_overlays(&list);

    collection.remove(id);
    assert_overlays(&list);
    assert!(list.is_fallback_visible());

    collection.begin_fetch();
    assert_overlays(&list);

    collection.reset(Vec::new());
    assert_overlays(&list);

    collection.push("b".into());
    collection.clear();
    assert_overlays(&list);

    collection.finish_fetch();
    assert_overlays(&list);
    assert!(list.is_fallback_visible());

    list.render();
    assert_overlays(&list);
}

#[test]
fn test_fetch_with_drives_overlays() {
    let collection = Collection::<String>::shared(Vec::new());
    let mut list = list_for(&collection);
    list.render();

    let mut during = None;
    let loaded = collection.fetch_with(FetchMode::Reset, || {
        during = Some((list.is_loading_visible(), list.is_fallback_visible()));
        Ok::<_, String>(strings(&["a", "b"]))
    });

    assert_eq!(loaded, Ok(2));
    assert_eq!(during, Some((true, false)));
    assert!(!list.is_loading());
    assert_overlays(&list);
    assert_eq!(list.item_count(), 2);

    let failed = collection.fetch_with(FetchMode::Append, || Err::<Vec<String>, _>("offline".to_string()));
    assert!(failed.is_err());
    assert!(!list.is_loading_visible());
    assert_eq!(list.item_count(), 2);
}

#[test]
fn test_set_loading_before_render() {
    let collection = Collection::<String>::shared(Vec::new());
    let mut list = list_for(&collection);
    list.set_loading(true);

    list.render();
    assert!(list.is_loading_visible());
    assert!(!list.is_fallback_visible());

    collection.finish_fetch();
    assert!(!list.is_loading_visible());
    assert!(list.is_fallback_visible());
}

#[test]
fn test_set_loading_after_render_syncs_overlays() {
    let collection = Collection::<String>::shared(Vec::new());
    let mut list = list_for(&collection);
    list.render();
    assert!(list.is_fallback_visible());

    list.set_loading(true);
    assert!(list.is_loading_visible());
    assert!(!list.is_fallback_visible());
    assert_overlays(&list);

    list.set_loading(false);
    assert!(!list.is_loading_visible());
    assert!(list.is_fallback_visible());
    assert_overlays(&list);
}

#[test]
fn test_insert_keeps_collection_order() {
    let collection = Collection::shared(strings(&["a", "b"]));
    let mut list = list_for(&collection);
    collection.insert(0, "first".to_string());
    list.render();
    assert_eq!(
        items_markup(&list),
        "<ul class=\"items\"><li>first</li><li>a</li><li>b</li></ul>"
    );

    collection.insert(2, "middle".to_string());
    assert_eq!(
        items_markup(&list),
        "<ul class=\"items\"><li>first</li><li>a</li><li>middle</li><li>b</li></ul>"
    );

    let keys: Vec<String> = list.item_keys().iter().map(|k| k.to_string()).collect();
    let ids: Vec<String> = collection.ids().iter().map(ItemId::to_string).collect();
    assert_eq!(keys, ids);
}

#[test]
fn test_list_built_during_fetch_starts_loading() {
    let collection = Collection::<String>::shared(Vec::new());
    collection.begin_fetch();

    let mut list = list_for(&collection);
    assert!(list.is_loading());
    list.render();
    assert_overlays(&list);
}

#[test]
fn test_overlays_without_configuration_are_noops() {
    let collection = Collection::<String>::shared(Vec::new());
    let mut list = ListNode::builder()
        .collection(collection.clone())
        .item_view(item_view)
        .build()
        .unwrap();
    list.render();

    list.show_fallback();
    list.show_loading();
    list.hide_loading();
    collection.begin_fetch();
    collection.finish_fetch();

    assert!(!list.is_fallback_visible());
    assert!(!list.is_loading_visible());
    assert_eq!(list.element().to_markup(), "<ul></ul>");
}

#[test]
fn test_subview_overlays_are_idempotent() {
    let collection = Collection::<String>::shared(Vec::new());
    let created = Arc::new(Mutex::new(0));
    let recv = created.clone();

    let mut list = ListNode::builder()
        .collection(collection.clone())
        .item_view(item_view)
        .fallback_view(move || {
            *recv.lock() += 1;
            ViewNode::with_options(ViewOptions::new().tag("li").class("empty"))
        })
        .loading_view(|| ViewNode::with_options(ViewOptions::new().tag("li").class("spinner")))
        .build()
        .unwrap();

    list.render();
    list.show_fallback();
    list.show_fallback();

    assert!(list.is_fallback_visible());
    assert_eq!(*created.lock(), 1);
    assert_eq!(list.element().find_all(".empty").len(), 1);
    assert_eq!(list.item_count(), 0);

    collection.begin_fetch();
    assert!(list.is_loading_visible());
    assert!(list.element().find_first(".empty").is_none());
    collection.finish_fetch();
    assert!(list.element().find_first(".spinner").is_none());

    collection.push("a".into());
    assert!(!list.is_fallback_visible());

    // Overlay children survive a reset; item children do not.
    collection.clear();
    assert!(list.is_fallback_visible());
    assert_eq!(list.item_count(), 0);
    assert_eq!(list.element().to_markup(), "<ul><li class=\"empty\"></li></ul>");
}

#[test]
fn test_item_factory_context() {
    let seen = Arc::new(Mutex::new(Vec::<(ItemId, NodeId, String)>::new()));
    let recv = seen.clone();
    let collection = Collection::<String>::shared(Vec::new());

    let list = ListNode::builder()
        .collection(collection.clone())
        .item_view(move |item: ItemContext<String>| {
            recv.lock().push((item.id, item.parent, item.model.to_string()));
            item_view(item)
        })
        .build()
        .unwrap();

    let id = collection.push("task".into());
    assert_eq!(*seen.lock(), vec![(id, list.node_id(), "task".to_string())]);
}

#[test]
fn test_remove_stops_listening() {
    let collection = Collection::shared(strings(&["a"]));
    let mut list = list_for(&collection);
    list.render();
    let root = list.element();

    list.remove();
    assert_eq!(collection.signals().item_added.connection_count(), 0);
    assert_eq!(collection.signals().reset.connection_count(), 0);
    assert_eq!(list.item_count(), 0);
    assert_eq!(root.handler_count(), 0);

    collection.push("b".into());
    assert_eq!(list.item_count(), 0);
}

#[test]
fn test_list_nested_in_a_view_tree() {
    let collection = Collection::<String>::shared(Vec::new());
    let list = ListNode::builder()
        .collection(collection.clone())
        .item_view(item_view)
        .build()
        .unwrap();
    let list_id = list.node_id();

    let mut page = ViewNode::with_options(ViewOptions::new().template(Template::fixed(|| {
        Element::new("section").with_class("content").into()
    })));
    page.add_child(AddOptions::at(".content").key("tasks"), list);
    page.render();

    collection.push("a".into());
    assert_eq!(
        page.element().to_markup(),
        "<div><section class=\"content\"><ul><li>a</li></ul></section></div>"
    );
    assert_eq!(global_registry().parent(list_id), Ok(Some(page.node_id())));
    assert_eq!(
        page.child_as::<ListNode<String>>("tasks").map(|tasks| tasks.item_count()),
        Some(1)
    );

    page.remove();
    assert_eq!(collection.signals().item_added.connection_count(), 0);
    assert_eq!(page.child_count(), 0);
}
