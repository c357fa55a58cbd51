//! Hierarchical views.
//!
//! A view owns a root [`Element`] and any number of keyed child views. The
//! [`View`] trait is the capability every node in a tree provides; the two
//! concrete implementations are [`ViewNode`], the generic tree engine, and
//! [`ListNode`], which mirrors a [`Collection`](crate::model::Collection) as
//! one child per item.
//!
//! # Example
//!
//! ```
//! use horizon_trellis::dom::Element;
//! use horizon_trellis::template::Template;
//! use horizon_trellis::view::{AddOptions, View, ViewNode, ViewOptions};
//!
//! let mut page = ViewNode::with_options(
//!     ViewOptions::new().template(Template::fixed(|| {
//!         Element::new("section").with_class("body").into()
//!     })),
//! );
//! page.add_child(
//!     AddOptions::at(".body").key("greeting"),
//!     ViewNode::with_options(ViewOptions::new().tag("p")),
//! );
//!
//! page.render();
//! assert_eq!(
//!     page.element().to_markup(),
//!     "<div><section class=\"body\"><p></p></section></div>"
//! );
//! ```

mod list;
mod node;

use std::any::Any;
use std::borrow::Borrow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use horizon_trellis_core::{NodeId, global_registry};

use crate::dom::Element;
use crate::model::ItemId;

pub use list::{ItemContext, ItemFactory, ListError, ListNode, ListNodeBuilder, ListOptions, OverlayFactory};
pub use node::{EventBinding, RenderHook, ViewNode, ViewOptions};

/// The capability shared by every node in a view tree.
pub trait View: Send + 'static {
    /// The node's registry identifier.
    fn node_id(&self) -> NodeId;

    /// A handle to the node's current root element.
    fn element(&self) -> Element;

    /// Render the node and its children into its root element.
    fn render(&mut self);

    /// Tear down children first, then detach and unbind this node.
    fn remove(&mut self);

    /// Whether the node has been rendered at least once.
    fn is_rendered(&self) -> bool;

    /// Record `parent` as this node's parent in the node registry.
    fn set_parent(&mut self, parent: Option<NodeId>) -> crate::Result<()> {
        global_registry().set_parent(self.node_id(), parent)?;
        Ok(())
    }

    /// Upcast for [`view_cast`].
    fn as_any(&self) -> &dyn Any;

    /// Upcast for [`view_cast_mut`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Downcast a view trait object to its concrete type.
pub fn view_cast<T: View>(view: &dyn View) -> Option<&T> {
    view.as_any().downcast_ref::<T>()
}

/// Mutable variant of [`view_cast`].
pub fn view_cast_mut<T: View>(view: &mut dyn View) -> Option<&mut T> {
    view.as_any_mut().downcast_mut::<T>()
}

static NEXT_CHILD_KEY: AtomicU64 = AtomicU64::new(1);

/// The key a child view is registered under in its parent.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChildKey(String);

impl ChildKey {
    /// Key of the empty-collection overlay child.
    pub const FALLBACK: &'static str = "fallback";
    /// Key of the loading overlay child.
    pub const LOADING: &'static str = "loading";

    /// Create a key from any string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Generate a process-wide unique key (`view1`, `view2`, ...).
    pub fn unique() -> Self {
        let n = NEXT_CHILD_KEY.fetch_add(1, Ordering::Relaxed);
        Self(format!("view{n}"))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is one of the reserved overlay keys.
    pub fn is_overlay(&self) -> bool {
        self.0 == Self::FALLBACK || self.0 == Self::LOADING
    }
}

impl Borrow<str> for ChildKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChildKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for ChildKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<ItemId> for ChildKey {
    fn from(id: ItemId) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ChildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ChildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChildKey({:?})", self.0)
    }
}

/// Where and under which key a child is added.
///
/// Both fields are optional: without an insertion point the child attaches
/// to the parent's root element, and without a key one is generated.
#[derive(Clone, Debug, Default)]
pub struct AddOptions {
    /// Selector (within the parent's element) to append the child to.
    pub insertion_point: Option<String>,
    /// Explicit key for later lookup or removal.
    pub key: Option<ChildKey>,
}

impl AddOptions {
    /// Attach to the parent's root with a generated key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach at the first match of `selector`.
    pub fn at(selector: impl Into<String>) -> Self {
        Self::new().insertion_point(selector)
    }

    /// Set the insertion point.
    pub fn insertion_point(mut self, selector: impl Into<String>) -> Self {
        self.insertion_point = Some(selector.into());
        self
    }

    /// Set the key.
    pub fn key(mut self, key: impl Into<ChildKey>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// A registered child: the view plus where it attaches.
pub struct ChildSlot {
    /// Selector within the parent's element, or `None` for the root.
    pub insertion_point: Option<String>,
    /// The child view.
    pub view: Box<dyn View>,
}

impl fmt::Debug for ChildSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildSlot")
            .field("insertion_point", &self.insertion_point)
            .field("node_id", &self.view.node_id())
            .finish()
    }
}
