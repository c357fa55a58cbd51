//! Horizon Trellis - hierarchical view composition for Rust.
//!
//! Views form a tree: each [`ViewNode`](view::ViewNode) owns a root
//! [`Element`](dom::Element), renders an optional template into it, and owns
//! keyed child views that attach at selector-addressed insertion points.
//! [`ListNode`](view::ListNode) projects an observable
//! [`Collection`](model::Collection) onto one child view per item and keeps
//! a loading indicator and an empty-state fallback in sync with fetches.
//!
//! The node registry, signals and logging helpers live in
//! `horizon-trellis-core` and are re-exported here.
//!
//! # Example
//!
//! ```
//! use horizon_trellis::prelude::*;
//!
//! let tasks = Collection::shared(Vec::<String>::new());
//! let mut list = ListNode::builder()
//!     .collection(tasks.clone())
//!     .item_view(|item| {
//!         let title = item.model.to_string();
//!         ViewNode::with_options(ViewOptions::new().tag("li").template(Template::fixed(move || {
//!             Element::text_node(title.clone()).into()
//!         })))
//!     })
//!     .view(ViewOptions::new().tag("section").template(Template::fixed(|| {
//!         vec![Element::new("ul"), Element::new("p").with_class("empty")].into()
//!     })))
//!     .list_selector("ul")
//!     .fallback_selector(".empty")
//!     .build()?;
//!
//! list.render();
//! assert!(list.is_fallback_visible());
//!
//! tasks.push("write docs".into());
//! assert!(!list.is_fallback_visible());
//! assert_eq!(list.item_count(), 1);
//! # Ok::<(), horizon_trellis::Error>(())
//! ```

pub use horizon_trellis_core::*;

pub mod dom;
mod error;
pub mod model;
pub mod prelude;
pub mod template;
pub mod view;

pub use error::{Error, Result};
