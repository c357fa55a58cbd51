//! Rendering surface.
//!
//! Views render into [`Element`] trees. Selector lookup, visibility toggles
//! and delegated events are all provided here so that the view layer never
//! has to know how a host presents the tree.

mod element;
mod fragment;
mod selector;

pub use element::{DomEvent, Element, EventHandler, HandlerId, TEXT_NODE_TAG};
pub use fragment::Fragment;
pub use selector::{Selector, SelectorError};
