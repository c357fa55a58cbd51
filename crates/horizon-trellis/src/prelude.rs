//! Prelude module for Horizon Trellis.
//!
//! ```
//! use horizon_trellis::prelude::*;
//! ```

// ============================================================================
// Node Registry and Signals
// ============================================================================

pub use crate::{NodeId, Signal};

// ============================================================================
// Surface
// ============================================================================

pub use crate::dom::{DomEvent, Element, Fragment};

// ============================================================================
// Data
// ============================================================================

pub use crate::model::{Collection, FetchMode, ItemId, Record};
pub use crate::template::{DataProvider, Template, TemplateData};

// ============================================================================
// Views
// ============================================================================

pub use crate::view::{
    AddOptions, ChildKey, ItemContext, ListNode, ListOptions, View, ViewNode, ViewOptions,
};
