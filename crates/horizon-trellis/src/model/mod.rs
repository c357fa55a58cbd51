//! Observable data sources.
//!
//! A [`Collection`] announces every change through [`CollectionSignals`];
//! list views subscribe to those signals to keep one child view per item.

mod collection;

pub use collection::{Collection, CollectionSignals, FetchMode, ItemId, Record};
