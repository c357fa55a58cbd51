//! Core systems for Horizon Trellis.
//!
//! This crate provides the foundations the view layer is built on:
//!
//! - **Node Registry**: Stable node identifiers and non-owning parent links
//! - **Signal/Slot System**: Synchronous, ordered change notification
//! - **Logging**: `tracing` targets, view-tree debug output, perf spans
//!
//! # Signal Example
//!
//! ```
//! use horizon_trellis_core::Signal;
//!
//! let fetch_completed = Signal::<()>::new();
//! let conn_id = fetch_completed.connect(|_| println!("loaded"));
//!
//! fetch_completed.emit(());
//! fetch_completed.disconnect(conn_id);
//! ```

mod error;
pub mod logging;
pub mod node;
pub mod signal;

pub use error::{NodeError, NodeResult};
pub use logging::{NodeTreeDebug, PerfSpan, TreeFormatOptions, TreeStyle};
pub use node::{NodeBase, NodeId, NodeRegistry, SharedNodeRegistry, global_registry};
pub use signal::{ConnectionId, Signal};
