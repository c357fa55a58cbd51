//! Logging and debugging facilities for Horizon Trellis.
//!
//! Horizon Trellis uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt::init();
//! ```
//!
//! Use [`NodeTreeDebug`] to print the live view hierarchy:
//!
//! ```ignore
//! use horizon_trellis_core::logging::NodeTreeDebug;
//!
//! println!("{}", NodeTreeDebug::new().format_subtree(root_id)?);
//! ```

use std::fmt::{self, Write as FmtWrite};

use crate::error::NodeResult;
use crate::node::{NodeId, NodeRegistry, global_registry};

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "horizon_trellis_core";
    /// Node registry target.
    pub const NODE: &str = "horizon_trellis_core::node";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_trellis_core::signal";
    /// View tree engine target.
    pub const VIEW: &str = "horizon_trellis::view";
    /// List view target.
    pub const LIST: &str = "horizon_trellis::list";
    /// Rendering surface target.
    pub const DOM: &str = "horizon_trellis::dom";
    /// Collection target.
    pub const MODEL: &str = "horizon_trellis::model";
    /// Performance spans.
    pub const PERF: &str = "horizon_trellis::perf";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact representation.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node IDs.
    pub show_ids: bool,
    /// Whether to show type names.
    pub show_types: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_types: true,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for minimal output (names only).
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_types: false,
            ..Default::default()
        }
    }

    /// Set the tree style.
    pub fn with_style(mut self, style: TreeStyle) -> Self {
        self.style = style;
        self
    }

    /// Limit traversal depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

/// Debug utility for visualizing the node tree held by the global registry.
#[derive(Debug, Clone, Default)]
pub struct NodeTreeDebug {
    options: TreeFormatOptions,
}

impl NodeTreeDebug {
    /// Create a new debug visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format every root node and its subtree.
    pub fn format_all(&self) -> NodeResult<String> {
        global_registry().with_read(|registry| {
            let roots: Vec<NodeId> = registry.root_nodes().collect();

            let mut output = String::new();
            let _ = writeln!(output, "Node Tree ({} total nodes):", registry.node_count());
            if roots.is_empty() {
                output.push_str("  (empty)\n");
            } else {
                for root in roots {
                    self.format_subtree_into(registry, root, 0, true, &mut output)?;
                }
            }
            Ok(output)
        })
    }

    /// Format a subtree starting from a specific node.
    pub fn format_subtree(&self, root: NodeId) -> NodeResult<String> {
        global_registry().with_read(|registry| {
            let mut output = String::new();
            self.format_subtree_into(registry, root, 0, true, &mut output)?;
            Ok(output)
        })
    }

    fn format_subtree_into(
        &self,
        registry: &NodeRegistry,
        id: NodeId,
        depth: usize,
        is_last: bool,
        output: &mut String,
    ) -> NodeResult<()> {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return Ok(());
        }

        let name = registry.name(id)?;
        let type_name = registry.type_name(id)?;
        let children = registry.children(id)?;

        output.push_str(&self.build_prefix(depth, is_last));
        output.push_str(if name.is_empty() { "(unnamed)" } else { name });

        if self.options.show_ids {
            let _ = write!(output, " [{:?}]", id);
        }
        if self.options.show_types {
            // Strip generic arguments before trimming the module path.
            let base = type_name.split('<').next().unwrap_or(type_name);
            let short = base.rsplit("::").next().unwrap_or(base);
            let _ = write!(output, " ({})", short);
        }
        output.push('\n');

        let child_count = children.len();
        for (i, &child) in children.iter().enumerate() {
            self.format_subtree_into(registry, child, depth + 1, i + 1 == child_count, output)?;
        }
        Ok(())
    }

    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, tee, corner) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.options.indent_size));
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix.push(' ');
        prefix
    }
}

impl fmt::Display for NodeTreeDebug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format_all() {
            Ok(output) => write!(f, "{}", output),
            Err(e) => write!(f, "Error formatting node tree: {}", e),
        }
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Useful for timing render passes with a span-timing subscriber.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}
