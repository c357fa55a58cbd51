//! Error types for Horizon Trellis core.

/// Errors that can occur during node registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    /// The node ID is invalid or the node has been destroyed.
    #[error("Invalid or destroyed node ID")]
    InvalidNodeId,
    /// Attempted to set a node as its own parent or ancestor.
    #[error("Cannot set a node as its own parent or ancestor")]
    CircularParentage,
}

/// Result type for node registry operations.
pub type NodeResult<T> = std::result::Result<T, NodeError>;
