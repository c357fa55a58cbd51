//! Node registry for Horizon Trellis.
//!
//! Every view in a trellis tree owns a [`NodeBase`], which registers a stable
//! [`NodeId`] in a process-wide arena. The arena records the parent link and
//! the ordered child list of each node, so a view can find its parent without
//! holding an owning pointer to it. Ownership of the view values themselves
//! stays with the parent view (or the caller, for roots); the registry only
//! tracks relationships.
//!
//! # Key Types
//!
//! - [`NodeId`] - Unique stable identifier for each node
//! - [`NodeRegistry`] - Arena managing node relationships
//! - [`SharedNodeRegistry`] - Thread-safe wrapper around [`NodeRegistry`]
//! - [`NodeBase`] - Registration handle embedded in every view

use std::sync::OnceLock;

use parking_lot::RwLock;
use slotmap::{SlotMap, new_key_type};

use crate::error::{NodeError, NodeResult};
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a node in the registry.
    ///
    /// `NodeId`s are stable handles that remain valid as the tree changes.
    /// They become invalid when the node is destroyed.
    pub struct NodeId;
}

impl NodeId {
    /// Convert the NodeId to a raw u64 value.
    #[inline]
    pub fn as_raw(self) -> u64 {
        use slotmap::Key;
        self.data().as_ffi()
    }
}

/// Internal data stored in the registry for each node.
struct NodeData {
    /// Human-readable name for debugging and lookup.
    name: String,
    /// The type name of the concrete view, for debugging.
    type_name: &'static str,
    /// Parent node (if any). Never owning.
    parent: Option<NodeId>,
    /// Child nodes in attachment order.
    children: Vec<NodeId>,
}

/// The arena that tracks every live node and its relationships.
pub struct NodeRegistry {
    nodes: SlotMap<NodeId, NodeData>,
}

impl NodeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
        }
    }

    /// Register a new node and return its ID.
    pub fn register<T: 'static>(&mut self) -> NodeId {
        let type_name = std::any::type_name::<T>();
        let id = self.nodes.insert(NodeData {
            name: String::new(),
            type_name,
            parent: None,
            children: Vec::new(),
        });
        tracing::trace!(target: targets::NODE, ?id, type_name, "registered node");
        id
    }

    /// Remove a node and all of its registry descendants.
    ///
    /// Descendants are removed children-first, then the node itself.
    #[tracing::instrument(skip(self), target = "horizon_trellis_core::node", level = "trace")]
    pub fn destroy(&mut self, id: NodeId) -> NodeResult<()> {
        let descendants = self.depth_first_postorder(id)?;
        tracing::trace!(
            target: targets::NODE,
            ?id,
            descendant_count = descendants.len() - 1,
            "destroying node tree"
        );

        if let Some(parent_id) = self.nodes.get(id).and_then(|d| d.parent) {
            if let Some(parent) = self.nodes.get_mut(parent_id) {
                parent.children.retain(|&child| child != id);
            }
        }

        // Post-order already ends with `id` itself.
        for node_id in descendants {
            self.nodes.remove(node_id);
        }
        Ok(())
    }

    /// Check if a node exists in the registry.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Set the parent of a node.
    ///
    /// Detaches from the old parent and appends to the new parent's child
    /// list. Passing `None` makes the node a root.
    pub fn set_parent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> NodeResult<()> {
        if !self.nodes.contains_key(id) {
            return Err(NodeError::InvalidNodeId);
        }

        if let Some(parent_id) = new_parent {
            if !self.nodes.contains_key(parent_id) {
                return Err(NodeError::InvalidNodeId);
            }
            if self.is_ancestor_of(id, parent_id) {
                return Err(NodeError::CircularParentage);
            }
        }

        if let Some(old_parent) = self.nodes.get(id).and_then(|d| d.parent) {
            if let Some(parent) = self.nodes.get_mut(old_parent) {
                parent.children.retain(|&child| child != id);
            }
        }

        if let Some(data) = self.nodes.get_mut(id) {
            data.parent = new_parent;
        }

        if let Some(parent_id) = new_parent {
            if let Some(parent) = self.nodes.get_mut(parent_id) {
                parent.children.push(id);
            }
        }

        Ok(())
    }

    /// Check if `potential_ancestor` is `id` or one of its ancestors.
    fn is_ancestor_of(&self, potential_ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(current_id) = current {
            if current_id == potential_ancestor {
                return true;
            }
            current = self.nodes.get(current_id).and_then(|d| d.parent);
        }
        false
    }

    /// Get the parent of a node.
    pub fn parent(&self, id: NodeId) -> NodeResult<Option<NodeId>> {
        self.nodes
            .get(id)
            .map(|d| d.parent)
            .ok_or(NodeError::InvalidNodeId)
    }

    /// Get the children of a node.
    pub fn children(&self, id: NodeId) -> NodeResult<&[NodeId]> {
        self.nodes
            .get(id)
            .map(|d| d.children.as_slice())
            .ok_or(NodeError::InvalidNodeId)
    }

    /// Get the node's name.
    pub fn name(&self, id: NodeId) -> NodeResult<&str> {
        self.nodes
            .get(id)
            .map(|d| d.name.as_str())
            .ok_or(NodeError::InvalidNodeId)
    }

    /// Set the node's name.
    pub fn set_name(&mut self, id: NodeId, name: String) -> NodeResult<()> {
        self.nodes
            .get_mut(id)
            .map(|d| d.name = name)
            .ok_or(NodeError::InvalidNodeId)
    }

    /// Get the type name of a node.
    pub fn type_name(&self, id: NodeId) -> NodeResult<&'static str> {
        self.nodes
            .get(id)
            .map(|d| d.type_name)
            .ok_or(NodeError::InvalidNodeId)
    }

    /// Find a direct child by name.
    pub fn find_child_by_name(&self, id: NodeId, name: &str) -> NodeResult<Option<NodeId>> {
        let children = self.children(id)?;
        Ok(children
            .iter()
            .copied()
            .find(|&child| self.nodes.get(child).is_some_and(|d| d.name == name)))
    }

    /// Get all ancestors of a node from immediate parent to root.
    pub fn ancestors(&self, id: NodeId) -> NodeResult<Vec<NodeId>> {
        let mut result = Vec::new();
        let mut current = self.parent(id)?;
        while let Some(current_id) = current {
            result.push(current_id);
            current = self.nodes.get(current_id).and_then(|d| d.parent);
        }
        Ok(result)
    }

    /// Depth-first post-order traversal (children recursively, then the node).
    pub fn depth_first_postorder(&self, id: NodeId) -> NodeResult<Vec<NodeId>> {
        let mut result = Vec::new();
        self.postorder_recursive(id, &mut result)?;
        Ok(result)
    }

    fn postorder_recursive(&self, id: NodeId, result: &mut Vec<NodeId>) -> NodeResult<()> {
        let data = self.nodes.get(id).ok_or(NodeError::InvalidNodeId)?;
        for &child_id in &data.children {
            self.postorder_recursive(child_id, result)?;
        }
        result.push(id);
        Ok(())
    }

    /// Get the number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over all root nodes (nodes with no parent).
    pub fn root_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, data)| data.parent.is_none())
            .map(|(id, _)| id)
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A thread-safe wrapper around [`NodeRegistry`].
pub struct SharedNodeRegistry {
    inner: RwLock<NodeRegistry>,
}

impl SharedNodeRegistry {
    /// Create a new shared registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(NodeRegistry::new()),
        }
    }

    /// Register a new node.
    pub fn register<T: 'static>(&self) -> NodeId {
        self.inner.write().register::<T>()
    }

    /// Destroy a node and its registry descendants.
    pub fn destroy(&self, id: NodeId) -> NodeResult<()> {
        self.inner.write().destroy(id)
    }

    /// Check if a node exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.inner.read().contains(id)
    }

    /// Set the parent of a node.
    pub fn set_parent(&self, id: NodeId, parent: Option<NodeId>) -> NodeResult<()> {
        self.inner.write().set_parent(id, parent)
    }

    /// Get the parent of a node.
    pub fn parent(&self, id: NodeId) -> NodeResult<Option<NodeId>> {
        self.inner.read().parent(id)
    }

    /// Get the children of a node (owned for thread safety).
    pub fn children(&self, id: NodeId) -> NodeResult<Vec<NodeId>> {
        self.inner.read().children(id).map(|c| c.to_vec())
    }

    /// Get the node's name.
    pub fn name(&self, id: NodeId) -> NodeResult<String> {
        self.inner.read().name(id).map(str::to_string)
    }

    /// Set the node's name.
    pub fn set_name(&self, id: NodeId, name: String) -> NodeResult<()> {
        self.inner.write().set_name(id, name)
    }

    /// Get the type name of a node.
    pub fn type_name(&self, id: NodeId) -> NodeResult<&'static str> {
        self.inner.read().type_name(id)
    }

    /// Find a direct child by name.
    pub fn find_child_by_name(&self, id: NodeId, name: &str) -> NodeResult<Option<NodeId>> {
        self.inner.read().find_child_by_name(id, name)
    }

    /// Get all ancestors from immediate parent to root.
    pub fn ancestors(&self, id: NodeId) -> NodeResult<Vec<NodeId>> {
        self.inner.read().ancestors(id)
    }

    /// Depth-first post-order traversal.
    pub fn depth_first_postorder(&self, id: NodeId) -> NodeResult<Vec<NodeId>> {
        self.inner.read().depth_first_postorder(id)
    }

    /// Get the number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.inner.read().node_count()
    }

    /// Get all root nodes.
    pub fn root_nodes(&self) -> Vec<NodeId> {
        self.inner.read().root_nodes().collect()
    }

    /// Access the registry with a read lock for compound queries.
    pub fn with_read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&NodeRegistry) -> R,
    {
        f(&self.inner.read())
    }
}

impl Default for SharedNodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_REGISTRY: OnceLock<SharedNodeRegistry> = OnceLock::new();

/// Get the process-wide node registry, creating it on first use.
pub fn global_registry() -> &'static SharedNodeRegistry {
    GLOBAL_REGISTRY.get_or_init(SharedNodeRegistry::new)
}

/// Registration handle embedded in every view.
///
/// Registers a fresh [`NodeId`] on construction and destroys it (together
/// with any registry descendants) when dropped.
///
/// # Example
///
/// ```
/// use horizon_trellis_core::NodeBase;
///
/// struct Panel;
///
/// let parent = NodeBase::new::<Panel>();
/// let child = NodeBase::new::<Panel>();
/// child.set_parent(Some(parent.id())).unwrap();
///
/// assert_eq!(child.parent(), Some(parent.id()));
/// assert_eq!(parent.children(), vec![child.id()]);
/// ```
#[derive(Debug)]
pub struct NodeBase {
    id: NodeId,
}

impl NodeBase {
    /// Register a new node for the view type `T`.
    pub fn new<T: 'static>() -> Self {
        Self {
            id: global_registry().register::<T>(),
        }
    }

    /// The node's ID.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Whether the node is still registered.
    pub fn is_alive(&self) -> bool {
        global_registry().contains(self.id)
    }

    /// The node's debug name (empty if unnamed or destroyed).
    pub fn name(&self) -> String {
        global_registry().name(self.id).unwrap_or_default()
    }

    /// Set the node's debug name.
    pub fn set_name(&self, name: impl Into<String>) {
        let _ = global_registry().set_name(self.id, name.into());
    }

    /// The parent node, if any.
    pub fn parent(&self) -> Option<NodeId> {
        global_registry().parent(self.id).ok().flatten()
    }

    /// Set (or clear) the parent node.
    pub fn set_parent(&self, parent: Option<NodeId>) -> NodeResult<()> {
        global_registry().set_parent(self.id, parent)
    }

    /// Child nodes in attachment order.
    pub fn children(&self) -> Vec<NodeId> {
        global_registry().children(self.id).unwrap_or_default()
    }

    /// Ancestors from immediate parent to root.
    pub fn ancestors(&self) -> Vec<NodeId> {
        global_registry().ancestors(self.id).unwrap_or_default()
    }
}

impl Drop for NodeBase {
    fn drop(&mut self) {
        // Already gone if an ancestor was destroyed first.
        let _ = global_registry().destroy(self.id);
    }
}

static_assertions::assert_impl_all!(SharedNodeRegistry: Send, Sync);
static_assertions::assert_impl_all!(NodeBase: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    struct Leaf;
    struct Branch;

    #[test]
    fn test_register_and_destroy() {
        let mut registry = NodeRegistry::new();
        let id = registry.register::<Leaf>();
        assert!(registry.contains(id));
        assert!(registry.type_name(id).unwrap().ends_with("Leaf"));

        registry.destroy(id).unwrap();
        assert!(!registry.contains(id));
        assert_eq!(registry.destroy(id), Err(NodeError::InvalidNodeId));
    }

    #[test]
    fn test_set_parent_moves_child() {
        let mut registry = NodeRegistry::new();
        let a = registry.register::<Branch>();
        let b = registry.register::<Branch>();
        let child = registry.register::<Leaf>();

        registry.set_parent(child, Some(a)).unwrap();
        assert_eq!(registry.children(a).unwrap(), &[child]);

        registry.set_parent(child, Some(b)).unwrap();
        assert!(registry.children(a).unwrap().is_empty());
        assert_eq!(registry.children(b).unwrap(), &[child]);
        assert_eq!(registry.parent(child).unwrap(), Some(b));
    }

    #[test]
    fn test_circular_parentage_rejected() {
        let mut registry = NodeRegistry::new();
        let root = registry.register::<Branch>();
        let child = registry.register::<Branch>();
        let grandchild = registry.register::<Leaf>();
        registry.set_parent(child, Some(root)).unwrap();
        registry.set_parent(grandchild, Some(child)).unwrap();

        assert_eq!(
            registry.set_parent(root, Some(grandchild)),
            Err(NodeError::CircularParentage)
        );
        assert_eq!(
            registry.set_parent(root, Some(root)),
            Err(NodeError::CircularParentage)
        );
    }

    #[test]
    fn test_destroy_cascades_children_first() {
        let mut registry = NodeRegistry::new();
        let root = registry.register::<Branch>();
        let child = registry.register::<Branch>();
        let grandchild = registry.register::<Leaf>();
        registry.set_parent(child, Some(root)).unwrap();
        registry.set_parent(grandchild, Some(child)).unwrap();

        assert_eq!(
            registry.depth_first_postorder(root).unwrap(),
            vec![grandchild, child, root]
        );

        registry.destroy(child).unwrap();
        assert!(registry.contains(root));
        assert!(!registry.contains(child));
        assert!(!registry.contains(grandchild));
        assert!(registry.children(root).unwrap().is_empty());
    }

    #[test]
    fn test_ancestors_and_names() {
        let mut registry = NodeRegistry::new();
        let root = registry.register::<Branch>();
        let child = registry.register::<Leaf>();
        registry.set_parent(child, Some(root)).unwrap();
        registry.set_name(child, "item".into()).unwrap();

        assert_eq!(registry.ancestors(child).unwrap(), vec![root]);
        assert_eq!(registry.find_child_by_name(root, "item").unwrap(), Some(child));
        assert_eq!(registry.find_child_by_name(root, "missing").unwrap(), None);
    }

    #[test]
    fn test_node_base_drop_unregisters() {
        let parent = NodeBase::new::<Branch>();
        let id = {
            let child = NodeBase::new::<Leaf>();
            child.set_parent(Some(parent.id())).unwrap();
            child.set_name("temp");
            assert_eq!(child.name(), "temp");
            child.id()
        };
        assert!(!global_registry().contains(id));
        assert!(parent.children().is_empty());
    }
}
