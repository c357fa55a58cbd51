//! Ordered top-level output of a template.

use super::element::Element;

/// An ordered list of top-level elements.
#[derive(Clone, Debug, Default)]
pub struct Fragment {
    nodes: Vec<Element>,
}

impl Fragment {
    /// Create an empty fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a top-level element.
    pub fn push(&mut self, node: Element) {
        self.nodes.push(node);
    }

    /// Append a top-level element, builder style.
    pub fn with(mut self, node: Element) -> Self {
        self.push(node);
        self
    }

    /// The top-level elements.
    pub fn nodes(&self) -> &[Element] {
        &self.nodes
    }

    /// Consume the fragment, yielding its top-level elements.
    pub fn into_nodes(self) -> Vec<Element> {
        self.nodes
    }

    /// Number of top-level elements.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the fragment is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The outermost element, if there is exactly one.
    pub fn single_root(&self) -> Option<&Element> {
        match self.nodes.as_slice() {
            [root] => Some(root),
            _ => None,
        }
    }

    /// Concatenated markup of all top-level elements.
    pub fn to_markup(&self) -> String {
        self.nodes.iter().map(Element::to_markup).collect()
    }
}

impl From<Element> for Fragment {
    fn from(node: Element) -> Self {
        Self { nodes: vec![node] }
    }
}

impl From<Vec<Element>> for Fragment {
    fn from(nodes: Vec<Element>) -> Self {
        Self { nodes }
    }
}

impl FromIterator<Element> for Fragment {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}
