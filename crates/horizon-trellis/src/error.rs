//! Error types for the view layer.

use horizon_trellis_core::NodeError;

use crate::dom::SelectorError;
use crate::view::ListError;

/// Result type alias for view operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the view layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A list view could not be built.
    #[error(transparent)]
    List(#[from] ListError),

    /// A selector could not be parsed.
    #[error(transparent)]
    Selector(#[from] SelectorError),

    /// A node registry operation failed.
    #[error(transparent)]
    Node(#[from] NodeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Selector;

    fn parse(selector: &str) -> Result<Selector> {
        Ok(Selector::parse(selector)?)
    }

    #[test]
    fn test_conversions() {
        let err = parse("").unwrap_err();
        assert_eq!(err, Error::Selector(SelectorError::Empty));
        assert_eq!(err.to_string(), "Empty selector");

        let err: Error = ListError::MissingItemFactory.into();
        assert_eq!(err.to_string(), "A list view requires an item view factory");
    }
}
