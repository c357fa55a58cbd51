//! Minimal selector matching for element lookup.
//!
//! Supports compound selectors built from a tag name (or `*`), `#id` and
//! any number of `.class` parts, joined by whitespace as descendant
//! combinators: `ul.items`, `#list .fallback`, `div li.active`.

use std::fmt;
use std::str::FromStr;

use super::element::Element;

/// Errors produced while parsing a selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// The selector string contained no compound selectors.
    #[error("Empty selector")]
    Empty,
    /// An unsupported or malformed token was found.
    #[error("Invalid selector '{selector}' at byte {position}")]
    InvalidToken {
        /// The full selector text.
        selector: String,
        /// Byte offset of the offending token.
        position: usize,
    },
}

/// One compound part: `tag#id.class.class`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn matches(&self, element: &Element) -> bool {
        element.with_data(|data| {
            if let Some(tag) = &self.tag {
                if !data.tag.eq_ignore_ascii_case(tag) {
                    return false;
                }
            }
            if let Some(id) = &self.id {
                if data.id.as_deref() != Some(id.as_str()) {
                    return false;
                }
            }
            self.classes.iter().all(|class| data.classes.contains(class))
        })
    }
}

/// A parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    parts: Vec<Compound>,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

impl Selector {
    /// Parse a selector string.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut parts = Vec::new();
        let mut offset = 0;
        for word in input.split(' ') {
            if !word.trim().is_empty() {
                let start = offset + (word.len() - word.trim_start().len());
                parts.push(Self::parse_compound(input, word.trim(), start)?);
            }
            offset += word.len() + 1;
        }

        if parts.is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(Self {
            source: input.trim().to_string(),
            parts,
        })
    }

    fn parse_compound(input: &str, word: &str, start: usize) -> Result<Compound, SelectorError> {
        let invalid = |at: usize| SelectorError::InvalidToken {
            selector: input.to_string(),
            position: start + at,
        };

        let mut compound = Compound::default();
        let mut rest = word;
        let mut at = 0;

        if let Some(stripped) = rest.strip_prefix('*') {
            rest = stripped;
            at += 1;
        } else {
            let len = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
            if len > 0 {
                compound.tag = Some(rest[..len].to_string());
                rest = &rest[len..];
                at += len;
            }
        }

        while let Some(marker) = rest.chars().next() {
            let body = &rest[marker.len_utf8()..];
            let len = body.find(|c: char| !is_ident_char(c)).unwrap_or(body.len());
            if len == 0 {
                return Err(invalid(at));
            }
            let ident = body[..len].to_string();
            match marker {
                '#' if compound.id.is_none() => compound.id = Some(ident),
                '.' => compound.classes.push(ident),
                _ => return Err(invalid(at)),
            }
            rest = &body[len..];
            at += len + marker.len_utf8();
        }

        Ok(compound)
    }

    /// The selector text as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check whether `element` matches this selector.
    ///
    /// The last compound must match the element itself; earlier compounds
    /// must match ancestors, in order.
    pub fn matches(&self, element: &Element) -> bool {
        let Some((last, ancestors)) = self.parts.split_last() else {
            return false;
        };
        if !last.matches(element) {
            return false;
        }

        let mut pending = ancestors.len();
        let mut current = element.parent();
        while pending > 0 {
            let Some(node) = current else { break };
            if ancestors[pending - 1].matches(&node) {
                pending -= 1;
            }
            current = node.parent();
        }
        pending == 0
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
