//! Text fragments produced by the primitive emitters.
//!
//! # Overview
//!
//! - [`Fragment`]: The complete TikZ text for one primitive (a block, a ball,
//!   a connector with its auxiliary coordinates, ...)
//! - [`Fragments`]: An ordered list of fragments, joined once when rendered
//!
//! Fragments are never reordered or deduplicated: the order in which they are
//! pushed is the order in which they appear in the document.
//!
//! # Example
//!
//! ```
//! # use plotnet_core::draw::{Fragment, Fragments};
//! let mut body = Fragments::new();
//! body.push(Fragment::new("\\coordinate (a) at (0,0,0);\n"));
//!
//! let mut more = Fragments::new();
//! more.push(Fragment::new("\\coordinate (b) at (1,0,0);\n"));
//!
//! body.merge(more);
//! assert_eq!(body.len(), 2);
//! assert_eq!(
//!     body.render(),
//!     "\\coordinate (a) at (0,0,0);\n\\coordinate (b) at (1,0,0);\n"
//! );
//! ```

use std::fmt;

/// Indentation unit of emitted statements.
const INDENT: &str = "    ";

/// Nesting depth of top-level statements inside the `tikzpicture` environment.
pub(crate) const STATEMENT_DEPTH: usize = 2;

/// The TikZ text of one visual primitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fragment(String);

impl Fragment {
    /// Wraps already formatted TikZ text
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the fragment text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the fragment and returns its text
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered collection of fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments {
    items: Vec<Fragment>,
}

impl Fragments {
    /// Creates an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one fragment
    pub fn push(&mut self, fragment: Fragment) {
        self.items.push(fragment);
    }

    /// Appends every fragment of `other`, keeping its order.
    pub fn merge(&mut self, other: Fragments) {
        self.items.extend(other.items);
    }

    /// Returns the number of fragments
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if no fragment has been pushed.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the fragments in emission order
    pub fn iter(&self) -> std::slice::Iter<'_, Fragment> {
        self.items.iter()
    }

    /// Joins all fragments into one string.
    pub fn render(&self) -> String {
        let capacity = self.items.iter().map(|item| item.0.len()).sum();
        let mut text = String::with_capacity(capacity);
        for item in &self.items {
            text.push_str(&item.0);
        }
        text
    }
}

impl From<Fragment> for Fragments {
    fn from(fragment: Fragment) -> Self {
        Self {
            items: vec![fragment],
        }
    }
}

impl FromIterator<Fragment> for Fragments {
    fn from_iter<I: IntoIterator<Item = Fragment>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl Extend<Fragment> for Fragments {
    fn extend<I: IntoIterator<Item = Fragment>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl IntoIterator for Fragments {
    type Item = Fragment;
    type IntoIter = std::vec::IntoIter<Fragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Fragments {
    type Item = &'a Fragment;
    type IntoIter = std::slice::Iter<'a, Fragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Line-oriented builder for the text of a single fragment.
#[derive(Debug, Default)]
pub(crate) struct FragmentBuilder {
    text: String,
}

impl FragmentBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends one line at `depth` levels of indentation.
    pub(crate) fn line(&mut self, depth: usize, content: impl AsRef<str>) -> &mut Self {
        for _ in 0..depth {
            self.text.push_str(INDENT);
        }
        self.text.push_str(content.as_ref());
        self.text.push('\n');
        self
    }

    /// Appends one top-level statement line.
    pub(crate) fn statement(&mut self, content: impl AsRef<str>) -> &mut Self {
        self.line(STATEMENT_DEPTH, content)
    }

    pub(crate) fn build(&mut self) -> Fragment {
        Fragment(std::mem::take(&mut self.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragments_new() {
        let fragments = Fragments::new();
        assert!(fragments.is_empty());
        assert_eq!(fragments.render(), "");
    }

    #[test]
    fn test_fragments_preserve_order() {
        let fragments: Fragments = ["c", "a", "b"].into_iter().map(Fragment::new).collect();
        assert_eq!(fragments.render(), "cab");
    }

    #[test]
    fn test_fragments_merge() {
        let mut first = Fragments::from(Fragment::new("1"));
        let mut second = Fragments::new();
        second.push(Fragment::new("2"));
        second.push(Fragment::new("3"));

        first.merge(second);
        assert_eq!(first.len(), 3);
        assert_eq!(first.render(), "123");
    }

    #[test]
    fn test_fragment_builder_indents() {
        let fragment = FragmentBuilder::new()
            .statement("\\draw (a)")
            .line(3, "-- (b);")
            .build();
        assert_eq!(fragment.as_str(), "        \\draw (a)\n            -- (b);\n");
    }
}
