//! Block names and predecessor handles.
//!
//! A block's identity only exists as the string name embedded in the emitted
//! text; later fragments refer to earlier blocks by that name. This module
//! provides the [`BlockName`] newtype and the [`Predecessor`] handle that
//! every composer takes explicitly.
//!
//! Deriving a predecessor from a `prefix_index` name is offered as an opt-in
//! helper ([`BlockName::predecessor`]) so that malformed names fail where the
//! caller asks for inference.

use std::{fmt, str::FromStr};

use serde::Deserialize;

use crate::{
    anchor::{Anchor, AnchorRef, Target},
    error::{Error, Result},
};

const INDEX_SEPARATOR: char = '_';

/// The name of a block or named coordinate.
///
/// # Examples
///
/// ```
/// use plotnet_core::identifier::BlockName;
///
/// let name = BlockName::numbered("conv", 5);
/// assert_eq!(name, "conv_5");
/// assert_eq!(name.predecessor().unwrap(), "conv_4");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct BlockName(String);

impl BlockName {
    /// Creates a block name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates the name `<prefix>_<index>` used for numbered blocks
    pub fn numbered(prefix: &str, index: u32) -> Self {
        Self(format!("{prefix}{INDEX_SEPARATOR}{index}"))
    }

    /// Returns the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Creates the derived name `<name>_<suffix>` used for sub-parts of a block
    pub fn child(&self, suffix: &str) -> Self {
        Self(format!("{}{INDEX_SEPARATOR}{suffix}", self.0))
    }

    /// Creates the derived name `<prefix>_<name>` used for blocks attached to
    /// this one
    pub fn prefixed(&self, prefix: &str) -> Self {
        Self(format!("{prefix}{INDEX_SEPARATOR}{}", self.0))
    }

    /// Returns a reference to one of this block's anchors
    pub fn at(&self, anchor: Anchor) -> AnchorRef {
        AnchorRef::new(self.clone(), Some(anchor))
    }

    /// Returns a reference to this name without an anchor suffix
    pub fn bare(&self) -> AnchorRef {
        AnchorRef::bare(self.clone())
    }

    /// Splits the name on its last `_` into a prefix and a trailing index.
    ///
    /// Returns `None` when there is no separator or the suffix is not an
    /// unsigned integer.
    pub fn split_index(&self) -> Option<(&str, u32)> {
        let (prefix, index) = self.0.rsplit_once(INDEX_SEPARATOR)?;
        let index = index.parse().ok()?;
        Some((prefix, index))
    }

    /// Infers the name of the preceding block by decrementing the trailing
    /// index: `conv_5` yields `conv_4`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NameInference`] when the name does not follow the
    /// `prefix_index` convention or its index is already `0`.
    pub fn predecessor(&self) -> Result<Self> {
        let fail = |reason: &str| Error::NameInference {
            name: self.0.clone(),
            reason: reason.to_string(),
        };

        let (prefix, index) = self
            .split_index()
            .ok_or_else(|| fail("expected a `prefix_index` name"))?;
        let previous = index
            .checked_sub(1)
            .ok_or_else(|| fail("index 0 has no predecessor"))?;

        Ok(Self::numbered(prefix, previous))
    }
}

impl fmt::Display for BlockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for BlockName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl PartialEq<&str> for BlockName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<str> for BlockName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// The element a new block is placed after.
///
/// A composer places its block relative to an anchor of the predecessor and,
/// when asked, draws a connector from it. [`Predecessor::Origin`] places the
/// block at `(0,0,0)` and never draws a connector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum Predecessor {
    /// The diagram origin. Parsed from the string `origin`.
    Origin,
    /// A previously emitted block.
    Block(BlockName),
}

impl Predecessor {
    /// Creates a handle to a named block
    pub fn block(name: impl Into<BlockName>) -> Self {
        Self::Block(name.into())
    }

    /// Creates a handle to the block preceding `name` by index.
    ///
    /// # Errors
    ///
    /// See [`BlockName::predecessor`].
    pub fn infer(name: &BlockName) -> Result<Self> {
        name.predecessor().map(Self::Block)
    }

    /// Returns the predecessor's name, or `None` for the origin
    pub fn name(&self) -> Option<&BlockName> {
        match self {
            Self::Origin => None,
            Self::Block(name) => Some(name),
        }
    }

    /// Returns the placement target at `anchor` of the predecessor
    pub fn target(&self, anchor: Anchor) -> Target {
        match self {
            Self::Origin => Target::origin(),
            Self::Block(name) => Target::Anchor(name.at(anchor)),
        }
    }
}

impl From<BlockName> for Predecessor {
    fn from(name: BlockName) -> Self {
        Self::Block(name)
    }
}

impl From<&str> for Predecessor {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<String> for Predecessor {
    fn from(name: String) -> Self {
        if name == "origin" {
            Self::Origin
        } else {
            Self::Block(BlockName(name))
        }
    }
}

impl FromStr for Predecessor {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}
