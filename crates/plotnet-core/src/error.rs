//! Error type shared by the primitive emitter and the block composer.

use thiserror::Error;

/// A type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving or emitting diagram primitives.
///
/// Every variant is raised before any text is produced, so a failing call
/// never yields a partial fragment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Two sequence-valued parameters that must line up have different lengths.
    #[error("`{what}` has {found} entries but {expected} were expected")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// The predecessor of a block could not be derived from its name.
    #[error("cannot infer the predecessor of `{name}`: {reason}")]
    NameInference { name: String, reason: String },

    /// A filter count outside the domain of the logarithmic width scale.
    #[error("filter count must be positive to derive a width, got {filters}")]
    Domain { filters: u32 },

    /// A group was requested with no members.
    #[error("group `{prefix}` must contain at least one member")]
    EmptyGroup { prefix: String },

    /// Numbering a group's members or captions ran past `u32::MAX`.
    #[error("group `{prefix}` numbers {count} members from {start}, past the largest index")]
    IndexOverflow {
        prefix: String,
        start: u32,
        count: u32,
    },

    /// A textual anchor, target or fill reference could not be parsed.
    #[error("invalid reference `{input}`: {reason}")]
    InvalidReference { input: String, reason: String },
}
