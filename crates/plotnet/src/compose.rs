//! Block composers.
//!
//! A composer takes a block role and partially specified parameters,
//! resolves the defaults, and returns the ordered fragments of the block, its
//! sub-parts, and the connector linking it to its predecessor. Composers
//! either return every fragment or fail without emitting anything.
//!
//! - [`layer`] - single-layer roles such as [`conv`], [`upsample`] or [`sum`].
//! - [`group`] - auto-numbered runs of blocks such as [`multi_conv`] or
//!   [`bottleneck`].

mod group;
mod layer;

pub use group::{
    BottleneckStyle, GroupParams, Spacing, bottleneck, multi_conv, multi_conv_relu,
    multi_conv_relu_z, multi_conv_z, residual,
};
pub use layer::{
    LayerParams, ReluStyle, UnconvParams, YoloOverlay, block_unconv, conc, conv, conv_pool,
    conv_relu, legend, mult, new_branch, shortcut, softmax, sum, upsample, yolo,
};

use serde::Deserialize;

use plotnet_core::{Error, Result};

/// A parameter given either once for every member of a group or once per
/// member.
///
/// Deserializes from a single value or from an array. For values that are
/// themselves arrays, such as a `[height, depth]` size, a flat array is read
/// as one scalar value.
///
/// ```
/// # use plotnet::compose::Broadcast;
/// assert_eq!(Broadcast::Scalar(64).resolve(3, "filters").unwrap(), vec![64, 64, 64]);
/// assert!(Broadcast::PerMember(vec![64, 128]).resolve(3, "filters").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Broadcast<T> {
    Scalar(T),
    PerMember(Vec<T>),
}

impl<T: Clone> Broadcast<T> {
    /// Resolves this parameter into exactly `count` values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] when a per-member sequence does not
    /// have `count` entries. Sequences are never truncated or padded.
    pub fn resolve(&self, count: usize, what: &'static str) -> Result<Vec<T>> {
        match self {
            Self::Scalar(value) => Ok(vec![value.clone(); count]),
            Self::PerMember(values) if values.len() == count => Ok(values.clone()),
            Self::PerMember(values) => Err(Error::ShapeMismatch {
                what,
                expected: count,
                found: values.len(),
            }),
        }
    }
}

impl<T> From<T> for Broadcast<T> {
    fn from(value: T) -> Self {
        Self::Scalar(value)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_resolve_per_member() {
        let sizes = Broadcast::PerMember(vec![32, 16]);
        assert_eq!(sizes.resolve(2, "size").unwrap(), vec![32, 16]);
    }

    #[test]
    fn test_resolve_mismatch_reports_lengths() {
        let err = Broadcast::PerMember(vec![1, 2, 3]).resolve(5, "width").unwrap_err();
        assert_eq!(
            err,
            Error::ShapeMismatch {
                what: "width",
                expected: 5,
                found: 3,
            }
        );
    }

    proptest! {
        #[test]
        fn prop_scalar_broadcasts_to_count(value in 1u32..4096, count in 0usize..32) {
            let resolved = Broadcast::Scalar(value).resolve(count, "filters").unwrap();
            prop_assert_eq!(resolved.len(), count);
            prop_assert!(resolved.iter().all(|v| *v == value));
        }

        #[test]
        fn prop_per_member_resolves_only_at_its_length(
            values in proptest::collection::vec(1u32..512, 0..16),
            count in 0usize..16,
        ) {
            let resolved = Broadcast::PerMember(values.clone()).resolve(count, "filters");
            prop_assert_eq!(resolved.is_ok(), values.len() == count);
        }
    }
}
