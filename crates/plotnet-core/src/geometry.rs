//! Geometric values used to place and size blocks.
//!
//! # Overview
//!
//! - [`Offset`] - A relative `(x, y, z)` displacement from an anchor
//! - [`BoxSize`] - The height and depth of a three-axis block
//! - [`Width`] - A block's extent along the primary axis, either a single
//!   slab or an ordered list of sub-slabs
//! - [`log_width`] - The perceptual width scale derived from a filter count
//!
//! # Coordinate System
//!
//! Diagrams use the TikZ 3d coordinate system of the layer macros:
//!
//! ```text
//!        +Y
//!         │
//!         │
//!         └──────► +X   (primary axis, data flows left to right)
//!        ╱
//!       ╱
//!     +Z                (depth axis, towards the viewer)
//! ```
//!
//! There is no global coordinate assignment: every block is positioned by an
//! [`Offset`] relative to a named anchor of an earlier block.

use std::fmt;

use serde::Deserialize;

use crate::error::{Error, Result};

/// A relative displacement applied when placing a block at an anchor.
///
/// Renders as `(x, y, z)` with numbers in their shortest form.
///
/// # Examples
///
/// ```
/// # use plotnet_core::geometry::Offset;
/// let offset = Offset::new(1.0, 0.0, -2.5);
/// assert_eq!(offset.to_string(), "(1, 0, -2.5)");
/// assert!(Offset::ZERO.is_zero());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(from = "[f64; 3]")]
pub struct Offset {
    x: f64,
    y: f64,
    z: f64,
}

impl Offset {
    /// The zero displacement, used for blocks placed flush against each other.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Creates a new offset from its three components
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates an offset along the primary axis only
    pub fn along_x(x: f64) -> Self {
        Self::new(x, 0.0, 0.0)
    }

    /// Creates the spacing used by depth-axis stacks.
    ///
    /// A stack step of `k` moves `k` units towards the viewer and pulls the
    /// block back by `4 / k` along the primary axis so the stack stays
    /// visually compact.
    ///
    /// # Examples
    ///
    /// ```
    /// # use plotnet_core::geometry::Offset;
    /// let step = Offset::depth_step(4.0);
    /// assert_eq!(step, Offset::new(-1.0, 0.0, 4.0));
    /// ```
    pub fn depth_step(k: f64) -> Self {
        Self::new(-(4.0 / k), 0.0, k)
    }

    /// Returns the x component
    pub fn x(self) -> f64 {
        self.x
    }

    /// Returns the y component
    pub fn y(self) -> f64 {
        self.y
    }

    /// Returns the z component
    pub fn z(self) -> f64 {
        self.z
    }

    /// Checks if all three components are zero
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

impl From<[f64; 3]> for Offset {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// The height and depth of a three-axis block.
///
/// Deserializes from either a single number (a square face) or a
/// `[height, depth]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "BoxSizeRepr")]
pub struct BoxSize {
    height: f64,
    depth: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoxSizeRepr {
    Square(f64),
    Pair([f64; 2]),
}

impl From<BoxSizeRepr> for BoxSize {
    fn from(repr: BoxSizeRepr) -> Self {
        match repr {
            BoxSizeRepr::Square(side) => Self::square(side),
            BoxSizeRepr::Pair([height, depth]) => Self::new(height, depth),
        }
    }
}

impl BoxSize {
    /// Creates a size from height and depth
    pub fn new(height: f64, depth: f64) -> Self {
        Self { height, depth }
    }

    /// Creates a size whose height equals its depth
    pub fn square(side: f64) -> Self {
        Self::new(side, side)
    }

    /// Returns the height
    pub fn height(self) -> f64 {
        self.height
    }

    /// Returns the depth
    pub fn depth(self) -> f64 {
        self.depth
    }

    /// Returns this size with both dimensions multiplied by `factor`
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.height * factor, self.depth * factor)
    }
}

impl Default for BoxSize {
    fn default() -> Self {
        Self::square(32.0)
    }
}

/// The extent of a block along the primary axis.
///
/// A block may subdivide into sub-slabs, in which case each slab carries its
/// own width and the filter-count label must list one count per slab.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Width {
    /// One slab of the given width.
    Single(f64),
    /// Consecutive sub-slabs, in drawing order.
    Slabs(Vec<f64>),
}

impl Width {
    /// Returns the number of slabs
    pub fn slab_count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Slabs(slabs) => slabs.len(),
        }
    }
}

impl From<f64> for Width {
    fn from(width: f64) -> Self {
        Self::Single(width)
    }
}

impl From<Vec<f64>> for Width {
    fn from(slabs: Vec<f64>) -> Self {
        Self::Slabs(slabs)
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(width) => write!(f, "{width}"),
            Self::Slabs(slabs) => write!(f, "{}", join_numbers(slabs)),
        }
    }
}

/// Derives a block width from its filter count as `log_4(filters)`.
///
/// The logarithmic scale keeps filter counts spanning several orders of
/// magnitude within a bounded range of visual thickness.
///
/// # Errors
///
/// Returns [`Error::Domain`] for a filter count of zero.
///
/// # Examples
///
/// ```
/// # use plotnet_core::geometry::log_width;
/// assert_eq!(log_width(64).unwrap(), 3.0);
/// assert_eq!(log_width(4).unwrap(), 1.0);
/// assert_eq!(log_width(1).unwrap(), 0.0);
/// assert!(log_width(0).is_err());
/// ```
pub fn log_width(filters: u32) -> Result<f64> {
    if filters == 0 {
        return Err(Error::Domain { filters });
    }
    // log2 is exact for powers of two, which keeps common widths integral
    Ok(f64::from(filters).log2() / 2.0)
}

/// Joins numbers with `,` in their shortest form.
pub(crate) fn join_numbers<T: fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_offset_display() {
        assert_eq!(Offset::new(1.0, 0.0, 0.0).to_string(), "(1, 0, 0)");
        assert_eq!(Offset::new(-0.25, 0.0, 4.0).to_string(), "(-0.25, 0, 4)");
        assert_eq!(Offset::ZERO.to_string(), "(0, 0, 0)");
    }

    #[test]
    fn test_offset_depth_step() {
        let step = Offset::depth_step(3.0);
        assert_approx_eq!(f64, step.x(), -4.0 / 3.0);
        assert_approx_eq!(f64, step.y(), 0.0);
        assert_approx_eq!(f64, step.z(), 3.0);
    }

    #[test]
    fn test_box_size_scale() {
        let size = BoxSize::new(32.0, 16.0).scale(2.0);
        assert_approx_eq!(f64, size.height(), 64.0);
        assert_approx_eq!(f64, size.depth(), 32.0);
    }

    #[test]
    fn test_width_display() {
        assert_eq!(Width::Single(3.0).to_string(), "3");
        assert_eq!(Width::Slabs(vec![1.0, 1.5]).to_string(), "1,1.5");
        assert_eq!(Width::Slabs(vec![1.0, 1.5]).slab_count(), 2);
    }

    #[test]
    fn test_log_width_known_values() {
        assert_approx_eq!(f64, log_width(64).unwrap(), 3.0);
        assert_approx_eq!(f64, log_width(4).unwrap(), 1.0);
        assert_approx_eq!(f64, log_width(1).unwrap(), 0.0);
        assert_approx_eq!(f64, log_width(512).unwrap(), 4.5);
    }

    #[test]
    fn test_log_width_rejects_zero() {
        assert_eq!(log_width(0), Err(Error::Domain { filters: 0 }));
    }

    proptest! {
        #[test]
        fn prop_log_width_is_monotonic(a in 1u32..100_000, b in 1u32..100_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(log_width(lo).unwrap() <= log_width(hi).unwrap());
        }
    }
}
