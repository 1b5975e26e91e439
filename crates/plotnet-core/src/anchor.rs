//! Anchors: named reference points on block boundaries.
//!
//! Every block defined by the layer macros exposes anchors such as `east`,
//! `nearnorthwest` or `anchor` (its centre). A reference to a block anchor
//! renders as `<block-name>-<anchor-suffix>`, e.g. `conv_1-east`.
//!
//! Anchor suffixes are only meaningful for the kind of block that defines
//! them: `near`/`far` exist only on three-axis boxes, while auxiliary
//! coordinates introduced by connectors are referenced with [`Anchor::Dummy`]
//! and [`Anchor::Top`].
//!
//! Textual references are parsed with [`winnow`]:
//!
//! ```
//! # use plotnet_core::anchor::{Anchor, AnchorRef, Target};
//! let reference: AnchorRef = "conv_1-east".parse().unwrap();
//! assert_eq!(reference.anchor(), Some(Anchor::East));
//!
//! let target: Target = "(0, 0, 0)".parse().unwrap();
//! assert_eq!(target.to_string(), "0,0,0");
//! ```

use std::{fmt, str::FromStr};

use serde::Deserialize;
use winnow::{
    Parser,
    ascii::space0,
    combinator::{alt, delimited, opt, preceded},
    error::{ContextError, ErrMode},
    token::take_while,
};

use crate::{
    error::{Error, Result},
    geometry::Offset,
    identifier::BlockName,
};

type IResult<O> = std::result::Result<O, ErrMode<ContextError>>;

/// A named reference point on a block boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Anchor {
    East,
    West,
    North,
    South,
    Near,
    Far,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
    NearNorthEast,
    NearNorthWest,
    NearSouthEast,
    NearSouthWest,
    FarNorthEast,
    FarNorthWest,
    FarSouthEast,
    FarSouthWest,
    /// The block centre, `-anchor` in the layer macros.
    Center,
    /// Auxiliary coordinate above a block, introduced by skip connectors.
    Top,
    /// Auxiliary coordinate introduced by long connectors.
    Dummy,
}

impl Anchor {
    const ALL: [Anchor; 21] = [
        Self::East,
        Self::West,
        Self::North,
        Self::South,
        Self::Near,
        Self::Far,
        Self::NorthEast,
        Self::NorthWest,
        Self::SouthEast,
        Self::SouthWest,
        Self::NearNorthEast,
        Self::NearNorthWest,
        Self::NearSouthEast,
        Self::NearSouthWest,
        Self::FarNorthEast,
        Self::FarNorthWest,
        Self::FarSouthEast,
        Self::FarSouthWest,
        Self::Center,
        Self::Top,
        Self::Dummy,
    ];

    /// Returns the suffix appended to a block name, without the `-` separator
    pub fn suffix(self) -> &'static str {
        match self {
            Self::East => "east",
            Self::West => "west",
            Self::North => "north",
            Self::South => "south",
            Self::Near => "near",
            Self::Far => "far",
            Self::NorthEast => "northeast",
            Self::NorthWest => "northwest",
            Self::SouthEast => "southeast",
            Self::SouthWest => "southwest",
            Self::NearNorthEast => "nearnortheast",
            Self::NearNorthWest => "nearnorthwest",
            Self::NearSouthEast => "nearsoutheast",
            Self::NearSouthWest => "nearsouthwest",
            Self::FarNorthEast => "farnortheast",
            Self::FarNorthWest => "farnorthwest",
            Self::FarSouthEast => "farsoutheast",
            Self::FarSouthWest => "farsouthwest",
            Self::Center => "anchor",
            Self::Top => "top",
            Self::Dummy => "dummy",
        }
    }

    /// Returns true for anchors on the upper face of a block
    pub fn is_north(self) -> bool {
        self.suffix().contains("north")
    }

    /// Returns the anchor on the opposite horizontal face, directly below or
    /// above this one. Anchors without a vertical component map to themselves.
    pub fn flipped_vertically(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::NorthEast => Self::SouthEast,
            Self::NorthWest => Self::SouthWest,
            Self::SouthEast => Self::NorthEast,
            Self::SouthWest => Self::NorthWest,
            Self::NearNorthEast => Self::NearSouthEast,
            Self::NearNorthWest => Self::NearSouthWest,
            Self::NearSouthEast => Self::NearNorthEast,
            Self::NearSouthWest => Self::NearNorthWest,
            Self::FarNorthEast => Self::FarSouthEast,
            Self::FarNorthWest => Self::FarSouthWest,
            Self::FarSouthEast => Self::FarNorthEast,
            Self::FarSouthWest => Self::FarNorthWest,
            other => other,
        }
    }
}

impl FromStr for Anchor {
    type Err = Error;

    /// Parses an anchor suffix, with or without the leading `-`.
    fn from_str(s: &str) -> Result<Self> {
        let suffix = s.strip_prefix('-').unwrap_or(s);
        Self::ALL
            .into_iter()
            .find(|anchor| anchor.suffix() == suffix)
            .ok_or_else(|| Error::InvalidReference {
                input: s.to_string(),
                reason: "unknown anchor".to_string(),
            })
    }
}

impl TryFrom<String> for Anchor {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// A reference to a named point: a block, optionally narrowed to one of its
/// anchors.
///
/// Named coordinates (such as a bottleneck's residual target) are referenced
/// without an anchor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct AnchorRef {
    node: BlockName,
    anchor: Option<Anchor>,
}

impl AnchorRef {
    /// Creates a reference to `node`, optionally at `anchor`
    pub fn new(node: BlockName, anchor: Option<Anchor>) -> Self {
        Self { node, anchor }
    }

    /// Creates a reference to a named point without an anchor suffix
    pub fn bare(node: BlockName) -> Self {
        Self::new(node, None)
    }

    /// Returns the referenced block or coordinate name
    pub fn node(&self) -> &BlockName {
        &self.node
    }

    /// Returns the anchor, if any
    pub fn anchor(&self) -> Option<Anchor> {
        self.anchor
    }

    /// Returns a reference to another anchor of the same node
    pub fn with_anchor(&self, anchor: Anchor) -> Self {
        Self::new(self.node.clone(), Some(anchor))
    }
}

impl fmt::Display for AnchorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.anchor {
            Some(anchor) => write!(f, "{}-{}", self.node, anchor),
            None => write!(f, "{}", self.node),
        }
    }
}

impl FromStr for AnchorRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_complete(s, anchor_ref)
    }
}

impl TryFrom<String> for AnchorRef {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Where a block or coordinate is placed: an anchor of an earlier block or
/// an explicit point.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub enum Target {
    Anchor(AnchorRef),
    Point(Offset),
}

impl Target {
    /// The diagram origin `(0,0,0)`
    pub fn origin() -> Self {
        Self::Point(Offset::ZERO)
    }
}

impl From<AnchorRef> for Target {
    fn from(anchor: AnchorRef) -> Self {
        Self::Anchor(anchor)
    }
}

impl fmt::Display for Target {
    /// Renders the contents of a TikZ coordinate, without parentheses.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anchor(anchor) => write!(f, "{anchor}"),
            Self::Point(point) => write!(f, "{},{},{}", point.x(), point.y(), point.z()),
        }
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_complete(
            s,
            alt((point.map(Target::Point), anchor_ref.map(Target::Anchor))),
        )
    }
}

impl TryFrom<String> for Target {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Runs `parser` over the whole of `s`, rejecting trailing input.
fn parse_complete<'a, O>(
    s: &'a str,
    mut parser: impl Parser<&'a str, O, ErrMode<ContextError>>,
) -> Result<O> {
    let invalid = |reason: &str| Error::InvalidReference {
        input: s.to_string(),
        reason: reason.to_string(),
    };

    let mut input = s.trim();
    let value = parser
        .parse_next(&mut input)
        .map_err(|_| invalid("malformed reference"))?;
    if !input.is_empty() {
        return Err(invalid("unexpected trailing input"));
    }
    Ok(value)
}

fn node_name<'a>(input: &mut &'a str) -> IResult<&'a str> {
    take_while(1.., |c: char| {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':')
    })
    .parse_next(input)
}

fn anchor_suffix(input: &mut &str) -> IResult<Anchor> {
    preceded('-', take_while(1.., |c: char| c.is_ascii_alphabetic()))
        .try_map(Anchor::from_str)
        .parse_next(input)
}

fn anchor_ref(input: &mut &str) -> IResult<AnchorRef> {
    (node_name, opt(anchor_suffix))
        .map(|(node, anchor)| AnchorRef::new(BlockName::new(node), anchor))
        .parse_next(input)
}

fn number(input: &mut &str) -> IResult<f64> {
    delimited(
        space0,
        take_while(1.., |c: char| {
            c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')
        }),
        space0,
    )
    .try_map(str::parse::<f64>)
    .parse_next(input)
}

fn triple(input: &mut &str) -> IResult<Offset> {
    (number, ',', number, ',', number)
        .map(|(x, _, y, _, z)| Offset::new(x, y, z))
        .parse_next(input)
}

fn point(input: &mut &str) -> IResult<Offset> {
    alt((delimited('(', triple, ')'), triple)).parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_suffix_round_trip() {
        for anchor in Anchor::ALL {
            assert_eq!(anchor.suffix().parse::<Anchor>().unwrap(), anchor);
        }
    }

    #[test]
    fn test_anchor_accepts_leading_dash() {
        assert_eq!("-east".parse::<Anchor>().unwrap(), Anchor::East);
        assert_eq!("-anchor".parse::<Anchor>().unwrap(), Anchor::Center);
    }

    #[test]
    fn test_anchor_unknown() {
        let err = "sideways".parse::<Anchor>().unwrap_err();
        assert!(matches!(err, Error::InvalidReference { .. }));
    }

    #[test]
    fn test_anchor_is_north() {
        assert!(Anchor::North.is_north());
        assert!(Anchor::FarNorthWest.is_north());
        assert!(!Anchor::South.is_north());
        assert!(!Anchor::East.is_north());
    }

    #[test]
    fn test_anchor_flipped_vertically() {
        assert_eq!(Anchor::NorthEast.flipped_vertically(), Anchor::SouthEast);
        assert_eq!(Anchor::FarSouthWest.flipped_vertically(), Anchor::FarNorthWest);
        assert_eq!(Anchor::East.flipped_vertically(), Anchor::East);
        for anchor in Anchor::ALL {
            assert_eq!(anchor.flipped_vertically().flipped_vertically(), anchor);
        }
    }

    #[test]
    fn test_anchor_ref_display() {
        let reference = AnchorRef::new(BlockName::new("conv_1"), Some(Anchor::NearNorthEast));
        assert_eq!(reference.to_string(), "conv_1-nearnortheast");

        let bare = AnchorRef::bare(BlockName::new("enc_connection"));
        assert_eq!(bare.to_string(), "enc_connection");
    }

    #[test]
    fn test_anchor_ref_parse() {
        let reference: AnchorRef = "conv_12-farsouthwest".parse().unwrap();
        assert_eq!(reference.node().as_str(), "conv_12");
        assert_eq!(reference.anchor(), Some(Anchor::FarSouthWest));

        let bare: AnchorRef = "input".parse().unwrap();
        assert_eq!(bare.anchor(), None);
    }

    #[test]
    fn test_anchor_ref_parse_rejects_unknown_suffix() {
        assert!("conv_1-upwards".parse::<AnchorRef>().is_err());
        assert!("conv 1".parse::<AnchorRef>().is_err());
        assert!("".parse::<AnchorRef>().is_err());
    }

    #[test]
    fn test_target_parse_point() {
        let target: Target = "(1, 0, -2.5)".parse().unwrap();
        assert_eq!(target, Target::Point(Offset::new(1.0, 0.0, -2.5)));

        let bare: Target = "0,0,0".parse().unwrap();
        assert_eq!(bare, Target::origin());
    }

    #[test]
    fn test_target_parse_anchor() {
        let target: Target = "pool_1-east".parse().unwrap();
        assert_eq!(target.to_string(), "pool_1-east");
    }

    #[test]
    fn test_target_parse_rejects_partial_point() {
        assert!("(1, 0)".parse::<Target>().is_err());
        assert!("1,0,x".parse::<Target>().is_err());
    }
}
