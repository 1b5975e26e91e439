//! Connectors between block anchors.
//!
//! Each [`Connector`] variant is turned into a [`Route`] and, for the routed
//! variants, the auxiliary coordinates the route passes through. Auxiliary
//! coordinates are named deterministically after the block they belong to
//! (`<block>-dummy`, `<block>-top`) so later fragments can reuse them.
//!
//! # Long connectors
//!
//! A long connector from `A-north` (with base anchor `A-south`) to `B-north`
//! first places `A-dummy` on the line through `A-south` and `A-north` at the
//! requested fraction, then projects it onto `B`'s axis as `B-dummy`:
//!
//! ```text
//!      (A-north |- A-dummy) ────────► (A-dummy -| B-north)
//!             ▲                              │
//!             │                              ▼
//!          A-north                        B-north
//! ```
//!
//! The reversed variant walks the same points in the opposite order.

use std::fmt;

use log::trace;
use serde::Deserialize;

use crate::{
    anchor::{Anchor, AnchorRef, Target},
    draw::{
        annotation::{coordinate_along, coordinate_projected},
        fragment::Fragment,
        route::{COPY_MIDARROW, Coord, Label, MIDARROW, PathOp, Route, Segment, Step},
        stroke::ConnectionStyle,
    },
    geometry::Offset,
    identifier::BlockName,
};

/// Default fraction, past the base anchor, at which routed connectors turn.
pub const DEFAULT_POSITION: f64 = 1.25;

const ELLIPSIS_LABEL: &str = "\\ldots";
const ELLIPSIS_NODE: &str = "fill=white,inner sep=1pt, opacity=1";

/// The shape of a connector.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Connector {
    /// One straight segment with a middle arrow.
    Short,
    /// Right-angle route over the source block through auxiliary coordinates.
    Long {
        #[serde(default = "default_position")]
        position: f64,
    },
    /// [`Connector::Long`] traversed from target to source.
    LongReversed {
        #[serde(default = "default_position")]
        position: f64,
    },
    /// A hop by `shift` (usually along the depth axis), then straight to the target.
    ZAxis {
        #[serde(default = "default_z_shift")]
        shift: Offset,
    },
    /// Copy path lifted over the blocks between source and target.
    Skip {
        #[serde(default = "default_position")]
        position: f64,
    },
    /// External input merging into a block.
    Fuse {
        #[serde(default = "default_fuse_x")]
        x_shift: f64,
        #[serde(default = "default_fuse_y")]
        y_shift: f64,
    },
    /// Two straight segments through an intermediate point.
    Double { over: Target },
    /// A straight segment labelled with an ellipsis.
    Ellipsis,
}

fn default_position() -> f64 {
    DEFAULT_POSITION
}

fn default_z_shift() -> Offset {
    Offset::along_x(1.0)
}

fn default_fuse_x() -> f64 {
    0.5
}

fn default_fuse_y() -> f64 {
    1.0
}

impl Connector {
    /// A long connector turning at [`DEFAULT_POSITION`]
    pub fn long() -> Self {
        Self::Long {
            position: DEFAULT_POSITION,
        }
    }

    /// A reversed long connector turning at [`DEFAULT_POSITION`]
    pub fn long_reversed() -> Self {
        Self::LongReversed {
            position: DEFAULT_POSITION,
        }
    }

    /// A z-axis connector. A non-zero `z_shift` hops along the depth axis,
    /// otherwise the hop is one unit along the primary axis.
    pub fn z_axis(z_shift: f64) -> Self {
        let shift = if z_shift == 0.0 {
            default_z_shift()
        } else {
            Offset::new(0.0, 0.0, z_shift)
        };
        Self::ZAxis { shift }
    }

    /// A fuse connector with the default shifts
    pub fn fuse() -> Self {
        Self::Fuse {
            x_shift: default_fuse_x(),
            y_shift: default_fuse_y(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Long { .. } => "long",
            Self::LongReversed { .. } => "long_reversed",
            Self::ZAxis { .. } => "z_axis",
            Self::Skip { .. } => "skip",
            Self::Fuse { .. } => "fuse",
            Self::Double { .. } => "double",
            Self::Ellipsis => "ellipsis",
        }
    }
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// The endpoints and draw options of one connector.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    of: AnchorRef,
    to: AnchorRef,
    options: Option<String>,
    label_name: Option<BlockName>,
}

impl Link {
    /// Creates a link from anchor `of` to anchor `to`
    pub fn new(of: AnchorRef, to: AnchorRef) -> Self {
        Self {
            of,
            to,
            options: None,
            label_name: None,
        }
    }

    /// Returns this link with extra draw options, e.g. `pos=0.55`
    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        let options = options.into();
        self.options = (!options.is_empty()).then_some(options);
        self
    }

    /// Returns this link with its label node named, so the middle of the
    /// connector can be referenced as a coordinate
    pub fn with_label_name(mut self, name: BlockName) -> Self {
        self.label_name = Some(name);
        self
    }

    pub fn of(&self) -> &AnchorRef {
        &self.of
    }

    pub fn to(&self) -> &AnchorRef {
        &self.to
    }

    fn label(&self, label: Label) -> Label {
        match &self.label_name {
            Some(name) => label.with_name(name.clone()),
            None => label,
        }
    }

    fn route(&self, style: ConnectionStyle) -> Route {
        let route = Route::new(style, Coord::anchor(self.of.clone()));
        match &self.options {
            Some(options) => route.with_options(options.clone()),
            None => route,
        }
    }
}

/// Emits one connector.
///
/// For [`Connector::Long`] and [`Connector::LongReversed`] the `of` anchor is
/// where the route leaves the source block; the auxiliary coordinate is
/// placed along the line from the vertically opposite anchor through it.
/// [`Connector::Skip`] treats both anchors the same way.
///
/// # Examples
///
/// ```
/// # use plotnet_core::anchor::Anchor;
/// # use plotnet_core::draw::{Connector, Link, emit_connector};
/// # use plotnet_core::identifier::BlockName;
/// let link = Link::new(
///     BlockName::new("conv_1").at(Anchor::East),
///     BlockName::new("conv_2").at(Anchor::West),
/// );
/// let fragment = emit_connector(&Connector::Short, &link);
/// assert_eq!(
///     fragment.as_str(),
///     "        \\draw [connection] (conv_1-east) -- node [fillwhite] {\\midarrow} (conv_2-west);\n"
/// );
/// ```
pub fn emit_connector(connector: &Connector, link: &Link) -> Fragment {
    trace!(kind = connector.kind(), of:% = link.of, to:% = link.to; "Emitting connector");

    match connector {
        Connector::Short => link
            .route(ConnectionStyle::Connection)
            .then(Segment::line(link.to.clone().into()).with_label(link.label(Label::arrow())))
            .emit(),
        Connector::Long { position } => emit_long(link, *position, false),
        Connector::LongReversed { position } => emit_long(link, *position, true),
        Connector::ZAxis { shift } => link
            .route(ConnectionStyle::Connection)
            .then(Segment::line(Coord::Shift(Step::Spatial(*shift))).with_label(Label::empty()))
            .then(
                Segment::line(link.to.clone().into())
                    .with_label(link.label(Label::new(MIDARROW))),
            )
            .emit(),
        Connector::Skip { position } => emit_skip_route(link, *position),
        Connector::Fuse { x_shift, y_shift } => {
            let y_shift = if link.to.anchor().is_some_and(Anchor::is_north) {
                -y_shift
            } else {
                *y_shift
            };
            link.route(ConnectionStyle::Fuse)
                .then(Segment::move_to(Coord::Shift(Step::Planar(*x_shift, 0.0))))
                .then(Segment::new(
                    PathOp::HorizontalVertical,
                    Coord::Relative(Step::Planar(0.0, y_shift)),
                ))
                .then(Segment::line(link.to.clone().into()))
                .emit()
        }
        Connector::Double { over } => link
            .route(ConnectionStyle::Connection)
            .then(Segment::line(Coord::At(over.clone())).with_label(Label::empty()))
            .then(Segment::line(link.to.clone().into()).with_label(link.label(Label::arrow())))
            .emit(),
        Connector::Ellipsis => link
            .route(ConnectionStyle::Connection)
            .then(
                Segment::line(link.to.clone().into())
                    .with_label(link.label(Label::new(ELLIPSIS_LABEL).with_options(ELLIPSIS_NODE))),
            )
            .emit(),
    }
}

/// Emits a skip connector from the top-right edge of `of` to the top of `to`.
pub fn emit_skip(of: &BlockName, to: &BlockName, position: f64) -> Fragment {
    emit_connector(
        &Connector::Skip { position },
        &Link::new(of.at(Anchor::NorthEast), to.at(Anchor::North)),
    )
}

/// The anchor opposite `anchor` across its block, marking where the line
/// that auxiliary coordinates are placed on starts.
///
/// A bare reference, or an anchor with no vertical opposite (`east`, `near`,
/// ...), falls back to the block's south face so the line never collapses
/// to a point.
fn base_of(anchor: &AnchorRef) -> AnchorRef {
    match anchor.anchor() {
        Some(side) if side.flipped_vertically() != side => {
            anchor.with_anchor(side.flipped_vertically())
        }
        _ => anchor.node().at(Anchor::South),
    }
}

fn emit_long(link: &Link, position: f64, reversed: bool) -> Fragment {
    let source = &link.of;
    let target = &link.to;
    let source_dummy = source.node().at(Anchor::Dummy);
    let target_dummy = target.node().at(Anchor::Dummy);

    let source_turn = Coord::below(source.clone(), source_dummy.clone());
    let target_turn = Coord::beside(source_dummy.clone(), target.clone());
    let (start, first_turn, second_turn, end) = if reversed {
        (target, target_turn, source_turn, source)
    } else {
        (source, source_turn, target_turn, target)
    };

    let route = Route::new(ConnectionStyle::Connection, Coord::anchor(start.clone()))
        .with_options(link.options.clone().unwrap_or_default())
        .then(Segment::line(first_turn).with_label(Label::empty()))
        .then(Segment::line(second_turn).with_label(link.label(Label::new(MIDARROW))))
        .then(Segment::line(end.clone().into()).with_label(Label::empty()));

    let mut text =
        coordinate_along(&source_dummy, &base_of(source), source, position).into_string();
    text.push_str(
        coordinate_projected(&target_dummy, &Coord::below(source_dummy, target.clone())).as_str(),
    );
    text.push_str(route.emit().as_str());
    Fragment::new(text)
}

fn emit_skip_route(link: &Link, position: f64) -> Fragment {
    let source_top = link.of.node().at(Anchor::Top);
    let target_top = link.to.node().at(Anchor::Top);

    let route = Route::polyline(
        ConnectionStyle::Copy,
        Coord::anchor(link.of.clone()),
        [
            Coord::anchor(source_top.clone()),
            Coord::anchor(target_top.clone()),
            Coord::anchor(link.to.clone()),
        ],
        std::iter::repeat_with(|| Label::new(COPY_MIDARROW)).take(3),
    );

    let mut text =
        coordinate_along(&source_top, &base_of(&link.of), &link.of, position).into_string();
    text.push_str(coordinate_along(&target_top, &base_of(&link.to), &link.to, position).as_str());
    text.push_str(route.emit().as_str());
    Fragment::new(text)
}

/// Emits the four dashed lines joining the east corners of `of` to the west
/// corners of `to`, depicting a change of spatial size.
///
/// With `close_rim`, the east face of `of` is outlined as well.
pub fn emit_resample(of: &BlockName, to: &BlockName, close_rim: bool) -> Fragment {
    const CORNERS: [(Anchor, Anchor); 4] = [
        (Anchor::NearNorthEast, Anchor::NearNorthWest),
        (Anchor::NearSouthEast, Anchor::NearSouthWest),
        (Anchor::FarSouthEast, Anchor::FarSouthWest),
        (Anchor::FarNorthEast, Anchor::FarNorthWest),
    ];

    let mut route = dashed_pairs(of, to, &CORNERS);
    if close_rim {
        route = route.then(Segment::move_to(of.at(CORNERS[0].0).into()));
        for (corner, _) in &CORNERS[1..] {
            route = route.then(Segment::line(of.at(*corner).into()));
        }
    }
    route.emit()
}

/// Emits the ten dashed lines depicting a dense connection between two blocks.
pub fn emit_full_connection(of: &BlockName, to: &BlockName) -> Fragment {
    const PAIRS: [(Anchor, Anchor); 10] = [
        (Anchor::NearNorthEast, Anchor::FarNorthWest),
        (Anchor::NearNorthEast, Anchor::NearNorthWest),
        (Anchor::FarNorthEast, Anchor::NearNorthWest),
        (Anchor::FarNorthEast, Anchor::FarNorthWest),
        (Anchor::FarNorthEast, Anchor::NearSouthWest),
        (Anchor::NearSouthEast, Anchor::FarSouthWest),
        (Anchor::NearSouthEast, Anchor::NearSouthWest),
        (Anchor::NearSouthEast, Anchor::FarNorthWest),
        (Anchor::FarSouthEast, Anchor::NearSouthWest),
        (Anchor::FarSouthEast, Anchor::FarSouthWest),
    ];

    dashed_pairs(of, to, &PAIRS).emit()
}

fn dashed_pairs(of: &BlockName, to: &BlockName, pairs: &[(Anchor, Anchor)]) -> Route {
    let mut pairs = pairs.iter();
    let Some((first_of, first_to)) = pairs.next() else {
        return Route::new(ConnectionStyle::DenselyDashed, of.bare().into());
    };

    let mut route = Route::new(ConnectionStyle::DenselyDashed, of.at(*first_of).into())
        .then(Segment::line(to.at(*first_to).into()));
    for (corner_of, corner_to) in pairs {
        route = route
            .then(Segment::move_to(of.at(*corner_of).into()))
            .then(Segment::line(to.at(*corner_to).into()));
    }
    route
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(name: &str) -> BlockName {
        BlockName::new(name)
    }

    fn long_link() -> Link {
        Link::new(block("A").at(Anchor::North), block("B").at(Anchor::North))
    }

    #[test]
    fn test_short_connector_with_options_and_name() {
        let link = Link::new(block("conv_1").at(Anchor::East), block("enc_0").at(Anchor::West))
            .with_options("pos=0.55")
            .with_label_name(block("enc_connection"));
        assert_eq!(
            emit_connector(&Connector::Short, &link).as_str(),
            "        \\draw [connection, pos=0.55] (conv_1-east) -- node [fillwhite] (enc_connection) {\\midarrow} (enc_0-west);\n"
        );
    }

    #[test]
    fn test_long_connector_routing() {
        let text = emit_connector(&Connector::long(), &long_link()).into_string();
        let expected = concat!(
            "        \\path (A-south) -- (A-north) coordinate[pos=1.25] (A-dummy);\n",
            "        \\path (A-dummy |- B-north) coordinate (B-dummy);\n",
            "        \\draw [connection]\n",
            "            (A-north)\n",
            "            -- node {} (A-north |- A-dummy)\n",
            "            -- node {\\midarrow} (A-dummy -| B-north)\n",
            "            -- node {} (B-north);\n",
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_long_reversed_keeps_coordinates() {
        let forward = emit_connector(&Connector::long(), &long_link()).into_string();
        let reversed = emit_connector(&Connector::long_reversed(), &long_link()).into_string();

        let aux = |text: &str| -> Vec<String> {
            text.lines()
                .filter(|line| line.trim_start().starts_with("\\path"))
                .map(str::to_string)
                .collect()
        };
        assert_eq!(aux(&forward), aux(&reversed));

        let path_lines = |text: &str| -> Vec<String> {
            text.lines()
                .skip(3)
                .map(|line| line.trim().trim_end_matches(';').to_string())
                .collect()
        };
        let forward_points = path_lines(&forward);
        let reversed_points = path_lines(&reversed);
        assert_eq!(reversed_points[0], "(B-north)");
        assert_eq!(reversed_points[1], "-- node {} (A-dummy -| B-north)");
        assert_eq!(reversed_points[2], "-- node {\\midarrow} (A-north |- A-dummy)");
        assert_eq!(reversed_points[3], "-- node {} (A-north)");
        assert_eq!(forward_points.last().map(String::as_str), Some("-- node {} (B-north)"));
    }

    #[test]
    fn test_long_connector_to_bare_coordinate() {
        let link = Link::new(block("enc_3").at(Anchor::North), block("enc_connection").bare());
        let text = emit_connector(&Connector::LongReversed { position: 1.5 }, &link).into_string();
        assert!(text.contains("coordinate[pos=1.5] (enc_3-dummy);"));
        assert!(text.contains("\\path (enc_3-dummy |- enc_connection) coordinate (enc_connection-dummy);"));
        assert!(text.ends_with("-- node {} (enc_3-north);\n"));
    }

    #[test]
    fn test_skip_connector() {
        let text = emit_skip(&block("res_1"), &block("res_3"), 1.25).into_string();
        let expected = concat!(
            "        \\path (res_1-southeast) -- (res_1-northeast) coordinate[pos=1.25] (res_1-top);\n",
            "        \\path (res_3-south) -- (res_3-north) coordinate[pos=1.25] (res_3-top);\n",
            "        \\draw [copyconnection]\n",
            "            (res_1-northeast)\n",
            "            -- node {\\copymidarrow} (res_1-top)\n",
            "            -- node {\\copymidarrow} (res_3-top)\n",
            "            -- node {\\copymidarrow} (res_3-north);\n",
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_z_axis_connector() {
        let link = Link::new(block("a").at(Anchor::Near), block("b").at(Anchor::West));
        let text = emit_connector(&Connector::z_axis(3.0), &link).into_string();
        assert!(text.contains("-- node {} ++(0, 0, 3)\n"));

        let text = emit_connector(&Connector::z_axis(0.0), &link).into_string();
        assert!(text.contains("-- node {} ++(1, 0, 0)\n"));
    }

    #[test]
    fn test_fuse_flips_towards_north_targets() {
        let south = Link::new(block("a").at(Anchor::East), block("b").at(Anchor::South));
        let north = Link::new(block("a").at(Anchor::East), block("b").at(Anchor::North));

        assert!(emit_connector(&Connector::fuse(), &south).as_str().contains("-| +(0,1)"));
        assert!(emit_connector(&Connector::fuse(), &north).as_str().contains("-| +(0,-1)"));
    }

    #[test]
    fn test_double_and_ellipsis() {
        let link = Link::new(block("a").at(Anchor::East), block("b").at(Anchor::West));
        let double = Connector::Double {
            over: "c-north".parse().unwrap(),
        };
        let text = emit_connector(&double, &link).into_string();
        assert!(text.contains("-- node {} (c-north)"));
        assert!(text.contains("-- node [fillwhite] {\\midarrow} (b-west);"));

        let text = emit_connector(&Connector::Ellipsis, &link).into_string();
        assert_eq!(
            text,
            "        \\draw [connection] (a-east) -- node [fill=white,inner sep=1pt, opacity=1] {\\ldots} (b-west);\n"
        );
    }

    #[test]
    fn test_long_from_anchor_without_opposite_uses_south_face() {
        let bare = Link::new(block("a").bare(), block("b").at(Anchor::North));
        let text = emit_connector(&Connector::long(), &bare).into_string();
        assert!(text.contains("\\path (a-south) -- (a) coordinate[pos=1.25] (a-dummy);"));

        let east = Link::new(block("a").at(Anchor::East), block("b").at(Anchor::North));
        let text = emit_connector(&Connector::long(), &east).into_string();
        assert!(text.contains("\\path (a-south) -- (a-east) coordinate[pos=1.25] (a-dummy);"));

        let south = Link::new(block("a").at(Anchor::South), block("b").at(Anchor::North));
        let text = emit_connector(&Connector::long(), &south).into_string();
        assert!(text.contains("\\path (a-north) -- (a-south) coordinate[pos=1.25] (a-dummy);"));
    }

    #[test]
    fn test_resample_and_full_connection() {
        let text = emit_resample(&block("up_0"), &block("up"), true).into_string();
        assert!(text.starts_with("        \\draw [densely dashed]\n            (up_0-nearnortheast)\n"));
        assert_eq!(text.matches("-- (up-").count(), 4);
        assert!(text.ends_with("-- (up_0-farnortheast);\n"));

        let open = emit_resample(&block("up_0"), &block("up"), false).into_string();
        assert!(open.ends_with("-- (up-farnorthwest);\n"));

        let dense = emit_full_connection(&block("fc_1"), &block("fc_2")).into_string();
        assert_eq!(dense.matches("-- (fc_2-").count(), 10);
    }

    #[test]
    fn test_emit_connector_is_idempotent() {
        for connector in [
            Connector::Short,
            Connector::long(),
            Connector::long_reversed(),
            Connector::z_axis(2.0),
            Connector::Skip { position: 1.25 },
            Connector::fuse(),
            Connector::Ellipsis,
        ] {
            assert_eq!(
                emit_connector(&connector, &long_link()),
                emit_connector(&connector, &long_link())
            );
        }
    }
}
