//! Typed paths drawn between anchors.
//!
//! Every connector is a [`Route`]: a start coordinate followed by ordered
//! [`Segment`]s. A segment joins the previous point to its target with a
//! [`PathOp`] and may carry a node [`Label`] (an arrow glyph, an ellipsis, or
//! an empty node that only keeps the path decorations aligned).
//!
//! ```
//! # use plotnet_core::anchor::Anchor;
//! # use plotnet_core::identifier::BlockName;
//! # use plotnet_core::draw::{ConnectionStyle, Coord, Label, Route, Segment};
//! let from = BlockName::new("conv_1").at(Anchor::East);
//! let to = BlockName::new("conv_2").at(Anchor::West);
//!
//! let route = Route::new(ConnectionStyle::Connection, Coord::anchor(from))
//!     .then(Segment::line(Coord::anchor(to)).with_label(Label::arrow()));
//! assert_eq!(
//!     route.emit().as_str(),
//!     "        \\draw [connection] (conv_1-east) -- node [fillwhite] {\\midarrow} (conv_2-west);\n"
//! );
//! ```

use std::fmt;

use crate::{
    anchor::{AnchorRef, Target},
    draw::{
        fragment::{Fragment, FragmentBuilder, STATEMENT_DEPTH},
        stroke::ConnectionStyle,
    },
    geometry::Offset,
    identifier::BlockName,
};

/// Arrow glyph macro drawn at the middle of regular connections.
pub const MIDARROW: &str = "\\midarrow";
/// Arrow glyph macro drawn on copy connections.
pub const COPY_MIDARROW: &str = "\\copymidarrow";

/// The two perpendicular projections of TikZ coordinate calculus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// `(a |- b)`: x of `a`, y of `b`
    VerticalHorizontal,
    /// `(a -| b)`: y of `a`, x of `b`
    HorizontalVertical,
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VerticalHorizontal => f.write_str("|-"),
            Self::HorizontalVertical => f.write_str("-|"),
        }
    }
}

/// A relative step, in the drawing plane or in all three axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Planar(f64, f64),
    Spatial(Offset),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Planar(x, y) => write!(f, "({x},{y})"),
            Self::Spatial(offset) => write!(f, "{offset}"),
        }
    }
}

/// One point of a route.
#[derive(Debug, Clone, PartialEq)]
pub enum Coord {
    /// A named anchor or an explicit point.
    At(Target),
    /// The perpendicular projection of two anchors.
    Project {
        from: AnchorRef,
        projection: Projection,
        onto: AnchorRef,
    },
    /// A step relative to the previous point that also moves the current
    /// position (`++`).
    Shift(Step),
    /// A step relative to the previous point that leaves the current
    /// position in place (`+`).
    Relative(Step),
}

impl Coord {
    /// A coordinate at a named anchor
    pub fn anchor(anchor: AnchorRef) -> Self {
        Self::At(Target::Anchor(anchor))
    }

    /// The point with the x of `from` and the y of `onto`
    pub fn below(from: AnchorRef, onto: AnchorRef) -> Self {
        Self::Project {
            from,
            projection: Projection::VerticalHorizontal,
            onto,
        }
    }

    /// The point with the y of `from` and the x of `onto`
    pub fn beside(from: AnchorRef, onto: AnchorRef) -> Self {
        Self::Project {
            from,
            projection: Projection::HorizontalVertical,
            onto,
        }
    }
}

impl From<AnchorRef> for Coord {
    fn from(anchor: AnchorRef) -> Self {
        Self::anchor(anchor)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(target) => write!(f, "({target})"),
            Self::Project {
                from,
                projection,
                onto,
            } => write!(f, "({from} {projection} {onto})"),
            Self::Shift(step) => write!(f, "++{step}"),
            Self::Relative(step) => write!(f, "+{step}"),
        }
    }
}

/// How a segment joins the previous point to its target.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PathOp {
    /// Straight line, `--`
    #[default]
    Line,
    /// Horizontal then vertical, `-|`
    HorizontalVertical,
    /// Vertical then horizontal, `|-`
    VerticalHorizontal,
    /// Jump without drawing
    Move,
}

impl PathOp {
    fn prefix(self) -> &'static str {
        match self {
            Self::Line => "-- ",
            Self::HorizontalVertical => "-| ",
            Self::VerticalHorizontal => "|- ",
            Self::Move => "",
        }
    }
}

/// A `node` placed on a segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Label {
    options: Option<String>,
    name: Option<BlockName>,
    content: String,
}

impl Label {
    /// Creates a label showing `content`
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// An empty node, `node {}`
    pub fn empty() -> Self {
        Self::default()
    }

    /// The middle arrow on a white background used by short connections
    pub fn arrow() -> Self {
        Self::new(MIDARROW).with_options("fillwhite")
    }

    /// Returns this label with node options, e.g. `pos=0.55`
    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// Returns this label with a node name so later fragments can refer to it
    pub fn with_name(mut self, name: BlockName) -> Self {
        self.name = Some(name);
        self
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("node")?;
        if let Some(options) = &self.options {
            write!(f, " [{options}]")?;
        }
        if let Some(name) = &self.name {
            write!(f, " ({name})")?;
        }
        write!(f, " {{{}}}", self.content)
    }
}

/// One leg of a route.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    op: PathOp,
    label: Option<Label>,
    to: Coord,
}

impl Segment {
    /// Creates a segment joining the previous point to `to` with `op`
    pub fn new(op: PathOp, to: Coord) -> Self {
        Self {
            op,
            label: None,
            to,
        }
    }

    /// A straight segment
    pub fn line(to: Coord) -> Self {
        Self::new(PathOp::Line, to)
    }

    /// A jump to `to` that draws nothing
    pub fn move_to(to: Coord) -> Self {
        Self::new(PathOp::Move, to)
    }

    /// Returns this segment carrying a node label
    pub fn with_label(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }

    /// Returns the segment target
    pub fn to(&self) -> &Coord {
        &self.to
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.op.prefix())?;
        if let Some(label) = &self.label {
            write!(f, "{label} ")?;
        }
        write!(f, "{}", self.to)
    }
}

/// A drawn path: a style, a start point, and ordered segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    style: ConnectionStyle,
    options: Option<String>,
    start: Coord,
    segments: Vec<Segment>,
}

impl Route {
    /// Creates a route with no segments starting at `start`
    pub fn new(style: ConnectionStyle, start: Coord) -> Self {
        Self {
            style,
            options: None,
            start,
            segments: Vec::new(),
        }
    }

    /// Creates a route through `points`, joined by straight segments
    /// carrying the corresponding `labels`.
    ///
    /// Extra labels are ignored; segments without a label are left bare.
    pub fn polyline(
        style: ConnectionStyle,
        start: Coord,
        points: impl IntoIterator<Item = Coord>,
        labels: impl IntoIterator<Item = Label>,
    ) -> Self {
        let mut labels = labels.into_iter();
        let segments = points
            .into_iter()
            .map(|point| {
                let segment = Segment::line(point);
                match labels.next() {
                    Some(label) => segment.with_label(label),
                    None => segment,
                }
            })
            .collect();
        Self {
            style,
            options: None,
            start,
            segments,
        }
    }

    /// Returns this route with extra draw options appended after the style
    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        let options = options.into();
        self.options = (!options.is_empty()).then_some(options);
        self
    }

    /// Returns this route with one more segment
    pub fn then(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Returns the start point
    pub fn start(&self) -> &Coord {
        &self.start
    }

    /// Returns the segments in drawing order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Emits the `\draw` statement.
    ///
    /// A route with a single segment is written on one line; longer routes
    /// put every point on its own line.
    pub fn emit(&self) -> Fragment {
        let command = match &self.options {
            Some(options) => format!("\\draw [{}, {options}]", self.style),
            None => format!("\\draw [{}]", self.style),
        };

        let mut builder = FragmentBuilder::new();
        match self.segments.as_slice() {
            [] => builder.statement(format!("{command} {};", self.start)),
            [segment] => builder.statement(format!("{command} {} {segment};", self.start)),
            [init @ .., last] => {
                builder.statement(&command);
                builder.line(STATEMENT_DEPTH + 1, self.start.to_string());
                for segment in init {
                    builder.line(STATEMENT_DEPTH + 1, segment.to_string());
                }
                builder.line(STATEMENT_DEPTH + 1, format!("{last};"))
            }
        };
        builder.build()
    }
}
