//! Circular operator blocks: the `Ball` pic.

use log::trace;
use serde::Deserialize;

use crate::{
    anchor::Target,
    color::{Fill, LayerColor},
    draw::fragment::{Fragment, FragmentBuilder, STATEMENT_DEPTH},
    geometry::Offset,
    identifier::BlockName,
};

/// Radius of operator balls in the layer diagrams.
pub const BALL_RADIUS: f64 = 2.5;

/// The element-wise operation a ball depicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallOp {
    Sum,
    Multiply,
    Concatenate,
}

impl BallOp {
    /// Returns the glyph drawn inside the ball
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Sum => "$+$",
            Self::Multiply => "$\\times$",
            Self::Concatenate => "$\\oplus$",
        }
    }

    /// Returns the palette colour of this operation
    pub fn color(self) -> LayerColor {
        match self {
            Self::Sum => LayerColor::Sum,
            Self::Multiply => LayerColor::Mult,
            Self::Concatenate => LayerColor::Conc,
        }
    }

    /// Returns the usual opacity of this operation
    pub fn opacity(self) -> f64 {
        match self {
            Self::Sum => 0.4,
            Self::Multiply | Self::Concatenate => 0.6,
        }
    }
}

/// A ball placed at an offset from a target.
#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    name: BlockName,
    op: BallOp,
    at: Target,
    offset: Offset,
    fill: Fill,
    opacity: f64,
    radius: f64,
    caption: Option<String>,
}

impl Ball {
    /// Creates a ball at the origin with the operation's fill and opacity.
    pub fn new(name: BlockName, op: BallOp) -> Self {
        Self {
            name,
            op,
            at: Target::origin(),
            offset: Offset::ZERO,
            fill: op.color().into(),
            opacity: op.opacity(),
            radius: BALL_RADIUS,
            caption: None,
        }
    }

    pub fn name(&self) -> &BlockName {
        &self.name
    }

    pub fn at(mut self, target: Target) -> Self {
        self.at = target;
        self
    }

    pub fn with_offset(mut self, offset: Offset) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_fill(mut self, fill: Fill) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

/// Emits a ball.
pub fn emit_ball(ball: &Ball) -> Fragment {
    trace!(name = ball.name.as_str(), op:? = ball.op; "Emitting ball");

    let keys = STATEMENT_DEPTH + 2;
    let mut builder = FragmentBuilder::new();
    builder
        .statement(format!("\\pic[shift={{{}}}] at ({})", ball.offset, ball.at))
        .line(STATEMENT_DEPTH + 1, "{Ball={")
        .line(keys, format!("name={},", ball.name));
    if let Some(caption) = &ball.caption {
        builder.line(keys, format!("caption={caption},"));
    }
    builder
        .line(keys, format!("fill={},", ball.fill))
        .line(keys, format!("opacity={},", ball.opacity))
        .line(keys, format!("radius={},", ball.radius))
        .line(keys, format!("logo={}", ball.op.glyph()))
        .line(keys, "}")
        .line(STATEMENT_DEPTH + 1, "};");
    builder.build()
}
