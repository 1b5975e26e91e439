//! Three-axis boxes: the `Box`, `RightBandedBox` and `LeftBandedBox` pics.
//!
//! A [`BlockBox`] is fully resolved: every value it carries is written out
//! as-is. Optional keys (`caption`, `xlabel`, `zlabel`, `bandfill`,
//! `opacity`) are emitted only when set.

use log::trace;
use serde::Deserialize;

use crate::{
    anchor::Target,
    color::Fill,
    draw::fragment::{Fragment, FragmentBuilder, STATEMENT_DEPTH},
    error::{Error, Result},
    geometry::{BoxSize, Offset, Width, join_numbers},
    identifier::BlockName,
};

/// Which face of a banded box carries the activation band.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandSide {
    #[default]
    Right,
    Left,
}

/// The secondary activation band of a banded box.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    side: BandSide,
    fill: Fill,
}

impl Band {
    pub fn new(side: BandSide, fill: Fill) -> Self {
        Self { side, fill }
    }

    pub fn side(&self) -> BandSide {
        self.side
    }
}

/// A box placed at an offset from a target.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockBox {
    name: BlockName,
    at: Target,
    offset: Offset,
    options: Option<String>,
    fill: Fill,
    band: Option<Band>,
    opacity: Option<f64>,
    caption: Option<String>,
    filters: Vec<u32>,
    z_label: Option<String>,
    size: BoxSize,
    width: Width,
}

impl BlockBox {
    /// Creates a plain box at the origin with the default size and a unit width.
    pub fn new(name: BlockName, fill: Fill) -> Self {
        Self {
            name,
            at: Target::origin(),
            offset: Offset::ZERO,
            options: None,
            fill,
            band: None,
            opacity: None,
            caption: None,
            filters: Vec::new(),
            z_label: None,
            size: BoxSize::default(),
            width: Width::Single(1.0),
        }
    }

    pub fn name(&self) -> &BlockName {
        &self.name
    }

    /// Returns this box placed at `target`
    pub fn at(mut self, target: Target) -> Self {
        self.at = target;
        self
    }

    /// Returns this box shifted by `offset` from its target
    pub fn with_offset(mut self, offset: Offset) -> Self {
        self.offset = offset;
        self
    }

    /// Returns this box with extra `\pic` options
    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        let options = options.into();
        self.options = (!options.is_empty()).then_some(options);
        self
    }

    pub fn with_band(mut self, band: Band) -> Self {
        self.band = Some(band);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Returns this box labelled with its filter counts, one per slab
    pub fn with_filters(mut self, filters: Vec<u32>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_z_label(mut self, z_label: impl Into<String>) -> Self {
        self.z_label = Some(z_label.into());
        self
    }

    pub fn with_size(mut self, size: BoxSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_width(mut self, width: impl Into<Width>) -> Self {
        self.width = width.into();
        self
    }

    fn pic(&self) -> &'static str {
        match self.band.as_ref().map(Band::side) {
            None => "Box",
            Some(BandSide::Right) => "RightBandedBox",
            Some(BandSide::Left) => "LeftBandedBox",
        }
    }

    fn validate(&self) -> Result<()> {
        match &self.width {
            Width::Slabs(slabs)
                if !self.filters.is_empty() && slabs.len() != self.filters.len() =>
            {
                Err(Error::ShapeMismatch {
                    what: "filters",
                    expected: slabs.len(),
                    found: self.filters.len(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Emits a box, banded or plain.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] when the width lists sub-slabs and the
/// filter-count label does not list exactly one count per slab.
///
/// # Examples
///
/// ```
/// # use plotnet_core::color::LayerColor;
/// # use plotnet_core::draw::{BlockBox, emit_box};
/// # use plotnet_core::identifier::BlockName;
/// let block = BlockBox::new(BlockName::new("conv_1"), LayerColor::Conv.into())
///     .with_filters(vec![64, 128])
///     .with_width(vec![1.0]);
/// assert!(emit_box(&block).is_err());
/// ```
pub fn emit_box(block: &BlockBox) -> Result<Fragment> {
    block.validate()?;
    trace!(name = block.name.as_str(), pic = block.pic(); "Emitting box");

    let mut shift = format!("shift={{{}}}", block.offset);
    if let Some(options) = &block.options {
        shift.push_str(", ");
        shift.push_str(options);
    }

    let keys = STATEMENT_DEPTH + 2;
    let mut builder = FragmentBuilder::new();
    builder
        .statement(format!("\\pic[{shift}] at ({})", block.at))
        .line(STATEMENT_DEPTH + 1, format!("{{{}={{", block.pic()))
        .line(keys, format!("name={},", block.name));
    if let Some(caption) = &block.caption {
        builder.line(keys, format!("caption={caption},"));
    }
    if !block.filters.is_empty() {
        builder.line(keys, format!("xlabel={{({},)}},", join_numbers(&block.filters)));
    }
    if let Some(z_label) = &block.z_label {
        builder.line(keys, format!("zlabel={z_label},"));
    }
    builder.line(keys, format!("fill={},", block.fill));
    if let Some(band) = &block.band {
        builder.line(keys, format!("bandfill={},", band.fill));
    }
    if let Some(opacity) = block.opacity {
        builder.line(keys, format!("opacity={opacity},"));
    }
    builder
        .line(keys, format!("height={},", block.size.height()))
        .line(keys, format!("width={{{}}},", block.width))
        .line(keys, format!("depth={}", block.size.depth()))
        .line(keys, "}")
        .line(STATEMENT_DEPTH + 1, "};");

    Ok(builder.build())
}
