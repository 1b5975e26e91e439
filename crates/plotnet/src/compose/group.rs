//! Group composers.
//!
//! A group is a run of `count` blocks named `<prefix>_<start>` to
//! `<prefix>_<start + count - 1>`. The first member is placed at the
//! predecessor shifted by the group offset; every later member is placed at
//! the member before it, either flush against it or spaced by the offset,
//! depending on the variant. Only the last member carries the z-label.
//!
//! Per-member filter counts, sizes and widths are given as [`Broadcast`]
//! values and resolved once, before anything is emitted.

use std::num::NonZeroU32;

use log::debug;
use serde::Deserialize;

use plotnet_core::{
    Error, Result,
    anchor::Anchor,
    color::LayerColor,
    draw::{
        Band, BandSide, BlockBox, Connector, DEFAULT_POSITION, Fragments, Link, emit_box,
        emit_connector, emit_coordinate, emit_skip,
    },
    geometry::{BoxSize, Offset, log_width},
    identifier::{BlockName, Predecessor},
};

use crate::compose::Broadcast;

/// The displacement between group members.
///
/// Deserializes from an `[x, y, z]` offset or from an integer `k`, which
/// stacks members along the depth axis with offset `(-(4/k), 0, k)`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Spacing {
    Depth(NonZeroU32),
    Offset(Offset),
}

impl Default for Spacing {
    fn default() -> Self {
        Self::Offset(Offset::along_x(1.0))
    }
}

impl From<Spacing> for Offset {
    fn from(spacing: Spacing) -> Self {
        match spacing {
            Spacing::Depth(k) => Offset::depth_step(f64::from(k.get())),
            Spacing::Offset(offset) => offset,
        }
    }
}

/// Parameters shared by the group composers.
///
/// ```
/// # use plotnet::compose::{GroupParams, multi_conv};
/// let params = GroupParams::new("enc", 3, "conv_1").starting_at(1).with_z_label("128");
/// let text = multi_conv(&params).unwrap().render();
/// assert!(text.contains("name=enc_1,"));
/// assert!(text.contains("name=enc_3,"));
/// assert_eq!(text.matches("zlabel=").count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupParams {
    prefix: String,
    count: u32,
    #[serde(default)]
    start: u32,
    prev: Predecessor,
    #[serde(default = "default_filters")]
    filters: Broadcast<u32>,
    #[serde(default = "default_size")]
    size: Broadcast<BoxSize>,
    #[serde(default)]
    width: Option<Broadcast<f64>>,
    #[serde(default)]
    z_label: Option<String>,
    #[serde(default)]
    caption_start: Option<u32>,
    #[serde(default)]
    offset: Spacing,
    #[serde(default = "default_anchor")]
    anchor: Anchor,
    #[serde(default = "default_connect")]
    connect: bool,
}

fn default_filters() -> Broadcast<u32> {
    Broadcast::Scalar(64)
}

fn default_size() -> Broadcast<BoxSize> {
    Broadcast::Scalar(BoxSize::default())
}

fn default_anchor() -> Anchor {
    Anchor::East
}

fn default_connect() -> bool {
    true
}

impl GroupParams {
    /// Creates parameters for `count` members named after `prefix`, numbered
    /// from zero, placed after `prev`.
    pub fn new(prefix: impl Into<String>, count: u32, prev: impl Into<Predecessor>) -> Self {
        Self {
            prefix: prefix.into(),
            count,
            start: 0,
            prev: prev.into(),
            filters: default_filters(),
            size: default_size(),
            width: None,
            z_label: None,
            caption_start: None,
            offset: Spacing::default(),
            anchor: default_anchor(),
            connect: default_connect(),
        }
    }

    /// Returns these parameters with members numbered from `start`.
    pub fn starting_at(mut self, start: u32) -> Self {
        self.start = start;
        self
    }

    pub fn with_filters(mut self, filters: Broadcast<u32>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_size(mut self, size: Broadcast<BoxSize>) -> Self {
        self.size = size;
        self
    }

    /// Returns these parameters with explicit widths instead of
    /// `log_4(filters)`.
    pub fn with_width(mut self, width: Broadcast<f64>) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_z_label(mut self, z_label: impl Into<String>) -> Self {
        self.z_label = Some(z_label.into());
        self
    }

    /// Returns these parameters with members captioned `start`, `start + 1`, ...
    pub fn with_caption_start(mut self, start: u32) -> Self {
        self.caption_start = Some(start);
        self
    }

    pub fn with_offset(mut self, offset: impl Into<Spacing>) -> Self {
        self.offset = offset.into();
        self
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_connect(mut self, connect: bool) -> Self {
        self.connect = connect;
        self
    }

    /// Returns the member names in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOverflow`] when the last index does not fit in a
    /// `u32`.
    pub fn names(&self) -> Result<Vec<BlockName>> {
        let end = self.checked_end(self.start)?;
        Ok((self.start..end)
            .map(|index| BlockName::numbered(&self.prefix, index))
            .collect())
    }

    /// Returns the exclusive end of `count` indices numbered from `first`.
    fn checked_end(&self, first: u32) -> Result<u32> {
        first
            .checked_add(self.count)
            .ok_or_else(|| Error::IndexOverflow {
                prefix: self.prefix.clone(),
                start: first,
                count: self.count,
            })
    }

    fn members(&self) -> Result<Vec<Member>> {
        if self.count == 0 {
            return Err(Error::EmptyGroup {
                prefix: self.prefix.clone(),
            });
        }

        let count = self.count as usize;
        let filters = self.filters.resolve(count, "filters")?;
        let sizes = self.size.resolve(count, "size")?;
        let widths = match &self.width {
            Some(width) => width.resolve(count, "width")?,
            None => filters
                .iter()
                .copied()
                .map(log_width)
                .collect::<Result<Vec<_>>>()?,
        };

        let names = self.names()?;
        let captions: Vec<Option<String>> = match self.caption_start {
            Some(start) => (start..self.checked_end(start)?)
                .map(|caption| Some(caption.to_string()))
                .collect(),
            None => vec![None; count],
        };

        Ok(names
            .into_iter()
            .zip(captions)
            .zip(filters.into_iter().zip(sizes).zip(widths))
            .map(|((name, caption), ((filters, size), width))| Member {
                name,
                filters,
                size,
                width,
                caption,
            })
            .collect())
    }
}

impl From<Offset> for Spacing {
    fn from(offset: Offset) -> Self {
        Self::Offset(offset)
    }
}

/// Options of the bottleneck group.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct BottleneckStyle {
    /// Draw an ellipsis from the predecessor, eliding a stack of identical
    /// layers before the group. It takes the place of the inbound connector,
    /// and is drawn even when the group is not connected.
    pub ellipsis: bool,
    /// Turning point of the connector wrapping the group.
    pub position: f64,
}

impl Default for BottleneckStyle {
    fn default() -> Self {
        Self {
            ellipsis: false,
            position: 1.5,
        }
    }
}

#[derive(Debug)]
struct Member {
    name: BlockName,
    filters: u32,
    size: BoxSize,
    width: f64,
    caption: Option<String>,
}

/// How a variant draws and links its members.
struct Layout {
    role: &'static str,
    banded: bool,
    /// Whether later members are shifted by the group offset rather than flush.
    spaced: bool,
    inbound: Connector,
    inbound_anchors: (Anchor, Anchor),
    inbound_options: &'static str,
    interior_anchors: (Anchor, Anchor),
}

impl Layout {
    fn new(role: &'static str) -> Self {
        Self {
            role,
            banded: false,
            spaced: false,
            inbound: Connector::Short,
            inbound_anchors: (Anchor::East, Anchor::West),
            inbound_options: "",
            interior_anchors: (Anchor::East, Anchor::West),
        }
    }

    fn banded(mut self) -> Self {
        self.banded = true;
        self
    }

    fn spaced(mut self) -> Self {
        self.spaced = true;
        self
    }
}

fn stack(params: &GroupParams, layout: &Layout) -> Result<(Vec<Member>, Fragments)> {
    let members = params.members()?;
    debug!(
        role = layout.role,
        prefix = params.prefix.as_str(),
        count = params.count,
        start = params.start;
        "Composing group"
    );

    let offset = Offset::from(params.offset);
    let last = members.len() - 1;
    let mut fragments = Fragments::new();
    let mut at = params.prev.clone();

    for (position, member) in members.iter().enumerate() {
        let shift = if position == 0 || layout.spaced {
            offset
        } else {
            Offset::ZERO
        };
        let mut block = BlockBox::new(member.name.clone(), LayerColor::Conv.into())
            .at(at.target(params.anchor))
            .with_offset(shift)
            .with_size(member.size)
            .with_width(member.width)
            .with_filters(vec![member.filters]);
        if layout.banded {
            block = block.with_band(Band::new(BandSide::Right, LayerColor::ConvRelu.into()));
        }
        if let Some(caption) = &member.caption {
            block = block.with_caption(caption.clone());
        }
        if let (true, Some(z_label)) = (position == last, &params.z_label) {
            block = block.with_z_label(z_label.clone());
        }
        fragments.push(emit_box(&block)?);

        if let (true, Some(prev)) = (params.connect, at.name()) {
            let (connector, (of, to), options) = if position == 0 {
                (&layout.inbound, layout.inbound_anchors, layout.inbound_options)
            } else {
                (&Connector::Short, layout.interior_anchors, "")
            };
            let link = Link::new(prev.at(of), member.name.at(to)).with_options(options);
            fragments.push(emit_connector(connector, &link));
        }
        at = Predecessor::Block(member.name.clone());
    }

    Ok((members, fragments))
}

/// Composes a run of convolution blocks flush against each other.
///
/// # Errors
///
/// Returns [`Error::EmptyGroup`] for a count of zero and
/// [`Error::ShapeMismatch`] when a per-member parameter does not have one
/// entry per member.
pub fn multi_conv(params: &GroupParams) -> Result<Fragments> {
    stack(params, &Layout::new("multi_conv")).map(|(_, fragments)| fragments)
}

/// Composes a run of convolution blocks spaced by the group offset, joined
/// to the predecessor by a long connector over its north face.
pub fn multi_conv_z(params: &GroupParams) -> Result<Fragments> {
    let layout = Layout {
        inbound: Connector::long(),
        inbound_anchors: (Anchor::North, Anchor::North),
        ..Layout::new("multi_conv_z").spaced()
    };
    stack(params, &layout).map(|(_, fragments)| fragments)
}

/// Composes a run of convolutions with activation flush against each other.
pub fn multi_conv_relu(params: &GroupParams) -> Result<Fragments> {
    stack(params, &Layout::new("multi_conv_relu").banded()).map(|(_, fragments)| fragments)
}

/// Composes a stack of convolutions with activation along the depth axis,
/// linked from the near face of each block to the far face of the next.
///
/// ```
/// # use std::num::NonZeroU32;
/// # use plotnet::compose::{GroupParams, Spacing, multi_conv_relu_z};
/// let params = GroupParams::new("heads", 2, "conv_3")
///     .with_offset(Spacing::Depth(NonZeroU32::new(2).unwrap()));
/// let text = multi_conv_relu_z(&params).unwrap().render();
/// assert!(text.contains("\\pic[shift={(-2, 0, 2)}] at (heads_0-east)"));
/// ```
pub fn multi_conv_relu_z(params: &GroupParams) -> Result<Fragments> {
    let layout = Layout {
        inbound_anchors: (Anchor::Near, Anchor::Far),
        interior_anchors: (Anchor::Near, Anchor::Far),
        ..Layout::new("multi_conv_relu_z").banded().spaced()
    };
    stack(params, &layout).map(|(_, fragments)| fragments)
}

/// Composes a bottleneck: a run of convolutions with activation wrapped by a
/// connector from the last member's north face back to the coordinate
/// `<prefix>_connection`, just before the first member's west face.
pub fn bottleneck(params: &GroupParams, style: BottleneckStyle) -> Result<Fragments> {
    let layout = Layout {
        inbound: if style.ellipsis {
            Connector::Ellipsis
        } else {
            Connector::Short
        },
        inbound_options: if style.ellipsis { "" } else { "pos=0.55" },
        ..Layout::new("bottleneck").banded()
    };
    let (members, mut fragments) = stack(params, &layout)?;

    let connection = BlockName::new(format!("{}_connection", params.prefix));
    let (Some(first), Some(last)) = (members.first(), members.last()) else {
        return Ok(fragments);
    };
    if let (true, false, Some(prev)) = (style.ellipsis, params.connect, params.prev.name()) {
        let (of, to) = layout.inbound_anchors;
        let link = Link::new(prev.at(of), first.name.at(to));
        fragments.push(emit_connector(&Connector::Ellipsis, &link));
    }
    fragments.push(emit_coordinate(
        &connection,
        &first.name.at(Anchor::West).into(),
        Offset::along_x(-0.25),
    ));
    fragments.push(emit_connector(
        &Connector::LongReversed {
            position: style.position,
        },
        &Link::new(last.name.at(Anchor::North), connection.bare()),
    ));
    Ok(fragments)
}

/// Composes a residual run: convolution blocks spaced by the group offset,
/// chained by short connectors, with a skip connector lifted from the first
/// member over the others to the last one.
pub fn residual(params: &GroupParams) -> Result<Fragments> {
    let (members, mut fragments) = stack(params, &Layout::new("residual").spaced())?;
    if let [first, .., last] = members.as_slice() {
        fragments.push(emit_skip(&first.name, &last.name, DEFAULT_POSITION));
    }
    Ok(fragments)
}
