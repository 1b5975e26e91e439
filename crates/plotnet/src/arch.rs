//! Architecture descriptions.
//!
//! An [`Architecture`] is an ordered list of layers read from TOML. Each
//! `[[layer]]` entry names its `kind`: a composer role (`conv`,
//! `multi_conv_relu`, `bottleneck`, ...) or a raw primitive (`box`, `ball`,
//! `connection`, `text`, ...). Layers are composed in the order they are
//! listed, which is the order their fragments appear in the document.
//!
//! ```
//! # use plotnet::arch::Architecture;
//! let arch: Architecture = toml::from_str(r#"
//!     name = "tiny"
//!
//!     [[layer]]
//!     kind = "conv"
//!     name = "conv_1"
//!     prev = "origin"
//!     offset = [0, 0, 0]
//!
//!     [[layer]]
//!     kind = "conv"
//!     name = "conv_2"
//!     filters = 128
//! "#).unwrap();
//!
//! assert_eq!(arch.name(), Some("tiny"));
//! let text = arch.compose().unwrap().render();
//! assert!(text.contains("(conv_1-east) -- node [fillwhite] {\\midarrow} (conv_2-west);"));
//! ```

use std::{collections::BTreeMap, num::NonZeroU32};

use log::trace;
use serde::{
    Deserialize, Deserializer,
    de::{Error as _, IgnoredAny},
};

use plotnet_core::{
    Result,
    anchor::{Anchor, AnchorRef, Target},
    color::{Fill, LayerColor},
    draw::{
        Ball, BallOp, Band, BandSide, BlockBox, Connector, Fragments, Image, Link, MIDWAY,
        TextNode, emit_ball, emit_box, emit_connector, emit_coordinate, emit_full_connection,
        emit_grid, emit_image, emit_path_node, emit_resample, emit_text,
    },
    geometry::{BoxSize, Offset, Width},
    identifier::{BlockName, Predecessor},
};

use crate::compose::{
    self, BottleneckStyle, Broadcast, GroupParams, LayerParams, ReluStyle, UnconvParams,
    YoloOverlay,
};

/// A diagram: an optional name and the ordered layers drawing it.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Architecture {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "layer")]
    layers: Vec<LayerSpec>,
}

impl Architecture {
    /// Creates an architecture from its layers.
    pub fn new(layers: Vec<LayerSpec>) -> Self {
        Self { name: None, layers }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    /// Composes every layer, in order.
    ///
    /// # Errors
    ///
    /// Fails on the first layer that cannot be composed; nothing is returned
    /// for the layers before it.
    pub fn compose(&self) -> Result<Fragments> {
        let mut fragments = Fragments::new();
        for layer in &self.layers {
            fragments.merge(layer.compose()?);
        }
        Ok(fragments)
    }
}

/// One `[[layer]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerSpec {
    Conv(LayerFields),
    ConvPool(LayerFields),
    ConvRelu(ReluLayer),
    NewBranch(LayerFields),
    Upsample(LayerFields),
    BlockUnconv(UnconvParams),
    Shortcut(LayerFields),
    Sum(LayerFields),
    Mult(LayerFields),
    Conc(LayerFields),
    Softmax(LayerFields),
    Yolo(YoloLayer),
    Legend,
    MultiConv(GroupParams),
    MultiConvZ(GroupParams),
    MultiConvRelu(GroupParams),
    MultiConvReluZ(GroupParams),
    Bottleneck(BottleneckGroup),
    Residual(GroupParams),
    Box(BoxSpec),
    Ball(BallSpec),
    Connection(ConnectionSpec),
    Coordinate(CoordinateSpec),
    PathNode(PathNodeSpec),
    Text(TextSpec),
    Image(ImageSpec),
    Grid(GridSpec),
    Resample(ResampleSpec),
    FullConnection(PairSpec),
}

impl LayerSpec {
    fn kind(&self) -> &'static str {
        match self {
            Self::Conv(_) => "conv",
            Self::ConvPool(_) => "conv_pool",
            Self::ConvRelu(_) => "conv_relu",
            Self::NewBranch(_) => "new_branch",
            Self::Upsample(_) => "upsample",
            Self::BlockUnconv(_) => "block_unconv",
            Self::Shortcut(_) => "shortcut",
            Self::Sum(_) => "sum",
            Self::Mult(_) => "mult",
            Self::Conc(_) => "conc",
            Self::Softmax(_) => "softmax",
            Self::Yolo(_) => "yolo",
            Self::Legend => "legend",
            Self::MultiConv(_) => "multi_conv",
            Self::MultiConvZ(_) => "multi_conv_z",
            Self::MultiConvRelu(_) => "multi_conv_relu",
            Self::MultiConvReluZ(_) => "multi_conv_relu_z",
            Self::Bottleneck(_) => "bottleneck",
            Self::Residual(_) => "residual",
            Self::Box(_) => "box",
            Self::Ball(_) => "ball",
            Self::Connection(_) => "connection",
            Self::Coordinate(_) => "coordinate",
            Self::PathNode(_) => "path_node",
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::Grid(_) => "grid",
            Self::Resample(_) => "resample",
            Self::FullConnection(_) => "full_connection",
        }
    }

    /// Composes this layer.
    ///
    /// # Errors
    ///
    /// Returns the composer's error, or a name-inference error when `prev`
    /// is omitted and cannot be inferred from the layer name.
    pub fn compose(&self) -> Result<Fragments> {
        trace!(kind = self.kind(); "Composing architecture layer");
        match self {
            Self::Conv(layer) => compose::conv(&layer.params()?),
            Self::ConvPool(layer) => compose::conv_pool(&layer.params()?),
            Self::ConvRelu(relu) => compose::conv_relu(&relu.layer.params()?, relu.style),
            Self::NewBranch(layer) => compose::new_branch(&layer.params()?),
            Self::Upsample(layer) => compose::upsample(&layer.params()?),
            Self::BlockUnconv(params) => compose::block_unconv(params),
            Self::Shortcut(layer) => compose::shortcut(&layer.params()?),
            Self::Sum(layer) => Ok(compose::sum(&layer.params()?)),
            Self::Mult(layer) => Ok(compose::mult(&layer.params()?)),
            Self::Conc(layer) => Ok(compose::conc(&layer.params()?)),
            Self::Softmax(layer) => compose::softmax(&layer.params()?),
            Self::Yolo(yolo) => compose::yolo(&yolo.layer.params()?, &yolo.overlay),
            Self::Legend => compose::legend(),
            Self::MultiConv(params) => compose::multi_conv(params),
            Self::MultiConvZ(params) => compose::multi_conv_z(params),
            Self::MultiConvRelu(params) => compose::multi_conv_relu(params),
            Self::MultiConvReluZ(params) => compose::multi_conv_relu_z(params),
            Self::Bottleneck(group) => compose::bottleneck(&group.params, group.style),
            Self::Residual(params) => compose::residual(params),
            Self::Box(spec) => spec.compose(),
            Self::Ball(spec) => Ok(spec.compose()),
            Self::Connection(spec) => Ok(spec.compose()),
            Self::Coordinate(spec) => Ok(Fragments::from(emit_coordinate(
                &spec.name,
                &spec.of,
                spec.shift,
            ))),
            Self::PathNode(spec) => Ok(Fragments::from(emit_path_node(
                &spec.name,
                &spec.from,
                &spec.to,
                &spec.position,
            ))),
            Self::Text(spec) => Ok(spec.compose()),
            Self::Image(spec) => Ok(spec.compose()),
            Self::Grid(spec) => Ok(Fragments::from(emit_grid(
                &spec.name,
                &spec.at,
                (spec.width, spec.height),
                spec.steps,
                &spec.color,
            ))),
            Self::Resample(spec) => Ok(Fragments::from(emit_resample(
                &spec.of,
                &spec.to,
                spec.close_rim,
            ))),
            Self::FullConnection(spec) => {
                Ok(Fragments::from(emit_full_connection(&spec.of, &spec.to)))
            }
        }
    }
}

fn default_connect() -> bool {
    true
}

/// The fields of a single-layer role. An omitted `prev` is inferred from the
/// layer name by decrementing its trailing index.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerFields {
    name: BlockName,
    prev: Option<Predecessor>,
    z_label: Option<String>,
    filters: Option<Broadcast<u32>>,
    offset: Option<Offset>,
    size: Option<BoxSize>,
    width: Option<Width>,
    anchor: Option<Anchor>,
    opacity: Option<f64>,
    caption: Option<String>,
    #[serde(default = "default_connect")]
    connect: bool,
}

impl LayerFields {
    /// Resolves these fields into composer parameters.
    pub fn params(&self) -> Result<LayerParams> {
        let mut params = match &self.prev {
            Some(prev) => LayerParams::new(self.name.clone(), prev.clone()),
            None => LayerParams::inferred(self.name.clone())?,
        };
        params = match &self.filters {
            Some(Broadcast::Scalar(filters)) => params.with_filters(*filters),
            Some(Broadcast::PerMember(filters)) => params.with_slab_filters(filters.clone()),
            None => params,
        };
        if let Some(z_label) = &self.z_label {
            params = params.with_z_label(z_label.clone());
        }
        if let Some(offset) = self.offset {
            params = params.with_offset(offset);
        }
        if let Some(size) = self.size {
            params = params.with_size(size);
        }
        if let Some(width) = &self.width {
            params = params.with_width(width.clone());
        }
        if let Some(anchor) = self.anchor {
            params = params.with_anchor(anchor);
        }
        if let Some(opacity) = self.opacity {
            params = params.with_opacity(opacity);
        }
        if let Some(caption) = &self.caption {
            params = params.with_caption(caption.clone());
        }
        Ok(params.with_connect(self.connect))
    }
}

/// Keys of a layer table that none of its flattened parts claimed.
///
/// Flattened structs take the keys they declare, so whatever reaches this
/// field is a typo or a key of another kind, except for `allowed`.
fn reject_unclaimed<'de, D>(
    deserializer: D,
    allowed: &[&str],
) -> std::result::Result<(), D::Error>
where
    D: Deserializer<'de>,
{
    let keys = BTreeMap::<String, IgnoredAny>::deserialize(deserializer)?;
    match keys.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(D::Error::custom(format!("unknown field `{key}`"))),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct NoUnclaimedKeys;

impl<'de> Deserialize<'de> for NoUnclaimedKeys {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        reject_unclaimed(deserializer, &[]).map(|()| Self)
    }
}

/// Keys read by the flattened [`Connector`], which leaves them unclaimed.
const CONNECTOR_KEYS: &[&str] = &["shape", "position", "shift", "x_shift", "y_shift", "over"];

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct OnlyConnectorKeys;

impl<'de> Deserialize<'de> for OnlyConnectorKeys {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        reject_unclaimed(deserializer, CONNECTOR_KEYS).map(|()| Self)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReluLayer {
    #[serde(flatten)]
    layer: LayerFields,
    #[serde(flatten)]
    style: ReluStyle,
    #[serde(flatten)]
    _unclaimed: NoUnclaimedKeys,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct YoloLayer {
    #[serde(flatten)]
    layer: LayerFields,
    #[serde(flatten)]
    overlay: YoloOverlay,
    #[serde(flatten)]
    _unclaimed: NoUnclaimedKeys,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BottleneckGroup {
    #[serde(flatten)]
    params: GroupParams,
    #[serde(flatten)]
    style: BottleneckStyle,
    #[serde(flatten)]
    _unclaimed: NoUnclaimedKeys,
}

fn default_fill() -> Fill {
    LayerColor::Conv.into()
}

fn default_width() -> Width {
    Width::Single(1.0)
}

/// A box written out as given.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoxSpec {
    name: BlockName,
    #[serde(default = "Target::origin")]
    at: Target,
    #[serde(default)]
    offset: Offset,
    #[serde(default = "default_fill")]
    fill: Fill,
    band: Option<Fill>,
    #[serde(default)]
    band_side: BandSide,
    opacity: Option<f64>,
    caption: Option<String>,
    #[serde(default)]
    filters: Vec<u32>,
    z_label: Option<String>,
    #[serde(default)]
    size: BoxSize,
    #[serde(default = "default_width")]
    width: Width,
    options: Option<String>,
}

impl BoxSpec {
    fn compose(&self) -> Result<Fragments> {
        let mut block = BlockBox::new(self.name.clone(), self.fill.clone())
            .at(self.at.clone())
            .with_offset(self.offset)
            .with_size(self.size)
            .with_width(self.width.clone())
            .with_filters(self.filters.clone());
        if let Some(band) = &self.band {
            block = block.with_band(Band::new(self.band_side, band.clone()));
        }
        if let Some(opacity) = self.opacity {
            block = block.with_opacity(opacity);
        }
        if let Some(caption) = &self.caption {
            block = block.with_caption(caption.clone());
        }
        if let Some(z_label) = &self.z_label {
            block = block.with_z_label(z_label.clone());
        }
        if let Some(options) = &self.options {
            block = block.with_options(options.clone());
        }
        emit_box(&block).map(Fragments::from)
    }
}

/// An operator ball written out as given.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BallSpec {
    name: BlockName,
    op: BallOp,
    #[serde(default = "Target::origin")]
    at: Target,
    #[serde(default)]
    offset: Offset,
    fill: Option<Fill>,
    opacity: Option<f64>,
    radius: Option<f64>,
    caption: Option<String>,
}

impl BallSpec {
    fn compose(&self) -> Fragments {
        let mut ball = Ball::new(self.name.clone(), self.op)
            .at(self.at.clone())
            .with_offset(self.offset);
        if let Some(fill) = &self.fill {
            ball = ball.with_fill(fill.clone());
        }
        if let Some(opacity) = self.opacity {
            ball = ball.with_opacity(opacity);
        }
        if let Some(radius) = self.radius {
            ball = ball.with_radius(radius);
        }
        if let Some(caption) = &self.caption {
            ball = ball.with_caption(caption.clone());
        }
        Fragments::from(emit_ball(&ball))
    }
}

/// A connector of any shape between two anchors, selected by `shape`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConnectionSpec {
    #[serde(flatten)]
    connector: Connector,
    of: AnchorRef,
    to: AnchorRef,
    options: Option<String>,
    label_name: Option<BlockName>,
    #[serde(flatten)]
    _unclaimed: OnlyConnectorKeys,
}

impl ConnectionSpec {
    fn compose(&self) -> Fragments {
        let mut link = Link::new(self.of.clone(), self.to.clone());
        if let Some(options) = &self.options {
            link = link.with_options(options.clone());
        }
        if let Some(name) = &self.label_name {
            link = link.with_label_name(name.clone());
        }
        Fragments::from(emit_connector(&self.connector, &link))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoordinateSpec {
    name: BlockName,
    of: Target,
    #[serde(default)]
    shift: Offset,
}

fn default_position() -> String {
    MIDWAY.to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathNodeSpec {
    name: BlockName,
    from: Target,
    to: Target,
    #[serde(default = "default_position")]
    position: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextSpec {
    at: Target,
    text: String,
    name: Option<BlockName>,
    #[serde(default)]
    shift: Offset,
    options: Option<String>,
}

impl TextSpec {
    fn compose(&self) -> Fragments {
        let mut node = TextNode::new(self.at.clone(), self.text.clone()).with_shift(self.shift);
        if let Some(name) = &self.name {
            node = node.with_name(name.clone());
        }
        if let Some(options) = &self.options {
            node = node.with_options(options.clone());
        }
        Fragments::from(emit_text(&node))
    }
}

fn default_image_side() -> f64 {
    8.0
}

fn default_x_shift() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageSpec {
    name: BlockName,
    file: String,
    #[serde(default = "Target::origin")]
    at: Target,
    #[serde(default = "default_image_side")]
    width: f64,
    #[serde(default = "default_image_side")]
    height: f64,
    #[serde(default = "default_x_shift")]
    x_shift: f64,
}

impl ImageSpec {
    fn compose(&self) -> Fragments {
        let image = Image::new(self.name.clone(), self.file.clone(), self.at.clone())
            .with_size(self.width, self.height)
            .with_x_shift(self.x_shift);
        Fragments::from(emit_image(&image))
    }
}

fn default_grid_side() -> f64 {
    2.0
}

fn default_steps() -> NonZeroU32 {
    NonZeroU32::MIN
}

fn default_grid_color() -> String {
    "black".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridSpec {
    name: BlockName,
    at: Target,
    #[serde(default = "default_grid_side")]
    width: f64,
    #[serde(default = "default_grid_side")]
    height: f64,
    #[serde(default = "default_steps")]
    steps: NonZeroU32,
    #[serde(default = "default_grid_color")]
    color: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResampleSpec {
    of: BlockName,
    to: BlockName,
    #[serde(default)]
    close_rim: bool,
}

/// Two blocks joined corner to corner.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PairSpec {
    of: BlockName,
    to: BlockName,
}
