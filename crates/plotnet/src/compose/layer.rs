//! Single-layer composers.
//!
//! Every composer places its block at an anchor of the predecessor, shifted
//! by the layer offset, and draws the inbound connector when asked to and
//! when the predecessor is a block.

use std::num::NonZeroU32;

use log::debug;
use serde::Deserialize;

use plotnet_core::{
    Result,
    anchor::{Anchor, Target},
    color::{Fill, LayerColor},
    draw::{
        Ball, BallOp, Band, BandSide, BlockBox, Connector, Fragment, Fragments, Image, Link,
        TextNode, emit_ball, emit_box, emit_connector, emit_grid, emit_image, emit_resample,
        emit_text,
    },
    geometry::{BoxSize, Offset, Width, log_width},
    identifier::{BlockName, Predecessor},
};

const DEFAULT_FILTERS: u32 = 64;

/// Fills of the residual boxes in an unpooling chain.
const RESIDUAL_FILL: &str = "{rgb:white,1;black,3}";
const RESIDUAL_BAND: &str = "{rgb:white,1;black,2}";

/// Parameters shared by the single-layer composers.
///
/// Unset values fall back to the defaults of the role being composed. The
/// width defaults to `log_4(filters)`, one slab per filter count.
///
/// ```
/// # use plotnet::compose::{LayerParams, conv};
/// let params = LayerParams::new("conv_2", "conv_1").with_filters(128).with_caption("2");
/// let fragments = conv(&params).unwrap();
/// assert_eq!(fragments.len(), 2);
/// assert!(fragments.render().contains("name=conv_2,"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LayerParams {
    name: BlockName,
    prev: Predecessor,
    z_label: Option<String>,
    filters: Vec<u32>,
    offset: Option<Offset>,
    size: Option<BoxSize>,
    width: Option<Width>,
    anchor: Option<Anchor>,
    opacity: Option<f64>,
    caption: Option<String>,
    connect: bool,
}

impl LayerParams {
    /// Creates parameters for block `name` placed after `prev`.
    pub fn new(name: impl Into<BlockName>, prev: impl Into<Predecessor>) -> Self {
        Self {
            name: name.into(),
            prev: prev.into(),
            z_label: None,
            filters: vec![DEFAULT_FILTERS],
            offset: None,
            size: None,
            width: None,
            anchor: None,
            opacity: None,
            caption: None,
            connect: true,
        }
    }

    /// Creates parameters whose predecessor is `name` with its index decremented.
    ///
    /// # Errors
    ///
    /// Returns a name-inference error when `name` has no positive trailing
    /// index.
    pub fn inferred(name: impl Into<BlockName>) -> Result<Self> {
        let name = name.into();
        let prev = Predecessor::infer(&name)?;
        Ok(Self::new(name, prev))
    }

    pub fn with_z_label(mut self, z_label: impl Into<String>) -> Self {
        self.z_label = Some(z_label.into());
        self
    }

    pub fn with_filters(mut self, filters: u32) -> Self {
        self.filters = vec![filters];
        self
    }

    /// Returns these parameters with one filter count per sub-slab.
    pub fn with_slab_filters(mut self, filters: Vec<u32>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_offset(mut self, offset: Offset) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_size(mut self, size: BoxSize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_width(mut self, width: impl Into<Width>) -> Self {
        self.width = Some(width.into());
        self
    }

    /// Returns these parameters placed at `anchor` of the predecessor.
    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = Some(anchor);
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

    /// Returns these parameters with the inbound connector enabled or not.
    pub fn with_connect(mut self, connect: bool) -> Self {
        self.connect = connect;
        self
    }

    pub fn name(&self) -> &BlockName {
        &self.name
    }

    pub fn prev(&self) -> &Predecessor {
        &self.prev
    }

    fn width(&self) -> Result<Width> {
        if let Some(width) = &self.width {
            return Ok(width.clone());
        }
        let widths = self
            .filters
            .iter()
            .copied()
            .map(log_width)
            .collect::<Result<Vec<_>>>()?;
        Ok(match widths.as_slice() {
            [width] => Width::Single(*width),
            _ => Width::Slabs(widths),
        })
    }

    fn offset_or(&self, default: Offset) -> Offset {
        self.offset.unwrap_or(default)
    }

    fn size_or(&self, default: BoxSize) -> BoxSize {
        self.size.unwrap_or(default)
    }

    fn placement(&self, default: Anchor) -> Target {
        self.prev.target(self.anchor.unwrap_or(default))
    }

    /// Applies the caption and z-label set on these parameters.
    fn label(&self, mut block: BlockBox) -> BlockBox {
        if let Some(caption) = &self.caption {
            block = block.with_caption(caption.clone());
        }
        if let Some(z_label) = &self.z_label {
            block = block.with_z_label(z_label.clone());
        }
        block
    }

    /// Applies the caption, z-label and opacity set on these parameters.
    fn style(&self, block: BlockBox) -> BlockBox {
        let block = self.label(block);
        match self.opacity {
            Some(opacity) => block.with_opacity(opacity),
            None => block,
        }
    }

    /// The inbound connector from `of` of the predecessor to `to` of `target`.
    fn inbound(
        &self,
        connector: &Connector,
        of: Anchor,
        target: &BlockName,
        to: Anchor,
    ) -> Option<Fragment> {
        if !self.connect {
            return None;
        }
        self.prev
            .name()
            .map(|prev| emit_connector(connector, &Link::new(prev.at(of), target.at(to))))
    }
}

/// How a convolution with activation is drawn and connected.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReluStyle {
    /// Face carrying the activation band.
    pub side: BandSide,
    /// Whether the filter-count label is drawn.
    pub show_filters: bool,
    /// Anchor of the new block the inbound connector ends at.
    pub target: Anchor,
}

impl Default for ReluStyle {
    fn default() -> Self {
        Self {
            side: BandSide::Right,
            show_filters: true,
            target: Anchor::West,
        }
    }
}

/// Parameters of an unpooling chain, which has no predecessor of its own:
/// it starts at the east face of `bottom` and ends with the block `top`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnconvParams {
    name: BlockName,
    bottom: BlockName,
    top: BlockName,
    #[serde(default)]
    z_label: Option<String>,
    #[serde(default = "default_filters")]
    filters: u32,
    #[serde(default = "unit_offset")]
    offset: Offset,
    #[serde(default)]
    size: BoxSize,
    #[serde(default = "default_unconv_width")]
    width: f64,
    #[serde(default = "default_unconv_opacity")]
    opacity: f64,
}

fn default_filters() -> u32 {
    DEFAULT_FILTERS
}

fn unit_offset() -> Offset {
    Offset::along_x(1.0)
}

fn default_unconv_width() -> f64 {
    3.5
}

fn default_unconv_opacity() -> f64 {
    0.5
}

impl UnconvParams {
    pub fn new(
        name: impl Into<BlockName>,
        bottom: impl Into<BlockName>,
        top: impl Into<BlockName>,
    ) -> Self {
        Self {
            name: name.into(),
            bottom: bottom.into(),
            top: top.into(),
            z_label: None,
            filters: DEFAULT_FILTERS,
            offset: unit_offset(),
            size: BoxSize::default(),
            width: default_unconv_width(),
            opacity: default_unconv_opacity(),
        }
    }

    pub fn with_z_label(mut self, z_label: impl Into<String>) -> Self {
        self.z_label = Some(z_label.into());
        self
    }

    pub fn with_filters(mut self, filters: u32) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_size(mut self, size: BoxSize) -> Self {
        self.size = size;
        self
    }
}

/// Optional overlays on a detection block.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct YoloOverlay {
    /// Picture drawn in front of the block's east face.
    pub image: Option<String>,
    /// Cells per row of a grid drawn over the picture.
    pub grid: Option<NonZeroU32>,
}

fn log_layer(role: &'static str, params: &LayerParams) {
    debug!(
        role = role,
        name = params.name.as_str(),
        prev:? = params.prev.name();
        "Composing layer"
    );
}

fn single(fragment: Fragment, inbound: Option<Fragment>) -> Fragments {
    let mut fragments = Fragments::from(fragment);
    fragments.extend(inbound);
    fragments
}

/// Composes a plain convolution block.
///
/// # Errors
///
/// Returns a domain error for a zero filter count when no width is given,
/// and a shape-mismatch error when sub-slab widths and filter counts differ
/// in length.
pub fn conv(params: &LayerParams) -> Result<Fragments> {
    log_layer("conv", params);
    let block = BlockBox::new(params.name.clone(), LayerColor::Conv.into())
        .at(params.placement(Anchor::East))
        .with_offset(params.offset_or(unit_offset()))
        .with_size(params.size_or(BoxSize::default()))
        .with_filters(params.filters.clone())
        .with_width(params.width()?);
    let block = emit_box(&params.style(block))?;

    let inbound = params.inbound(&Connector::Short, Anchor::East, &params.name, Anchor::West);
    Ok(single(block, inbound))
}

fn banded(params: &LayerParams, side: BandSide, show_filters: bool) -> Result<BlockBox> {
    let mut block = BlockBox::new(params.name.clone(), LayerColor::Conv.into())
        .with_band(Band::new(side, LayerColor::ConvRelu.into()))
        .with_offset(params.offset_or(unit_offset()))
        .with_size(params.size_or(BoxSize::default()))
        .with_width(params.width()?);
    if show_filters {
        block = block.with_filters(params.filters.clone());
    }
    Ok(block)
}

/// Composes a convolution with activation followed by a pooling block.
///
/// The pooling block is named `<name>_pool` and always sits one unit past
/// the east face of the convolution, whatever anchor the convolution is
/// placed at. The only connector drawn is the inbound one.
pub fn conv_pool(params: &LayerParams) -> Result<Fragments> {
    log_layer("conv_pool", params);
    let size = params.size_or(BoxSize::default());

    let block = banded(params, BandSide::Right, true)?.at(params.placement(Anchor::East));
    let pool = BlockBox::new(params.name.child("pool"), LayerColor::Pool.into())
        .at(params.name.at(Anchor::East).into())
        .with_offset(unit_offset())
        .with_size(size)
        .with_opacity(params.opacity.unwrap_or(0.5));

    let mut fragments = Fragments::new();
    fragments.push(emit_box(&params.label(block))?);
    fragments.push(emit_box(&pool)?);
    fragments.extend(params.inbound(&Connector::Short, Anchor::East, &params.name, Anchor::West));
    Ok(fragments)
}

/// Composes a convolution with activation band.
pub fn conv_relu(params: &LayerParams, style: ReluStyle) -> Result<Fragments> {
    log_layer("conv_relu", params);
    let anchor = params.anchor.unwrap_or(Anchor::East);
    let block = banded(params, style.side, style.show_filters)?.at(params.prev.target(anchor));
    let block = emit_box(&params.style(block))?;

    let inbound = params.inbound(&Connector::Short, anchor, &params.name, style.target);
    Ok(single(block, inbound))
}

/// Composes a convolution with activation that starts a branch off the near
/// face of its predecessor, joined by a connector hopping along the depth
/// axis by the offset's z component.
pub fn new_branch(params: &LayerParams) -> Result<Fragments> {
    log_layer("new_branch", params);
    let anchor = params.anchor.unwrap_or(Anchor::Near);
    let offset = params.offset_or(unit_offset());
    let block = banded(params, BandSide::Right, true)?.at(params.prev.target(anchor));
    let block = emit_box(&params.style(block))?;

    let connector = Connector::z_axis(offset.z());
    let inbound = params.inbound(&connector, anchor, &params.name, Anchor::West);
    Ok(single(block, inbound))
}

/// Composes an upsampling step: a block `<name>_0`, a block `<name>` twice
/// its size past its east face, and the dashed frustum joining them.
///
/// The layer is placed at the west face of its predecessor unless another
/// anchor is given; the inbound connector leaves the predecessor's east face
/// and ends at `<name>_0`.
pub fn upsample(params: &LayerParams) -> Result<Fragments> {
    log_layer("upsample", params);
    let offset = params.offset_or(unit_offset());
    let size = params.size_or(BoxSize::default());
    let source = params.name.child("0");

    let small = BlockBox::new(source.clone(), LayerColor::Upsample.into())
        .at(params.placement(Anchor::West))
        .with_offset(offset)
        .with_size(size);
    let large = BlockBox::new(params.name.clone(), LayerColor::Upsample.into())
        .at(source.at(Anchor::East).into())
        .with_offset(offset)
        .with_size(size.scale(2.0));

    let mut fragments = Fragments::new();
    fragments.push(emit_box(&small)?);
    fragments.push(emit_box(&params.style(large))?);
    fragments.push(emit_resample(&source, &params.name, true));
    fragments.extend(params.inbound(&Connector::Short, Anchor::East, &source, Anchor::West));
    Ok(fragments)
}

/// Composes an unpooling chain: `unpool_<name>`, `ccr_res_<name>`,
/// `ccr_<name>`, `ccr_res_c_<name>` and finally `top`, each flush against the
/// east face of the previous one. `bottom` is joined to the chain by a
/// connector and by the dashed frustum of the unpooling.
pub fn block_unconv(params: &UnconvParams) -> Result<Fragments> {
    debug!(
        role = "block_unconv",
        name = params.name.as_str(),
        bottom = params.bottom.as_str();
        "Composing layer"
    );
    let unpool = params.name.prefixed("unpool");
    let residual = params.name.prefixed("ccr_res");
    let conv = params.name.prefixed("ccr");
    let closing = params.name.prefixed("ccr_res_c");

    let labelled = |block: BlockBox| {
        let block = block
            .with_size(params.size)
            .with_width(params.width)
            .with_filters(vec![params.filters]);
        match &params.z_label {
            Some(z_label) => block.with_z_label(z_label.clone()),
            None => block,
        }
    };
    let residual_box = |name: BlockName, after: &BlockName| {
        labelled(
            BlockBox::new(name, Fill::tikz(RESIDUAL_FILL))
                .with_band(Band::new(BandSide::Right, Fill::tikz(RESIDUAL_BAND)))
                .at(after.at(Anchor::East).into())
                .with_opacity(params.opacity),
        )
    };

    let chain = [
        BlockBox::new(unpool.clone(), LayerColor::Unpool.into())
            .at(params.bottom.at(Anchor::East).into())
            .with_offset(params.offset)
            .with_size(params.size)
            .with_opacity(params.opacity),
        residual_box(residual.clone(), &unpool),
        labelled(
            BlockBox::new(conv.clone(), LayerColor::Conv.into())
                .at(residual.at(Anchor::East).into()),
        ),
        residual_box(closing.clone(), &conv),
        labelled(
            BlockBox::new(params.top.clone(), LayerColor::Conv.into())
                .at(closing.at(Anchor::East).into()),
        ),
    ];

    let mut fragments = chain.iter().map(emit_box).collect::<Result<Fragments>>()?;
    fragments.push(emit_connector(
        &Connector::Short,
        &Link::new(params.bottom.at(Anchor::East), unpool.at(Anchor::West)),
    ));
    fragments.push(emit_resample(&params.bottom, &unpool, false));
    Ok(fragments)
}

/// Composes a shortcut block.
pub fn shortcut(params: &LayerParams) -> Result<Fragments> {
    log_layer("shortcut", params);
    let block = BlockBox::new(params.name.clone(), LayerColor::Shortcut.into())
        .at(params.placement(Anchor::East))
        .with_offset(params.offset_or(unit_offset()))
        .with_size(params.size_or(BoxSize::square(40.0)))
        .with_width(params.width.clone().unwrap_or(Width::Single(1.0)));
    let block = emit_box(&params.style(block))?;

    let inbound = params.inbound(&Connector::Short, Anchor::East, &params.name, Anchor::West);
    Ok(single(block, inbound))
}

fn operator(op: BallOp, params: &LayerParams) -> Fragments {
    let mut ball = Ball::new(params.name.clone(), op)
        .at(params.placement(Anchor::East))
        .with_offset(params.offset_or(unit_offset()));
    if let Some(opacity) = params.opacity {
        ball = ball.with_opacity(opacity);
    }
    if let Some(caption) = &params.caption {
        ball = ball.with_caption(caption.clone());
    }

    let inbound = params.inbound(&Connector::Short, Anchor::East, &params.name, Anchor::West);
    single(emit_ball(&ball), inbound)
}

/// Composes an element-wise sum.
pub fn sum(params: &LayerParams) -> Fragments {
    log_layer("sum", params);
    operator(BallOp::Sum, params)
}

/// Composes an element-wise multiplication.
pub fn mult(params: &LayerParams) -> Fragments {
    log_layer("mult", params);
    operator(BallOp::Multiply, params)
}

/// Composes a concatenation.
///
/// Like the other operators it draws its inbound connector unless
/// [`LayerParams::with_connect`] turns it off; diagrams that relied on
/// concatenations having no connector should turn it off explicitly.
pub fn conc(params: &LayerParams) -> Fragments {
    log_layer("conc", params);
    operator(BallOp::Concatenate, params)
}

/// Composes a softmax block.
pub fn softmax(params: &LayerParams) -> Result<Fragments> {
    log_layer("softmax", params);
    let block = BlockBox::new(params.name.clone(), LayerColor::Softmax.into())
        .at(params.placement(Anchor::East))
        .with_offset(params.offset_or(unit_offset()))
        .with_size(params.size_or(BoxSize::square(40.0)))
        .with_width(params.width.clone().unwrap_or(Width::Single(1.5)))
        .with_opacity(0.8);
    let block = emit_box(&params.style(block))?;

    let inbound = params.inbound(&Connector::Short, Anchor::East, &params.name, Anchor::West);
    Ok(single(block, inbound))
}

/// Composes a detection block, optionally with a picture in front of it and
/// a grid drawn over the picture.
///
/// The block sits behind its predecessor (offset `(-1, 0, 4)` by default)
/// and the inbound connector runs from the predecessor's near face to the
/// block's far face.
pub fn yolo(params: &LayerParams, overlay: &YoloOverlay) -> Result<Fragments> {
    log_layer("yolo", params);
    let anchor = params.anchor.unwrap_or(Anchor::East);
    let size = params.size_or(BoxSize::default());
    let block = BlockBox::new(params.name.clone(), LayerColor::Detect.into())
        .at(params.prev.target(anchor))
        .with_offset(params.offset_or(Offset::new(-1.0, 0.0, 4.0)))
        .with_size(size)
        .with_width(params.width.clone().unwrap_or(Width::Single(1.0)));

    let mut fragments = Fragments::from(emit_box(&params.style(block))?);

    let overlay_size = (size.height() / 5.0, size.depth() / 5.0);
    let mut grid_at: Target = params.name.at(anchor).into();
    if let Some(file) = &overlay.image {
        let image_name = params.name.prefixed("image");
        let image = Image::new(image_name.clone(), file.clone(), params.name.at(anchor).into())
            .with_size(overlay_size.0, overlay_size.1);
        fragments.push(emit_image(&image));
        grid_at = image_name.bare().into();
    }
    if let Some(steps) = overlay.grid {
        fragments.push(emit_grid(
            &params.name.prefixed("grid"),
            &grid_at,
            overlay_size,
            steps,
            "black",
        ));
    }

    fragments.extend(params.inbound(&Connector::Short, Anchor::Near, &params.name, Anchor::Far));
    Ok(fragments)
}

/// Composes the fixed key explaining the layer colours, placed below the
/// origin.
pub fn legend() -> Result<Fragments> {
    const ENTRIES: [(LayerColor, &str); 4] = [
        (LayerColor::Conv, "Convolution layer"),
        (LayerColor::Pool, "Pooling layer"),
        (LayerColor::Upsample, "Upsample layer"),
        (LayerColor::Softmax, "Softmax layer"),
    ];
    const BALLS: [(BallOp, &str); 2] = [
        (BallOp::Concatenate, "Concatenation"),
        (BallOp::Sum, "Summation"),
    ];

    debug!(entries = ENTRIES.len() + BALLS.len(); "Composing legend");
    let size = BoxSize::square(5.0);
    let step = Offset::along_x(5.0);
    let caption = |name: &BlockName, text: &str| {
        emit_text(
            &TextNode::new(name.at(Anchor::Center).into(), format!("\\LARGE{{{text}}}"))
                .with_shift(Offset::new(0.0, -1.3, 0.0)),
        )
    };

    let mut fragments = Fragments::new();
    let mut prev: Option<BlockName> = None;
    for (index, (color, text)) in (1..).zip(ENTRIES) {
        let name = BlockName::numbered("legend", index);
        let mut block = BlockBox::new(name.clone(), color.into()).with_size(size);
        block = match &prev {
            None => block
                .with_band(Band::new(BandSide::Right, LayerColor::ConvRelu.into()))
                .with_offset(Offset::new(0.0, -15.0, 0.0)),
            Some(prev) => block.at(prev.at(Anchor::West).into()).with_offset(step),
        };
        fragments.push(emit_box(&block)?);
        fragments.push(caption(&name, text));
        prev = Some(name);
    }

    // Balls are numbered after a gap in the key.
    for (index, (op, text)) in (ENTRIES.len() as u32 + 2..).zip(BALLS) {
        let name = BlockName::numbered("legend", index);
        let mut ball = Ball::new(name.clone(), op)
            .with_opacity(0.6)
            .with_radius(2.0)
            .with_caption("")
            .with_offset(step);
        if let Some(prev) = &prev {
            ball = ball.at(prev.at(Anchor::West).into());
        }
        fragments.push(emit_ball(&ball));
        fragments.push(caption(&name, text));
        prev = Some(name);
    }
    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use plotnet_core::Error;

    use super::*;

    fn count(fragments: &Fragments, needle: &str) -> usize {
        fragments.render().matches(needle).count()
    }

    #[test]
    fn test_conv_output() {
        let params = LayerParams::new("conv_2", "conv_1").with_z_label("256");
        let text = conv(&params).unwrap().render();
        let expected = concat!(
            "        \\pic[shift={(1, 0, 0)}] at (conv_1-east)\n",
            "            {Box={\n",
            "                name=conv_2,\n",
            "                xlabel={(64,)},\n",
            "                zlabel=256,\n",
            "                fill=\\ConvColor,\n",
            "                height=32,\n",
            "                width={3},\n",
            "                depth=32\n",
            "                }\n",
            "            };\n",
            "        \\draw [connection] (conv_1-east) -- node [fillwhite] {\\midarrow} (conv_2-west);\n",
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_single_layer_references() {
        let params = LayerParams::inferred("conv_5").unwrap();
        assert_eq!(params.prev(), &Predecessor::block("conv_4"));

        let fragments = conv(&params).unwrap();
        assert_eq!(count(&fragments, "name=conv_5,"), 1);
        assert_eq!(count(&fragments, "\\draw [connection]"), 1);
        assert_eq!(count(&fragments, "(conv_4-east) -- "), 1);
    }

    #[test]
    fn test_inferred_rejects_first_index() {
        let err = LayerParams::inferred("conv_0").unwrap_err();
        assert!(matches!(err, Error::NameInference { .. }));
    }

    #[test]
    fn test_origin_has_no_connector() {
        let params = LayerParams::new("conv_1", Predecessor::Origin).with_offset(Offset::ZERO);
        let text = conv(&params).unwrap().render();
        assert!(text.starts_with("        \\pic[shift={(0, 0, 0)}] at (0,0,0)\n"));
        assert!(!text.contains("\\draw"));
    }

    #[test]
    fn test_connect_disabled() {
        let params = LayerParams::new("conv_2", "conv_1").with_connect(false);
        assert_eq!(conv(&params).unwrap().len(), 1);
    }

    #[test]
    fn test_zero_filters_fail_fast() {
        let params = LayerParams::new("conv_2", "conv_1").with_filters(0);
        assert_eq!(conv(&params).unwrap_err(), Error::Domain { filters: 0 });

        let explicit = params.with_width(2.0);
        assert!(conv(&explicit).is_ok());
    }

    #[test]
    fn test_slab_mismatch_emits_nothing() {
        let params = LayerParams::new("conv_2", "conv_1")
            .with_slab_filters(vec![64, 128])
            .with_width(vec![1.0]);
        assert!(matches!(
            conv(&params).unwrap_err(),
            Error::ShapeMismatch { expected: 1, found: 2, .. }
        ));
    }

    #[test]
    fn test_slab_widths_follow_filters() {
        let params = LayerParams::new("conv_2", "conv_1").with_slab_filters(vec![64, 256]);
        let text = conv(&params).unwrap().render();
        assert!(text.contains("xlabel={(64,256,)},"));
        assert!(text.contains("width={3,4},"));
    }

    #[test]
    fn test_width_scaling() {
        let width = |filters| LayerParams::new("a_1", "a_0").with_filters(filters).width().unwrap();
        for (filters, expected) in [(64, 3.0), (4, 1.0), (1, 0.0)] {
            let Width::Single(actual) = width(filters) else {
                panic!("expected a single width");
            };
            assert_approx_eq!(f64, actual, expected);
        }
    }

    #[test]
    fn test_conv_pool_pool_block() {
        let params = LayerParams::new("conv_2", "conv_1")
            .with_anchor(Anchor::Near)
            .with_caption("2");
        let fragments = conv_pool(&params).unwrap();
        let text = fragments.render();

        assert_eq!(fragments.len(), 3);
        assert!(text.contains("at (conv_1-near)"));
        assert!(text.contains("\\pic[shift={(1, 0, 0)}] at (conv_2-east)"));
        assert!(text.contains("name=conv_2_pool,"));
        assert!(text.contains("opacity=0.5,"));
        assert_eq!(count(&fragments, "{RightBandedBox={"), 1);
        assert_eq!(count(&fragments, "caption=2,"), 1);
        assert_eq!(count(&fragments, "\\draw"), 1);
    }

    #[test]
    fn test_conv_relu_style() {
        let params = LayerParams::new("dec_1", "dec_0").with_anchor(Anchor::South);
        let style = ReluStyle {
            side: BandSide::Left,
            show_filters: false,
            target: Anchor::North,
        };
        let text = conv_relu(&params, style).unwrap().render();
        assert!(text.contains("{LeftBandedBox={"));
        assert!(!text.contains("xlabel"));
        assert!(text.contains("bandfill=\\ConvReluColor,"));
        assert!(text.contains("(dec_0-south) -- node [fillwhite] {\\midarrow} (dec_1-north);"));
    }

    #[test]
    fn test_new_branch_hops_along_depth() {
        let params = LayerParams::new("branch_1", "conv_3").with_offset(Offset::new(0.0, 0.0, 6.0));
        let text = new_branch(&params).unwrap().render();
        assert!(text.contains("at (conv_3-near)"));
        assert!(text.contains("\\draw [connection]\n            (conv_3-near)\n"));
        assert!(text.contains("-- node {} ++(0, 0, 6)\n"));
        assert!(text.contains("-- node {\\midarrow} (branch_1-west);\n"));
    }

    #[test]
    fn test_upsample_parts() {
        let params = LayerParams::new("up_1", "conv_4").with_size(BoxSize::square(16.0));
        let fragments = upsample(&params).unwrap();
        let text = fragments.render();

        assert!(text.contains("name=up_1_0,"));
        assert!(text.contains("at (conv_4-west)"));
        assert!(text.contains("at (up_1_0-east)"));
        assert!(text.contains("height=32,"));
        assert!(text.contains("height=16,"));
        assert_eq!(count(&fragments, "[densely dashed]"), 1);
        assert!(text.contains("(conv_4-east) -- node [fillwhite] {\\midarrow} (up_1_0-west);"));
    }

    #[test]
    fn test_block_unconv_chain() {
        let params = UnconvParams::new("b5", "pool_4", "end_b5").with_z_label("16");
        let fragments = block_unconv(&params).unwrap();
        let text = fragments.render();

        for name in ["unpool_b5", "ccr_res_b5", "ccr_b5", "ccr_res_c_b5", "end_b5"] {
            assert_eq!(count(&fragments, &format!("name={name},")), 1, "{name}");
        }
        assert!(text.contains("at (pool_4-east)"));
        assert!(text.contains("at (ccr_res_c_b5-east)"));
        assert!(text.contains("fill={rgb:white,1;black,3},"));
        assert!(text.contains("(pool_4-east) -- node [fillwhite] {\\midarrow} (unpool_b5-west);"));
        assert_eq!(count(&fragments, "zlabel=16,"), 4);
    }

    #[test]
    fn test_operators() {
        let params = LayerParams::new("sum_1", "conv_3");
        let text = sum(&params).render();
        assert!(text.contains("logo=$+$"));
        assert!(text.contains("(conv_3-east) -- node [fillwhite] {\\midarrow} (sum_1-west);"));

        let params = LayerParams::new("cat_1", "conv_3").with_anchor(Anchor::North);
        assert!(conc(&params).render().contains("\\draw [connection]"));
        assert!(!conc(&params.clone().with_connect(false)).render().contains("\\draw"));
        assert!(mult(&params).render().contains("at (conv_3-north)"));
    }

    #[test]
    fn test_softmax_and_shortcut_defaults() {
        let params = LayerParams::new("soft_1", "fc_1").with_caption("SOFT");
        let text = softmax(&params).unwrap().render();
        assert!(text.contains("fill=\\SoftmaxColor,"));
        assert!(text.contains("opacity=0.8,"));
        assert!(text.contains("width={1.5},"));
        assert!(text.contains("height=40,"));

        let text = shortcut(&LayerParams::new("short_1", "conv_2")).unwrap().render();
        assert!(text.contains("fill=\\ShortcutColor,"));
        assert!(text.contains("width={1},"));
        assert!(!text.contains("xlabel"));
    }

    #[test]
    fn test_yolo_overlay() {
        let params = LayerParams::new("yolo_1", "conv_9");
        let overlay = YoloOverlay {
            image: Some("\\input_image".to_string()),
            grid: NonZeroU32::new(4),
        };
        let text = yolo(&params, &overlay).unwrap().render();

        assert!(text.contains("\\pic[shift={(-1, 0, 4)}] at (conv_9-east)"));
        assert!(text.contains("(image_yolo_1) at (yolo_1-east)"));
        assert!(text.contains("width=6.4cm,height=6.4cm"));
        assert!(text.contains("(grid_yolo_1) at (image_yolo_1)"));
        assert!(text.contains("\\drawcoloredgrid{6.4}{6.4}{1.6}{black}"));
        assert!(text.contains("(conv_9-near) -- node [fillwhite] {\\midarrow} (yolo_1-far);"));
    }

    #[test]
    fn test_yolo_without_overlay() {
        let params = LayerParams::new("yolo_1", "conv_9");
        assert_eq!(yolo(&params, &YoloOverlay::default()).unwrap().len(), 2);
    }

    #[test]
    fn test_legend_entries() {
        let fragments = legend().unwrap();
        let text = fragments.render();

        assert_eq!(fragments.len(), 12);
        assert!(text.starts_with("        \\pic[shift={(0, -15, 0)}] at (0,0,0)\n            {RightBandedBox={\n"));
        for index in [1, 2, 3, 4, 6, 7] {
            assert!(text.contains(&format!("name=legend_{index},")), "legend_{index}");
        }
        assert!(text.contains("\\node [shift={(0, -1.3, 0)}] at (legend_7-anchor) {\\LARGE{Summation}};"));
        assert!(text.contains("\\pic[shift={(5, 0, 0)}] at (legend_4-west)"));
        assert!(text.contains("radius=2,"));
    }

    #[test]
    fn test_composers_are_idempotent() {
        let params = LayerParams::new("conv_2", "conv_1");
        assert_eq!(conv(&params).unwrap(), conv(&params).unwrap());
        assert_eq!(legend().unwrap().render(), legend().unwrap().render());
    }
}
