//! Auxiliary primitives: named coordinates, text labels, images and grids.

use std::num::NonZeroU32;

use log::trace;

use crate::{
    anchor::{AnchorRef, Target},
    draw::{
        fragment::{Fragment, FragmentBuilder},
        route::Coord,
    },
    geometry::Offset,
    identifier::BlockName,
};

/// Emits a named coordinate at `of`, shifted by `shift`.
///
/// ```
/// # use plotnet_core::anchor::Anchor;
/// # use plotnet_core::draw::emit_coordinate;
/// # use plotnet_core::geometry::Offset;
/// # use plotnet_core::identifier::BlockName;
/// let fragment = emit_coordinate(
///     &BlockName::new("enc_connection"),
///     &BlockName::new("enc_0").at(Anchor::West).into(),
///     Offset::along_x(-0.25),
/// );
/// assert_eq!(
///     fragment.as_str(),
///     "        \\coordinate [shift={(-0.25, 0, 0)}] (enc_connection) at (enc_0-west);\n"
/// );
/// ```
pub fn emit_coordinate(name: &BlockName, of: &Target, shift: Offset) -> Fragment {
    trace!(name = name.as_str(); "Emitting coordinate");
    FragmentBuilder::new()
        .statement(format!("\\coordinate [shift={{{shift}}}] ({name}) at ({of});"))
        .build()
}

/// Emits a coordinate named `name` on the line from `from` through `to`, at
/// fraction `position` of their distance (values above 1 lie beyond `to`).
pub fn coordinate_along(
    name: &AnchorRef,
    from: &AnchorRef,
    to: &AnchorRef,
    position: f64,
) -> Fragment {
    FragmentBuilder::new()
        .statement(format!(
            "\\path ({from}) -- ({to}) coordinate[pos={position}] ({name});"
        ))
        .build()
}

/// Emits a coordinate named `name` at `point`, typically a projection.
pub fn coordinate_projected(name: &AnchorRef, point: &Coord) -> Fragment {
    FragmentBuilder::new()
        .statement(format!("\\path {point} coordinate ({name});"))
        .build()
}

/// Where along a path a node is placed.
pub const MIDWAY: &str = "midway";

/// Emits an empty named node on the path from `from` to `to`, at `position`
/// (a TikZ placement such as `midway`, `near start` or `pos=0.3`).
pub fn emit_path_node(name: &BlockName, from: &Target, to: &Target, position: &str) -> Fragment {
    FragmentBuilder::new()
        .statement(format!("\\path ({from}) -- ({to}) node[{position}] ({name}) {{}};"))
        .build()
}

/// A text node placed at a shifted target.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    name: Option<BlockName>,
    at: Target,
    shift: Offset,
    options: Option<String>,
    text: String,
}

impl TextNode {
    pub fn new(at: Target, text: impl Into<String>) -> Self {
        Self {
            name: None,
            at,
            shift: Offset::ZERO,
            options: None,
            text: text.into(),
        }
    }

    pub fn with_name(mut self, name: BlockName) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_shift(mut self, shift: Offset) -> Self {
        self.shift = shift;
        self
    }

    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        let options = options.into();
        self.options = (!options.is_empty()).then_some(options);
        self
    }
}

/// Emits a text node.
pub fn emit_text(node: &TextNode) -> Fragment {
    let mut command = format!("\\node [shift={{{}}}", node.shift);
    if let Some(options) = &node.options {
        command.push_str(", ");
        command.push_str(options);
    }
    command.push_str(&format!("] at ({})", node.at));
    if let Some(name) = &node.name {
        command.push_str(&format!(" ({name})"));
    }
    command.push_str(&format!(" {{{}}};", node.text));

    FragmentBuilder::new().statement(command).build()
}

/// An external picture drawn on the zy plane, facing along the primary axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    name: BlockName,
    file: String,
    at: Target,
    width: f64,
    height: f64,
    x_shift: f64,
}

impl Image {
    /// Creates an 8cm by 8cm image one unit in front of `at`
    pub fn new(name: BlockName, file: impl Into<String>, at: Target) -> Self {
        Self {
            name,
            file: file.into(),
            at,
            width: 8.0,
            height: 8.0,
            x_shift: 1.0,
        }
    }

    /// Returns this image scaled to `width` by `height` centimetres
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_x_shift(mut self, x_shift: f64) -> Self {
        self.x_shift = x_shift;
        self
    }
}

/// Emits an `\includegraphics` node.
pub fn emit_image(image: &Image) -> Fragment {
    trace!(name = image.name.as_str(), file = image.file.as_str(); "Emitting image");
    FragmentBuilder::new()
        .statement(format!(
            "\\node[canvas is zy plane at x={}] ({}) at ({}) {{\\includegraphics[width={}cm,height={}cm]{{{}}}}};",
            image.x_shift, image.name, image.at, image.width, image.height, image.file
        ))
        .build()
}

/// Emits a `width` by `height` grid of `steps` cells per row on the zy
/// plane at `at`, typically a block's east face or an image node.
pub fn emit_grid(
    name: &BlockName,
    at: &Target,
    (width, height): (f64, f64),
    steps: NonZeroU32,
    color: &str,
) -> Fragment {
    let cell = width / f64::from(steps.get());
    FragmentBuilder::new()
        .statement(format!(
            "\\node[canvas is zy plane at x=0] ({name}) at ({at}) {{\\drawcoloredgrid{{{width}}}{{{height}}}{{{cell}}}{{{color}}}}};"
        ))
        .build()
}
