//! Fill colours for diagram blocks.
//!
//! Blocks are filled either with one of the named layer colours defined by
//! the document palette (`\ConvColor`, `\PoolColor`, ...), with a CSS colour
//! converted to an xcolor expression, or with a raw TikZ colour expression.

use std::{fmt, str::FromStr};

use color::{DynamicColor, Srgb};
use serde::Deserialize;

/// Wrapper around the `DynamicColor` type from the color crate.
///
/// Used for CSS-style colours supplied in configuration, which are rendered
/// as xcolor `rgb,255` expressions.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Color {
    /// Create a new `Color` from a string
    /// This will parse CSS color strings such as "#ff0000", "rgb(255, 0, 0)", "red", etc.
    ///
    /// # Examples
    ///
    /// ```
    /// use plotnet_core::color::Color;
    ///
    /// let red = Color::new("#ff0000").unwrap();
    /// assert_eq!(red.to_tikz(), "{rgb,255:red,255;green,0;blue,0}");
    /// ```
    pub fn new(color_str: &str) -> Result<Self, String> {
        match DynamicColor::from_str(color_str) {
            Ok(color) => Ok(Self { color }),
            Err(err) => Err(format!("invalid color `{color_str}`: {err}")),
        }
    }

    /// Returns the colour as an xcolor extended expression.
    pub fn to_tikz(self) -> String {
        let rgba = self.color.to_alpha_color::<Srgb>().to_rgba8();
        format!(
            "{{rgb,255:red,{};green,{};blue,{}}}",
            rgba.r, rgba.g, rgba.b
        )
    }
}

/// The named layer colours defined by the document palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerColor {
    Conv,
    ConvRelu,
    Pool,
    Upsample,
    Detect,
    Unpool,
    Fc,
    FcRelu,
    Softmax,
    Sum,
    Shortcut,
    Mult,
    Conc,
}

impl LayerColor {
    const ALL: [LayerColor; 13] = [
        Self::Conv,
        Self::ConvRelu,
        Self::Pool,
        Self::Upsample,
        Self::Detect,
        Self::Unpool,
        Self::Fc,
        Self::FcRelu,
        Self::Softmax,
        Self::Sum,
        Self::Shortcut,
        Self::Mult,
        Self::Conc,
    ];

    /// Returns the palette macro name, without the leading backslash
    pub fn macro_name(self) -> &'static str {
        match self {
            Self::Conv => "ConvColor",
            Self::ConvRelu => "ConvReluColor",
            Self::Pool => "PoolColor",
            Self::Upsample => "UpsampleColor",
            Self::Detect => "DetectColor",
            Self::Unpool => "UnpoolColor",
            Self::Fc => "FcColor",
            Self::FcRelu => "FcReluColor",
            Self::Softmax => "SoftmaxColor",
            Self::Sum => "SumColor",
            Self::Shortcut => "ShortcutColor",
            Self::Mult => "MultColor",
            Self::Conc => "ConcColor",
        }
    }

    /// Returns the configuration name, e.g. `conv_relu`
    pub fn key(self) -> &'static str {
        match self {
            Self::Conv => "conv",
            Self::ConvRelu => "conv_relu",
            Self::Pool => "pool",
            Self::Upsample => "upsample",
            Self::Detect => "detect",
            Self::Unpool => "unpool",
            Self::Fc => "fc",
            Self::FcRelu => "fc_relu",
            Self::Softmax => "softmax",
            Self::Sum => "sum",
            Self::Shortcut => "shortcut",
            Self::Mult => "mult",
            Self::Conc => "conc",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|color| color.key() == key)
    }
}

impl fmt::Display for LayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\\{}", self.macro_name())
    }
}

/// The fill of a block or ball.
///
/// Parsed from strings in this order:
/// 1. a palette key such as `conv` or `pool`,
/// 2. a CSS colour starting with `#` or written in functional notation,
/// 3. anything else is passed through as a TikZ colour expression.
///
/// # Examples
///
/// ```
/// use plotnet_core::color::{Fill, LayerColor};
///
/// let fill: Fill = "conv_relu".parse().unwrap();
/// assert_eq!(fill, Fill::Layer(LayerColor::ConvRelu));
/// assert_eq!(fill.to_string(), "\\ConvReluColor");
///
/// let raw: Fill = "{rgb:white,1;black,3}".parse().unwrap();
/// assert_eq!(raw.to_string(), "{rgb:white,1;black,3}");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub enum Fill {
    Layer(LayerColor),
    Color(Color),
    Tikz(String),
}

impl Fill {
    /// Creates a fill from a raw TikZ colour expression
    pub fn tikz(expression: impl Into<String>) -> Self {
        Self::Tikz(expression.into())
    }
}

impl From<LayerColor> for Fill {
    fn from(color: LayerColor) -> Self {
        Self::Layer(color)
    }
}

impl FromStr for Fill {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(layer) = LayerColor::from_key(s) {
            return Ok(Self::Layer(layer));
        }
        if s.starts_with('#') || s.ends_with(')') {
            return Color::new(s).map(Self::Color);
        }
        Ok(Self::Tikz(s.to_string()))
    }
}

impl TryFrom<String> for Fill {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Fill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layer(layer) => write!(f, "{layer}"),
            Self::Color(color) => f.write_str(&color.to_tikz()),
            Self::Tikz(expression) => f.write_str(expression),
        }
    }
}
