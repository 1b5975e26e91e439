//! Line styles for connectors.
//!
//! The named styles are defined by the document preamble (`connection`,
//! `copyconnection`, `fuseconnection`); [`ConnectionStyle::DenselyDashed`] is
//! the built-in TikZ dash pattern used for projection lines.
//!
//! # TikZ Mapping
//!
//! | Variant | TikZ option |
//! |---------|-------------|
//! | `Connection` | `connection` |
//! | `Copy` | `copyconnection` |
//! | `Fuse` | `fuseconnection` |
//! | `DenselyDashed` | `densely dashed` |

use std::{fmt, str::FromStr};

use serde::Deserialize;

/// The line style of a drawn path.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum ConnectionStyle {
    /// Regular data-flow arrow (default)
    #[default]
    Connection,
    /// Tensor forwarded past intermediate blocks
    Copy,
    /// External input merging into a block
    Fuse,
    /// Projection lines between corners of two blocks
    DenselyDashed,
}

impl ConnectionStyle {
    /// Returns the TikZ option naming this style
    pub fn to_tikz_value(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Copy => "copyconnection",
            Self::Fuse => "fuseconnection",
            Self::DenselyDashed => "densely dashed",
        }
    }
}

impl FromStr for ConnectionStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connection" => Ok(Self::Connection),
            "copy" | "copyconnection" => Ok(Self::Copy),
            "fuse" | "fuseconnection" => Ok(Self::Fuse),
            "dashed" | "densely dashed" => Ok(Self::DenselyDashed),
            _ => Err(format!(
                "invalid connection style `{s}`, valid values: connection, copy, fuse, dashed"
            )),
        }
    }
}

impl TryFrom<String> for ConnectionStyle {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ConnectionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_tikz_value())
    }
}
