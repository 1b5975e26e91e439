//! PlotNet Core Types and Primitive Emitter
//!
//! This crate provides the foundational types and the primitive emitter for
//! PlotNet layer diagrams. It includes:
//!
//! - **Identifiers**: Block names and predecessor handles ([`identifier`] module)
//! - **Anchors**: Named reference points on block boundaries ([`anchor`] module)
//! - **Colors**: Layer palette and fill expressions ([`color`] module)
//! - **Geometry**: Offsets, block sizes and widths ([`geometry`] module)
//! - **Draw**: One TikZ fragment per visual primitive ([`draw`] module)
//! - **Document**: Fixed preamble, palette and document assembly ([`document`] module)
//!
//! Every emitter function is a pure function of its inputs: calling it twice
//! with the same arguments yields byte-identical text.

pub mod anchor;
pub mod color;
pub mod document;
pub mod draw;
pub mod geometry;
pub mod identifier;

mod error;

pub use error::{Error, Result};
