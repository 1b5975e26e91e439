//! Primitive emitters.
//!
//! Each emitter translates one fully resolved visual primitive into its TikZ
//! text, with no inference and no side effects. Calling an emitter twice with
//! the same arguments yields byte-identical output.
//!
//! | Primitive | Emitter |
//! |-----------|---------|
//! | Box / banded box | [`emit_box`] |
//! | Operator ball | [`emit_ball`] |
//! | Connector | [`emit_connector`], [`emit_skip`] |
//! | Size projection | [`emit_resample`], [`emit_full_connection`] |
//! | Coordinate | [`emit_coordinate`], [`emit_path_node`] |
//! | Text, image, grid | [`emit_text`], [`emit_image`], [`emit_grid`] |

mod annotation;
mod ball;
mod block;
mod connector;
mod fragment;
mod route;
mod stroke;

pub use annotation::{
    Image, MIDWAY, TextNode, coordinate_along, coordinate_projected, emit_coordinate, emit_grid,
    emit_image, emit_path_node, emit_text,
};
pub use ball::{BALL_RADIUS, Ball, BallOp, emit_ball};
pub use block::{Band, BandSide, BlockBox, emit_box};
pub use connector::{
    Connector, DEFAULT_POSITION, Link, emit_connector, emit_full_connection, emit_resample,
    emit_skip,
};
pub use fragment::{Fragment, Fragments};
pub use route::{
    COPY_MIDARROW, Coord, Label, MIDARROW, PathOp, Projection, Route, Segment, Step,
};
pub use stroke::ConnectionStyle;
