//! Core types for field-grid sample analysis.
//!
//! A sample carries an 8×8 array of fields. This crate holds the pieces every
//! other stage shares: field numbering, holder orientations and the
//! scan-order → physical renumbering, integer grid transforms, and the small
//! image/homography helpers used to level images. It does not depend on any
//! image codec.

mod field;
mod grid_alignment;
mod homography;
mod image;
mod logger;
mod orientation;

pub use field::{
    Corner, FieldIndex, FieldIndexError, FIELD_COUNT, GRID_SIDE, REFERENCE_FIELDS,
};
pub use grid_alignment::{GridAlignment, GridTransform};
pub use homography::{warp_rgb, Homography};
pub use image::{sample_bilinear_rgb, RgbImage, RgbImageView};
pub use orientation::{HolderTable, Orientation, OrientationParseError, UnknownHolder};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
