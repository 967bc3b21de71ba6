//! Per-field fluorescent cell counting.
//!
//! Each field crop goes through the same fixed chain:
//!
//! 1. HSV threshold against a near-black background range, inverted so cells
//!    are foreground ([`foreground_mask`]);
//! 2. opening then closing with a 3×3 cross ([`clean_mask`]);
//! 3. external contours only ([`external_contours`]);
//! 4. per-contour area classification into noise, one cell, several merged
//!    cells or an artifact ([`AreaThresholds::classify`]).
//!
//! ```
//! use fieldgrid_count::{CellCounter, CountParams};
//! use image::{Rgb, RgbImage};
//!
//! let mut field = RgbImage::from_pixel(40, 40, Rgb([8, 8, 8]));
//! for y in 10..18 {
//!     for x in 10..18 {
//!         field.put_pixel(x, y, Rgb([40, 220, 60]));
//!     }
//! }
//! let counter = CellCounter::new(CountParams::default()).unwrap();
//! assert_eq!(counter.count(&field), 1);
//! ```

mod contours;
mod counter;
mod hsv;
mod mask;
mod overlay;

pub use contours::{external_contours, polygon_area};
pub use counter::{
    crop_field, AreaThresholds, Blob, BlobVerdict, CellCounter, CountParams, CountParamsError,
    FieldCount,
};
pub use hsv::{rgb_to_hsv, Hsv, HsvRange};
pub use mask::{clean_mask, foreground_mask, MorphologyParams, FOREGROUND};
pub use overlay::{draw_field_boxes, BOX_COLOR, BOX_THICKNESS};
