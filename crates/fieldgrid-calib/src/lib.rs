//! Geometric calibration of the 8×8 field grid.
//!
//! Three operator clicks (a reference corner and two far-apart corners, each
//! tagged with its field number) fix the pixel origin of all 64 fields:
//!
//! ```
//! use fieldgrid_calib::{CalibrationClick, CalibrationInput, CalibrationParams, Calibrator};
//! use fieldgrid_core::{Corner, FieldIndex};
//!
//! let click = |x, y, f| CalibrationClick::new(Corner::new(x, y), FieldIndex::new(f).unwrap());
//! let input = CalibrationInput {
//!     reference: click(900, 700, 10),
//!     spacing: [click(200, 200, 1), click(1400, 1400, 55)],
//! };
//! let grid = Calibrator::new(CalibrationParams::default())
//!     .calibrate(&input)
//!     .unwrap();
//! assert_eq!(grid.col_spacing(), 200);
//! assert_eq!(grid.field_size(), 43);
//! assert_eq!(grid.origin(FieldIndex::FIRST), Corner::new(700, 500));
//! ```
//!
//! The crate also maps curation clicks to physical fields, models the
//! pan/zoom click viewer, and levels rotated images before calibration.

mod calibrator;
mod curate;
mod error;
mod grid;
mod level;
mod viewer;

pub use calibrator::{CalibrationClick, CalibrationInput, CalibrationParams, Calibrator, ColumnRule};
pub use curate::fields_at_points;
pub use error::{Axis, CalibrationError};
pub use grid::{FieldGrid, FieldGridError, FieldRect};
pub use level::{leveling_angle, leveling_transform, LevelError, LevelingTransform};
pub use viewer::{SessionStatus, ViewerEvent, ViewerSession, ViewerState, MIN_ZOOM_PERCENT};
