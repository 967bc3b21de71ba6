use fieldgrid_core::{Corner, FieldIndex};

/// Which spacing axis a degenerate calibration collapsed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Column,
    Row,
}

/// Calibration failures. All of them are fatal for the sample; the operator
/// has to pick new corners.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CalibrationError {
    #[error("calibration needs 3 corners, got {got}")]
    InsufficientCorners { got: usize },
    #[error("calibration fields {first} and {second} share a {axis:?}; pick fields that differ in both row and column")]
    DegenerateSpacing {
        axis: Axis,
        first: FieldIndex,
        second: FieldIndex,
    },
    #[error("field {field} lands at negative coordinate {corner}; recalibrate")]
    NegativeCoordinate { field: FieldIndex, corner: Corner },
    #[error("derived field size {size}px is not positive (spacing {col_spacing}x{row_spacing}px, gap {gap}px)")]
    NonPositiveFieldSize {
        size: i32,
        col_spacing: i32,
        row_spacing: i32,
        gap: i32,
    },
    #[error("field {field} lands outside the representable pixel range; check the calibration clicks")]
    CoordinateOverflow { field: FieldIndex },
    #[error("derived field size {size}px does not fit a pixel count")]
    FieldSizeOverflow { size: i64 },
    #[error("calibration aborted: viewer closed before confirmation")]
    Aborted,
}
