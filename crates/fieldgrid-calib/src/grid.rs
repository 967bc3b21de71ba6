//! Calibrated field grid: 64 top-left origins plus a shared field size.

use fieldgrid_core::{Corner, FieldIndex, FIELD_COUNT};
use serde::{Deserialize, Serialize};

/// Square pixel region of one field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRect {
    pub origin: Corner,
    pub size: u32,
}

impl FieldRect {
    /// Strict containment, matching how clicked points are assigned to fields.
    pub fn contains_strict(&self, p: Corner) -> bool {
        let size = i64::from(self.size);
        let (x0, y0) = (i64::from(self.origin.x), i64::from(self.origin.y));
        let (x, y) = (i64::from(p.x), i64::from(p.y));
        x0 < x && x < x0 + size && y0 < y && y < y0 + size
    }

    /// Whether the rect lies fully inside a `width × height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        let right = i64::from(self.origin.x) + i64::from(self.size);
        let bottom = i64::from(self.origin.y) + i64::from(self.size);
        self.origin.is_non_negative() && right <= i64::from(width) && bottom <= i64::from(height)
    }
}

/// Why a stored grid was rejected on load.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldGridError {
    #[error("grid has {got} origins, expected 64")]
    WrongOriginCount { got: usize },
    #[error("field {field} has negative origin {corner}")]
    NegativeOrigin { field: FieldIndex, corner: Corner },
    #[error("grid field size is zero")]
    EmptyField,
}

/// Field origins in scan order (row-major, field 1 first).
///
/// Built by [`crate::Calibrator`], which guarantees 64 non-negative origins
/// and a positive field size. Deserialization checks the same.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFieldGrid")]
pub struct FieldGrid {
    origins: Vec<Corner>,
    col_spacing: u32,
    row_spacing: u32,
    field_size: u32,
}

#[derive(Deserialize)]
struct RawFieldGrid {
    origins: Vec<Corner>,
    col_spacing: u32,
    row_spacing: u32,
    field_size: u32,
}

impl TryFrom<RawFieldGrid> for FieldGrid {
    type Error = FieldGridError;

    fn try_from(raw: RawFieldGrid) -> Result<Self, Self::Error> {
        if raw.origins.len() != FIELD_COUNT as usize {
            return Err(FieldGridError::WrongOriginCount {
                got: raw.origins.len(),
            });
        }
        if let Some((field, corner)) = FieldIndex::all()
            .zip(raw.origins.iter().copied())
            .find(|(_, c)| !c.is_non_negative())
        {
            return Err(FieldGridError::NegativeOrigin { field, corner });
        }
        if raw.field_size == 0 {
            return Err(FieldGridError::EmptyField);
        }
        Ok(Self {
            origins: raw.origins,
            col_spacing: raw.col_spacing,
            row_spacing: raw.row_spacing,
            field_size: raw.field_size,
        })
    }
}

impl FieldGrid {
    pub(crate) fn new(
        origins: Vec<Corner>,
        col_spacing: u32,
        row_spacing: u32,
        field_size: u32,
    ) -> Self {
        debug_assert_eq!(origins.len(), FIELD_COUNT as usize);
        Self {
            origins,
            col_spacing,
            row_spacing,
            field_size,
        }
    }

    /// Horizontal pixel distance between neighbouring field origins.
    pub fn col_spacing(&self) -> u32 {
        self.col_spacing
    }

    /// Vertical pixel distance between neighbouring field origins.
    pub fn row_spacing(&self) -> u32 {
        self.row_spacing
    }

    pub fn field_size(&self) -> u32 {
        self.field_size
    }

    pub fn origin(&self, field: FieldIndex) -> Corner {
        self.origins[field.slot()]
    }

    pub fn rect(&self, field: FieldIndex) -> FieldRect {
        FieldRect {
            origin: self.origin(field),
            size: self.field_size,
        }
    }

    /// `(field, origin)` pairs in scan order.
    pub fn fields(&self) -> impl Iterator<Item = (FieldIndex, Corner)> + '_ {
        FieldIndex::all().zip(self.origins.iter().copied())
    }

    pub fn origins(&self) -> &[Corner] {
        &self.origins
    }

    /// Scan-order field whose square strictly contains `p`.
    pub fn field_at(&self, p: Corner) -> Option<FieldIndex> {
        FieldIndex::all().find(|&f| self.rect(f).contains_strict(p))
    }

    /// Fields that do not fit inside a `width × height` image.
    pub fn fields_outside(&self, width: u32, height: u32) -> Vec<FieldIndex> {
        FieldIndex::all()
            .filter(|&f| !self.rect(f).fits_within(width, height))
            .collect()
    }
}
