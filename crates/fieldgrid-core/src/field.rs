use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of fields along one side of the sample grid.
pub const GRID_SIDE: u32 = 8;

/// Total number of fields on a sample.
pub const FIELD_COUNT: u32 = GRID_SIDE * GRID_SIDE;

/// The four corner fields that every curated selection keeps.
pub const REFERENCE_FIELDS: [FieldIndex; 4] = [
    FieldIndex(1),
    FieldIndex(GRID_SIDE),
    FieldIndex(FIELD_COUNT - GRID_SIDE + 1),
    FieldIndex(FIELD_COUNT),
];

/// Field number in `1..=64`, row-major with field 1 at the top-left.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct FieldIndex(u32);

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("field index {0} outside 1..=64")]
pub struct FieldIndexError(pub u32);

impl FieldIndex {
    pub const FIRST: FieldIndex = FieldIndex(1);
    pub const LAST: FieldIndex = FieldIndex(FIELD_COUNT);

    pub fn new(n: u32) -> Option<Self> {
        (1..=FIELD_COUNT).contains(&n).then_some(Self(n))
    }

    /// Caller guarantees `n` is in range.
    #[inline]
    pub(crate) fn from_raw(n: u32) -> Self {
        debug_assert!((1..=FIELD_COUNT).contains(&n), "field index {n} out of range");
        Self(n)
    }

    /// Field for 0-based `(row, col)` grid coordinates.
    pub fn from_row_col(row: u32, col: u32) -> Option<Self> {
        if row >= GRID_SIDE || col >= GRID_SIDE {
            return None;
        }
        Some(Self(row * GRID_SIDE + col + 1))
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    /// 0-based row.
    #[inline]
    pub fn row(self) -> u32 {
        (self.0 - 1) / GRID_SIDE
    }

    /// 0-based column.
    #[inline]
    pub fn col(self) -> u32 {
        (self.0 - 1) % GRID_SIDE
    }

    /// Position in a 64-element scan-order array.
    #[inline]
    pub fn slot(self) -> usize {
        (self.0 - 1) as usize
    }

    pub fn is_reference(self) -> bool {
        REFERENCE_FIELDS.contains(&self)
    }

    /// All 64 fields in scan order.
    pub fn all() -> impl Iterator<Item = FieldIndex> + Clone {
        (1..=FIELD_COUNT).map(FieldIndex)
    }
}

impl TryFrom<u32> for FieldIndex {
    type Error = FieldIndexError;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        Self::new(n).ok_or(FieldIndexError(n))
    }
}

impl From<FieldIndex> for u32 {
    fn from(f: FieldIndex) -> u32 {
        f.0
    }
}

impl fmt::Display for FieldIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A pixel coordinate in full-image space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Corner {
    pub x: i32,
    pub y: i32,
}

impl Corner {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    #[inline]
    pub fn is_non_negative(self) -> bool {
        self.x >= 0 && self.y >= 0
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_and_col_follow_row_major_numbering() {
        let f = FieldIndex::new(1).unwrap();
        assert_eq!((f.row(), f.col()), (0, 0));
        let f = FieldIndex::new(8).unwrap();
        assert_eq!((f.row(), f.col()), (0, 7));
        let f = FieldIndex::new(9).unwrap();
        assert_eq!((f.row(), f.col()), (1, 0));
        let f = FieldIndex::new(64).unwrap();
        assert_eq!((f.row(), f.col()), (7, 7));
        assert_eq!(FieldIndex::from_row_col(3, 4), FieldIndex::new(29));
        assert_eq!(FieldIndex::from_row_col(8, 0), None);
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        assert!(FieldIndex::new(0).is_none());
        assert!(FieldIndex::new(65).is_none());
        assert_eq!(FieldIndex::try_from(70), Err(FieldIndexError(70)));
    }

    #[test]
    fn reference_fields_are_the_grid_corners() {
        let refs: Vec<u32> = REFERENCE_FIELDS.iter().map(|f| f.get()).collect();
        assert_eq!(refs, vec![1, 8, 57, 64]);
        assert!(FieldIndex::new(57).unwrap().is_reference());
        assert!(!FieldIndex::new(2).unwrap().is_reference());
    }

    #[test]
    fn serde_rejects_invalid_field_numbers() {
        let ok: FieldIndex = serde_json::from_str("12").unwrap();
        assert_eq!(ok.get(), 12);
        assert!(serde_json::from_str::<FieldIndex>("0").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "12");
    }
}
