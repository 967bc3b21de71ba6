use serde::{Deserialize, Serialize};

use crate::field::{FieldIndex, GRID_SIDE};

/// Integer 2D transform (a 2×2 matrix) on field grid coordinates.
///
/// Coordinates are `(i, j) = (col, row)`; the transform computes
/// `(i', j') = (a*i + b*j, c*i + d*j)`. Holder orientations are elements of
/// the dihedral group on the square grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridTransform {
    pub a: i32,
    pub b: i32,
    pub c: i32,
    pub d: i32,
}

impl GridTransform {
    pub const IDENTITY: GridTransform = GridTransform {
        a: 1,
        b: 0,
        c: 0,
        d: 1,
    };

    /// Swap rows and columns.
    pub const TRANSPOSE: GridTransform = GridTransform {
        a: 0,
        b: 1,
        c: 1,
        d: 0,
    };

    /// Transpose across the other diagonal.
    pub const ANTI_TRANSPOSE: GridTransform = GridTransform {
        a: 0,
        b: -1,
        c: -1,
        d: 0,
    };

    /// Mirror rows top-to-bottom.
    pub const FLIP_ROWS: GridTransform = GridTransform {
        a: 1,
        b: 0,
        c: 0,
        d: -1,
    };

    #[inline]
    pub fn apply(&self, i: i32, j: i32) -> [i32; 2] {
        [self.a * i + self.b * j, self.c * i + self.d * j]
    }

    #[inline]
    pub fn det(&self) -> i32 {
        self.a * self.d - self.b * self.c
    }

    /// Invert the transform if it is unimodular (det = ±1).
    pub fn inverse(&self) -> Option<GridTransform> {
        let det = self.det();
        if det != 1 && det != -1 {
            return None;
        }
        Some(GridTransform {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
        })
    }
}

/// A grid alignment `dst = transform(src) + translation`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridAlignment {
    pub transform: GridTransform,
    pub translation: [i32; 2],
}

impl GridAlignment {
    pub const IDENTITY: GridAlignment = GridAlignment {
        transform: GridTransform::IDENTITY,
        translation: [0, 0],
    };

    pub const fn new(transform: GridTransform, translation: [i32; 2]) -> Self {
        Self {
            transform,
            translation,
        }
    }

    #[inline]
    pub fn map(&self, i: i32, j: i32) -> [i32; 2] {
        let [x, y] = self.transform.apply(i, j);
        [x + self.translation[0], y + self.translation[1]]
    }

    /// Map a field through the alignment; `None` if it lands off the 8×8 grid.
    pub fn map_field(&self, field: FieldIndex) -> Option<FieldIndex> {
        let [i, j] = self.map(field.col() as i32, field.row() as i32);
        let side = GRID_SIDE as i32;
        if !(0..side).contains(&i) || !(0..side).contains(&j) {
            return None;
        }
        FieldIndex::from_row_col(j as u32, i as u32)
    }

    pub fn inverse(&self) -> Option<GridAlignment> {
        let inv = self.transform.inverse()?;
        let [tx, ty] = self.translation;
        let [itx, ity] = inv.apply(-tx, -ty);
        Some(GridAlignment {
            transform: inv,
            translation: [itx, ity],
        })
    }
}
