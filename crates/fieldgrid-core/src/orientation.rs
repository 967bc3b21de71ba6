//! Sample-holder orientation and the scan-order → physical field renumbering.
//!
//! Fields are located in the image in row-major scan order. Depending on how
//! the holder sat under the microscope, scan position `k` corresponds to a
//! different physical field number. The stepping rules below were read off the
//! numbered overlay for each holder orientation; `grid_alignment` expresses the
//! same permutations as grid transforms and the tests check both agree.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::field::{FieldIndex, FIELD_COUNT};
use crate::grid_alignment::{GridAlignment, GridTransform};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    N,
    S,
    E,
    W,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown orientation {0:?} (expected one of N, S, E, W)")]
pub struct OrientationParseError(pub String);

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::N,
        Orientation::S,
        Orientation::E,
        Orientation::W,
    ];

    fn start(self) -> i32 {
        match self {
            Orientation::N | Orientation::W => 1,
            Orientation::E => 64,
            Orientation::S => 57,
        }
    }

    fn step(self, current: i32) -> i32 {
        match self {
            Orientation::N => current + 1,
            Orientation::W => {
                if current < 57 {
                    current + 8
                } else {
                    current - 55
                }
            }
            Orientation::E => {
                if current < 9 {
                    current + 55
                } else {
                    current - 8
                }
            }
            Orientation::S => {
                if current % 8 == 0 {
                    current - 15
                } else {
                    current + 1
                }
            }
        }
    }

    /// Physical field number for every scan position, in scan order.
    pub fn physical_sequence(self) -> [FieldIndex; FIELD_COUNT as usize] {
        let mut out = [FieldIndex::FIRST; FIELD_COUNT as usize];
        let mut current = self.start();
        for slot in out.iter_mut() {
            *slot = FieldIndex::from_raw(current as u32);
            current = self.step(current);
        }
        out
    }

    /// Physical field number of a single scan position.
    pub fn physical_field(self, scan: FieldIndex) -> FieldIndex {
        self.physical_sequence()[scan.slot()]
    }

    /// The same permutation as a grid transform on `(col, row)`.
    pub fn grid_alignment(self) -> GridAlignment {
        match self {
            Orientation::N => GridAlignment::IDENTITY,
            Orientation::W => GridAlignment::new(GridTransform::TRANSPOSE, [0, 0]),
            Orientation::E => GridAlignment::new(GridTransform::ANTI_TRANSPOSE, [7, 7]),
            Orientation::S => GridAlignment::new(GridTransform::FLIP_ROWS, [0, 7]),
        }
    }

    /// Renumber scan-ordered values by physical field.
    ///
    /// Values past the 64th are ignored.
    pub fn remap<T>(self, scan_ordered: impl IntoIterator<Item = T>) -> BTreeMap<FieldIndex, T> {
        self.physical_sequence()
            .into_iter()
            .zip(scan_ordered)
            .collect()
    }
}

impl FromStr for Orientation {
    type Err = OrientationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "N" => Ok(Orientation::N),
            "S" => Ok(Orientation::S),
            "E" => Ok(Orientation::E),
            "W" => Ok(Orientation::W),
            _ => Err(OrientationParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Orientation::N => "N",
            Orientation::S => "S",
            Orientation::E => "E",
            Orientation::W => "W",
        };
        f.write_str(letter)
    }
}

/// Holder identifier → orientation lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HolderTable(HashMap<String, Orientation>);

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("holder {0:?} has no recorded orientation")]
pub struct UnknownHolder(pub String);

impl Default for HolderTable {
    fn default() -> Self {
        let mut table = HashMap::new();
        table.insert("W".to_string(), Orientation::W);
        table.insert("M7".to_string(), Orientation::W);
        Self(table)
    }
}

impl HolderTable {
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    pub fn insert(&mut self, holder: impl Into<String>, orientation: Orientation) {
        self.0.insert(holder.into(), orientation);
    }

    pub fn orientation(&self, holder: &str) -> Result<Orientation, UnknownHolder> {
        self.0
            .get(holder)
            .copied()
            .ok_or_else(|| UnknownHolder(holder.to_string()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn numbers(o: Orientation) -> Vec<u32> {
        o.physical_sequence().iter().map(|f| f.get()).collect()
    }

    #[test]
    fn every_orientation_is_a_permutation_of_all_fields() {
        for o in Orientation::ALL {
            let seen: BTreeSet<u32> = numbers(o).into_iter().collect();
            assert_eq!(seen.len(), 64, "{o} repeats a field");
            assert_eq!(seen.first(), Some(&1));
            assert_eq!(seen.last(), Some(&64));
        }
    }

    #[test]
    fn stepping_rules_match_grid_transforms() {
        for o in Orientation::ALL {
            let alignment = o.grid_alignment();
            for scan in FieldIndex::all() {
                assert_eq!(
                    alignment.map_field(scan),
                    Some(o.physical_field(scan)),
                    "{o} disagrees at scan position {scan}"
                );
            }
        }
    }

    #[test]
    fn sequence_heads_follow_the_overlay() {
        assert_eq!(&numbers(Orientation::N)[..3], &[1, 2, 3]);
        assert_eq!(&numbers(Orientation::W)[6..10], &[49, 57, 2, 10]);
        assert_eq!(&numbers(Orientation::E)[6..10], &[16, 8, 63, 55]);
        assert_eq!(&numbers(Orientation::S)[6..10], &[63, 64, 49, 50]);
        assert_eq!(numbers(Orientation::S)[63], 8);
    }

    #[test]
    fn remap_keys_values_by_physical_field() {
        let counts: Vec<u32> = (0..64).collect();
        let remapped = Orientation::W.remap(counts.iter().copied());
        assert_eq!(remapped.len(), 64);
        assert_eq!(remapped[&FieldIndex::new(9).unwrap()], 1);
        assert_eq!(remapped[&FieldIndex::new(2).unwrap()], 8);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("w".parse::<Orientation>(), Ok(Orientation::W));
        assert_eq!(" S ".parse::<Orientation>(), Ok(Orientation::S));
        assert!("X".parse::<Orientation>().is_err());
    }

    #[test]
    fn holder_table_defaults_and_unknowns() {
        let table = HolderTable::default();
        assert_eq!(table.orientation("M7"), Ok(Orientation::W));
        assert_eq!(
            table.orientation("M5"),
            Err(UnknownHolder("M5".to_string()))
        );
    }
}
