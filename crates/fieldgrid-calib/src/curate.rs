//! Click-to-field mapping for manual field curation.

use crate::grid::FieldGrid;
use fieldgrid_core::{Corner, FieldIndex, Orientation};

/// Physical field numbers hit by `points`, deduplicated in click order.
///
/// A click counts for a field only if it lies strictly inside the field
/// square. Clicks that miss every field are dropped.
pub fn fields_at_points(
    grid: &FieldGrid,
    orientation: Orientation,
    points: &[Corner],
) -> Vec<FieldIndex> {
    let mut picked: Vec<FieldIndex> = Vec::with_capacity(points.len());
    for &p in points {
        match grid.field_at(p) {
            Some(scan) => {
                let physical = orientation.physical_field(scan);
                if !picked.contains(&physical) {
                    picked.push(physical);
                }
            }
            None => log::debug!("click {p} is outside every field"),
        }
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CalibrationClick, CalibrationInput, CalibrationParams, Calibrator};

    fn grid() -> FieldGrid {
        let c = |x, y, f| CalibrationClick::new(Corner::new(x, y), FieldIndex::new(f).unwrap());
        Calibrator::new(CalibrationParams {
            inter_field_gap_px: 20,
            ..CalibrationParams::default()
        })
        .calibrate(&CalibrationInput {
            reference: c(10, 12, 1),
            spacing: [c(10, 12, 1), c(310, 362, 63)],
        })
        .unwrap()
    }

    #[test]
    fn clicks_map_to_physical_fields() {
        let grid = grid();
        // Scan field 2 sits at (60, 12); under W it is physical field 9.
        let picked = fields_at_points(&grid, Orientation::W, &[Corner::new(75, 30)]);
        assert_eq!(picked, vec![FieldIndex::new(9).unwrap()]);

        let picked = fields_at_points(&grid, Orientation::N, &[Corner::new(75, 30)]);
        assert_eq!(picked, vec![FieldIndex::new(2).unwrap()]);
    }

    #[test]
    fn borders_and_gaps_are_ignored() {
        let grid = grid();
        let points = [
            // On the left edge of field 1.
            Corner::new(10, 20),
            // In the gap between fields 1 and 2.
            Corner::new(50, 20),
            // Outside the grid.
            Corner::new(1000, 1000),
        ];
        assert!(fields_at_points(&grid, Orientation::N, &points).is_empty());
    }

    #[test]
    fn duplicates_keep_first_click_order() {
        let grid = grid();
        let points = [
            Corner::new(380, 390),
            Corner::new(20, 20),
            Corner::new(385, 385),
        ];
        let picked = fields_at_points(&grid, Orientation::N, &points);
        assert_eq!(picked, vec![FieldIndex::LAST, FieldIndex::FIRST]);
    }
}
