use crate::error::{Axis, CalibrationError};
use crate::grid::FieldGrid;
use fieldgrid_core::{Corner, FieldIndex, GRID_SIDE};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Fixed geometry of the sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationParams {
    /// Pixel gap between two neighbouring fields, subtracted from the mean
    /// spacing to get the field size.
    pub inter_field_gap_px: i32,
    /// How the column distance between the two spacing fields is counted.
    pub column_rule: ColumnRule,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            inter_field_gap_px: 157,
            column_rule: ColumnRule::default(),
        }
    }
}

/// Column number used when measuring the horizontal spacing.
///
/// The lab procedure takes `index % 8`, which puts the last field of each row
/// in column 0. Spacing fields away from the right-hand column give the same
/// distance under both rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRule {
    /// `index % 8`.
    #[default]
    IndexModulo,
    /// `(index - 1) % 8`, the field's position in its row.
    Geometric,
}

impl ColumnRule {
    pub fn column(self, field: FieldIndex) -> u32 {
        match self {
            ColumnRule::IndexModulo => field.get() % GRID_SIDE,
            ColumnRule::Geometric => field.col(),
        }
    }
}

/// A clicked top-left field corner tagged with the field it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationClick {
    pub corner: Corner,
    pub field: FieldIndex,
}

impl CalibrationClick {
    pub fn new(corner: Corner, field: FieldIndex) -> Self {
        Self { corner, field }
    }
}

/// Reference corner plus the two far-apart corners used to measure spacing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationInput {
    pub reference: CalibrationClick,
    pub spacing: [CalibrationClick; 2],
}

impl CalibrationInput {
    /// Build from clicks in the order the operator made them.
    ///
    /// The first click is the reference corner; the next two measure spacing.
    /// Anything after the third click is ignored.
    pub fn from_clicks(clicks: &[CalibrationClick]) -> Result<Self, CalibrationError> {
        match clicks {
            [reference, a, b, rest @ ..] => {
                if !rest.is_empty() {
                    log::warn!(
                        "ignoring {} calibration click(s) beyond the first 3",
                        rest.len()
                    );
                }
                Ok(Self {
                    reference: *reference,
                    spacing: [*a, *b],
                })
            }
            _ => Err(CalibrationError::InsufficientCorners { got: clicks.len() }),
        }
    }
}

/// Turns three tagged corners into the 64 field origins.
#[derive(Clone, Debug, Default)]
pub struct Calibrator {
    params: CalibrationParams,
}

impl Calibrator {
    pub fn new(params: CalibrationParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CalibrationParams {
        &self.params
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, input),
            fields(reference = %input.reference.field)
        )
    )]
    pub fn calibrate(&self, input: &CalibrationInput) -> Result<FieldGrid, CalibrationError> {
        let [a, b] = input.spacing;

        let rule = self.params.column_rule;
        let cols_apart = rule.column(a.field).abs_diff(rule.column(b.field));
        if cols_apart == 0 {
            return Err(CalibrationError::DegenerateSpacing {
                axis: Axis::Column,
                first: a.field,
                second: b.field,
            });
        }
        let rows_apart = a.field.row().abs_diff(b.field.row());
        if rows_apart == 0 {
            return Err(CalibrationError::DegenerateSpacing {
                axis: Axis::Row,
                first: a.field,
                second: b.field,
            });
        }

        let col_spacing = spacing_per_step(a.corner.x, b.corner.x, cols_apart);
        let row_spacing = spacing_per_step(a.corner.y, b.corner.y, rows_apart);
        log::debug!(
            "spacing {col_spacing}x{row_spacing}px from fields {} and {} ({cols_apart} cols, {rows_apart} rows apart)",
            a.field,
            b.field
        );

        // Origins are derived in i64 so extreme clicks cannot wrap.
        let reference = input.reference;
        let one_x = i64::from(reference.corner.x) - i64::from(reference.field.col()) * col_spacing;
        let one_y = i64::from(reference.corner.y) - i64::from(reference.field.row()) * row_spacing;
        let raw: Vec<(FieldIndex, i64, i64)> = FieldIndex::all()
            .map(|f| {
                (
                    f,
                    one_x + i64::from(f.col()) * col_spacing,
                    one_y + i64::from(f.row()) * row_spacing,
                )
            })
            .collect();

        if let Some(&(field, x, y)) = raw.iter().find(|&&(_, x, y)| x < 0 || y < 0) {
            return Err(match to_corner(x, y) {
                Some(corner) => CalibrationError::NegativeCoordinate { field, corner },
                None => CalibrationError::CoordinateOverflow { field },
            });
        }
        let origins = raw
            .iter()
            .map(|&(field, x, y)| {
                to_corner(x, y).ok_or(CalibrationError::CoordinateOverflow { field })
            })
            .collect::<Result<Vec<Corner>, _>>()?;
        let field_one = origins[FieldIndex::FIRST.slot()];

        // Origins fit i32, which bounds both spacings.
        let col_spacing = i32::try_from(col_spacing).map_err(|_| {
            CalibrationError::CoordinateOverflow {
                field: FieldIndex::LAST,
            }
        })?;
        let row_spacing = i32::try_from(row_spacing).map_err(|_| {
            CalibrationError::CoordinateOverflow {
                field: FieldIndex::LAST,
            }
        })?;

        let gap = self.params.inter_field_gap_px;
        let size = round_half_even((f64::from(col_spacing) + f64::from(row_spacing)) / 2.0)
            - i64::from(gap);
        if size <= 0 {
            return Err(CalibrationError::NonPositiveFieldSize {
                size: i32::try_from(size).unwrap_or(i32::MIN),
                col_spacing,
                row_spacing,
                gap,
            });
        }
        let size = u32::try_from(size).map_err(|_| CalibrationError::FieldSizeOverflow { size })?;

        log::info!(
            "calibrated grid: field 1 at {field_one}, spacing {col_spacing}x{row_spacing}px, field size {size}px"
        );

        Ok(FieldGrid::new(
            origins,
            col_spacing.unsigned_abs(),
            row_spacing.unsigned_abs(),
            size,
        ))
    }
}

fn spacing_per_step(p: i32, q: i32, steps: u32) -> i64 {
    round_half_even(f64::from(p.abs_diff(q)) / f64::from(steps))
}

#[inline]
fn round_half_even(v: f64) -> i64 {
    v.round_ties_even() as i64
}

fn to_corner(x: i64, y: i64) -> Option<Corner> {
    Some(Corner::new(i32::try_from(x).ok()?, i32::try_from(y).ok()?))
}
