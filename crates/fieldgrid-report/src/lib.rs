//! Result writing for field-grid counts.
//!
//! [`CountSheet`] is the fixed per-sample layout (sample name in `A1`, the
//! count of field `n` in `B{n+1}`); [`fill_sheet`] writes a physical-field
//! count map through a [`FieldSelection`]. [`collect_results`] gathers many
//! sample sheets into one table per experiment day.

mod collect;
mod selection;
mod sheet;

pub use collect::{
    collect_results, collect_sheets, CollectError, CollectFilter, DayTable, SampleKey,
};
pub use selection::{fill_sheet, FieldSelection};
pub use sheet::{CountSheet, SheetError, SHEET_ROWS};
