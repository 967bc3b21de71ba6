//! Facade crate for the `fieldgrid-*` workspace.
//!
//! This crate provides:
//! - re-exports of the stage crates (`core`, `calib`, `count`, `report`);
//! - JSON run/batch configuration and run reports ([`io`]);
//! - the end-to-end sample pipeline ([`pipeline`]);
//! - leveling of image files on disk ([`level`]);
//! - the `fieldgrid` command-line tool (feature `cli`).
//!
//! ## Quickstart
//!
//! ```no_run
//! use fieldgrid::io::RunConfig;
//! use fieldgrid::pipeline::run_sample;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::load_json("run.json")?;
//! let report = run_sample(&config)?;
//! println!("{}: {} cells", report.sample_name, report.total_count);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `fieldgrid::core`: field numbering, holder orientations, grid transforms.
//! - `fieldgrid::calib`: three-click calibration, curation, viewer model, leveling.
//! - `fieldgrid::count`: HSV threshold, morphology, contours, cell counter.
//! - `fieldgrid::report`: count sheets and per-day collection.

pub use fieldgrid_calib as calib;
pub use fieldgrid_core as core;
pub use fieldgrid_count as count;
pub use fieldgrid_report as report;

pub use fieldgrid_calib::{CalibrationClick, CalibrationError, Calibrator, FieldGrid};
pub use fieldgrid_core::{Corner, FieldIndex, Orientation};
pub use fieldgrid_count::{CellCounter, CountParams};
pub use fieldgrid_report::{CountSheet, FieldSelection};

pub mod io;
pub mod level;
pub mod pipeline;
