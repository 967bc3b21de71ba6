//! End-to-end run for one sample, and batches of samples.
//!
//! calibrate → grid → count → remap → (curate) → write. Every stage either
//! succeeds or returns a [`PipelineError`]; nothing is retried. A locked
//! sheet is the one failure that does not abort the run: the counts are
//! still returned in the [`RunReport`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use fieldgrid_calib::{
    fields_at_points, CalibrationError, CalibrationInput, Calibrator, LevelError,
};
use fieldgrid_core::{Corner, FieldIndex, UnknownHolder};
use fieldgrid_count::{draw_field_boxes, CellCounter, CountParamsError};
use fieldgrid_report::{fill_sheet, CountSheet, FieldSelection, SheetError};

use crate::io::{
    BatchConfig, BatchEntry, ConfigError, FieldReport, MissingInputPolicy, RunConfig, RunReport,
    SampleStatus, SelectionConfig,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("missing input image {0}")]
    MissingInput(PathBuf),
    #[error("failed to decode {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to write {path}: {source}")]
    ImageEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image buffer does not match {width}x{height}")]
    BufferSize { width: usize, height: usize },
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error(transparent)]
    UnknownHolder(#[from] UnknownHolder),
    #[error(transparent)]
    Count(#[from] CountParamsError),
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PipelineError {
    pub fn is_missing_input(&self) -> bool {
        matches!(self, PipelineError::MissingInput(_))
    }
}

/// Both images must exist before anything is computed.
fn check_inputs(config: &RunConfig) -> Result<(), PipelineError> {
    for path in [config.structural_path(), config.fluorescence_path()] {
        if !path.is_file() {
            return Err(PipelineError::MissingInput(path));
        }
    }
    Ok(())
}

/// Run one sample end to end.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(config), fields(sample = %config.sample_dir.display()))
)]
pub fn run_sample(config: &RunConfig) -> Result<RunReport, PipelineError> {
    check_inputs(config)?;

    let orientation = config.holders.orientation(&config.holder)?;
    let counter = CellCounter::new(config.count.clone())?;
    let input = CalibrationInput::from_clicks(&config.calibration)?;
    let grid = Calibrator::new(config.calibration_params).calibrate(&input)?;

    let fluo_path = config.fluorescence_path();
    let fluo = image::open(&fluo_path)
        .map_err(|source| PipelineError::ImageDecode {
            path: fluo_path.clone(),
            source,
        })?
        .to_rgb8();

    let structural_path = config.structural_path();
    match image::image_dimensions(&structural_path) {
        Ok(dims) if dims != fluo.dimensions() => log::warn!(
            "structural image is {}x{} but fluorescence image is {}x{}; images may not be registered",
            dims.0,
            dims.1,
            fluo.width(),
            fluo.height()
        ),
        Ok(_) => {}
        Err(source) => {
            return Err(PipelineError::ImageDecode {
                path: structural_path,
                source,
            })
        }
    }

    let outside = grid.fields_outside(fluo.width(), fluo.height());
    if !outside.is_empty() {
        log::warn!(
            "{} field(s) extend past the {}x{} image and are counted on the clipped part",
            outside.len(),
            fluo.width(),
            fluo.height()
        );
    }

    let size = grid.field_size();
    let scan: Vec<(FieldIndex, Corner, u32)> = grid
        .fields()
        .map(|(field, origin)| (field, origin, counter.count_field(&fluo, origin, size)))
        .collect();
    log::info!(
        "counted {} cells over {} fields",
        scan.iter().map(|s| s.2).sum::<u32>(),
        scan.len()
    );

    let physical = orientation.remap(scan);

    let selection = match &config.selection {
        SelectionConfig::All => FieldSelection::All,
        SelectionConfig::Fields { fields } => FieldSelection::curated(fields.iter().copied()),
        SelectionConfig::Points { points } => {
            FieldSelection::curated(fields_at_points(&grid, orientation, points))
        }
    };
    let selected_fields = selection.fields();
    if matches!(selection, FieldSelection::Curated(_)) {
        log::info!(
            "fields chosen: {}",
            selected_fields
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let counts: BTreeMap<FieldIndex, u32> = physical
        .iter()
        .map(|(&field, &(_, _, count))| (field, count))
        .collect();

    let sample_name = config.sample_name();
    let mut sheet = match config.template_path() {
        Some(path) => CountSheet::load(path)?,
        None => CountSheet::template(),
    };
    sheet.set_sample_name(sample_name.clone());
    fill_sheet(&mut sheet, &counts, &selection);

    let sheet_path = config.output_path();
    let (sheet_saved, sheet_error) = match sheet.write_csv(&sheet_path) {
        Ok(()) => (true, None),
        Err(e) if e.is_locked() => {
            log::error!("{e}");
            (false, Some(e.to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    let overlay_path = match config.overlay_path() {
        Some(path) => {
            let mut overlay = fluo;
            draw_field_boxes(&mut overlay, grid.origins(), size);
            overlay
                .save(&path)
                .map_err(|source| PipelineError::ImageEncode {
                    path: path.clone(),
                    source,
                })?;
            log::info!("overlay saved to {}", path.display());
            Some(path)
        }
        None => None,
    };

    let fields: Vec<FieldReport> = physical
        .iter()
        .map(|(&field, &(scan_field, origin, count))| FieldReport {
            field,
            scan_field,
            origin,
            count,
            selected: selection.contains(field),
        })
        .collect();
    let total_count = fields.iter().filter(|f| f.selected).map(|f| f.count).sum();

    let report = RunReport {
        sample_name,
        holder: config.holder.clone(),
        orientation,
        grid,
        fields,
        selected_fields,
        total_count,
        sheet_path,
        sheet_saved,
        sheet_error,
        overlay_path,
    };
    if let Some(path) = config.report_path() {
        report.write_json(&path)?;
        log::info!("report saved to {}", path.display());
    }
    Ok(report)
}

/// Run every sample in order.
///
/// Missing inputs follow the batch policy; any other failure stops the
/// batch.
pub fn run_batch(batch: &BatchConfig) -> Result<Vec<(BatchEntry, Option<RunReport>)>, PipelineError> {
    let mut out = Vec::with_capacity(batch.samples.len());
    for (i, sample) in batch.samples.iter().enumerate() {
        log::info!(
            "sample {}/{}: {}",
            i + 1,
            batch.samples.len(),
            sample.sample_dir.display()
        );
        match run_sample(sample) {
            Ok(report) => out.push((
                BatchEntry {
                    sample_dir: sample.sample_dir.clone(),
                    status: SampleStatus::Done,
                    message: report.sheet_error.clone(),
                },
                Some(report),
            )),
            Err(e) if e.is_missing_input() && batch.missing_input == MissingInputPolicy::Skip => {
                log::warn!("skipping {}: {e}", sample.sample_dir.display());
                out.push((
                    BatchEntry {
                        sample_dir: sample.sample_dir.clone(),
                        status: SampleStatus::Skipped,
                        message: Some(e.to_string()),
                    },
                    None,
                ));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}
