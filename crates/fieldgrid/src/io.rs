//! JSON run/batch configuration and run reports.

use std::fs;
use std::path::{Path, PathBuf};

use fieldgrid_calib::{CalibrationClick, CalibrationParams, FieldGrid};
use fieldgrid_core::{Corner, FieldIndex, HolderTable, Orientation};
use fieldgrid_count::CountParams;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub const DEFAULT_STRUCTURAL_IMAGE: &str = "Zbehandlet - Rotated BF image.tif";
pub const DEFAULT_FLUORESCENCE_IMAGE: &str = "Zbehandlet - Rotated UV image.tif";
pub const DEFAULT_SHEET_NAME: &str = "CellCountData.csv";

fn default_structural_image() -> PathBuf {
    PathBuf::from(DEFAULT_STRUCTURAL_IMAGE)
}

fn default_fluorescence_image() -> PathBuf {
    PathBuf::from(DEFAULT_FLUORESCENCE_IMAGE)
}

/// Which fields go into the sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SelectionConfig {
    #[default]
    All,
    /// Physical field numbers picked by the operator.
    Fields { fields: Vec<FieldIndex> },
    /// Operator clicks on the leveled image, mapped to fields after
    /// calibration.
    Points { points: Vec<Corner> },
}

/// One sample, end to end.
///
/// Relative image paths resolve against `sample_dir`; a relative
/// `sample_dir` resolves against the directory of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub sample_dir: PathBuf,
    #[serde(default = "default_structural_image")]
    pub structural_image: PathBuf,
    #[serde(default = "default_fluorescence_image")]
    pub fluorescence_image: PathBuf,
    /// Holder identifier, looked up in `holders`.
    pub holder: String,
    #[serde(default)]
    pub holders: HolderTable,
    /// Reference click first, then the two spacing clicks.
    pub calibration: Vec<CalibrationClick>,
    #[serde(default)]
    pub calibration_params: CalibrationParams,
    #[serde(default)]
    pub count: CountParams,
    #[serde(default)]
    pub selection: SelectionConfig,
    /// Defaults to the name of `sample_dir`.
    #[serde(default)]
    pub sample_name: Option<String>,
    /// Template sheet; the built-in layout when absent.
    #[serde(default)]
    pub template_path: Option<PathBuf>,
    /// Defaults to `CellCountData.csv` inside `sample_dir`.
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    #[serde(default)]
    pub overlay_path: Option<PathBuf>,
    #[serde(default)]
    pub report_path: Option<PathBuf>,
}

impl RunConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&raw)?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve a relative `sample_dir` against `base`.
    pub fn rebase(&mut self, base: &Path) {
        if self.sample_dir.is_relative() {
            self.sample_dir = base.join(&self.sample_dir);
        }
    }

    pub fn structural_path(&self) -> PathBuf {
        self.sample_dir.join(&self.structural_image)
    }

    pub fn fluorescence_path(&self) -> PathBuf {
        self.sample_dir.join(&self.fluorescence_image)
    }

    pub fn sample_name(&self) -> String {
        self.sample_name.clone().unwrap_or_else(|| {
            self.sample_dir
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }

    /// Resolve the output sheet path.
    pub fn output_path(&self) -> PathBuf {
        match &self.output_path {
            Some(p) => self.sample_dir.join(p),
            None => self.sample_dir.join(DEFAULT_SHEET_NAME),
        }
    }

    pub fn template_path(&self) -> Option<PathBuf> {
        self.template_path.as_ref().map(|p| self.sample_dir.join(p))
    }

    pub fn overlay_path(&self) -> Option<PathBuf> {
        self.overlay_path.as_ref().map(|p| self.sample_dir.join(p))
    }

    pub fn report_path(&self) -> Option<PathBuf> {
        self.report_path.as_ref().map(|p| self.sample_dir.join(p))
    }
}

/// What to do with a sample whose images are missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingInputPolicy {
    /// Stop the whole batch.
    #[default]
    Fail,
    /// Log it and continue with the next sample.
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub samples: Vec<RunConfig>,
    #[serde(default)]
    pub missing_input: MissingInputPolicy,
}

impl BatchConfig {
    /// Load a JSON batch; relative sample directories resolve against the
    /// batch file's directory.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let mut batch: Self = serde_json::from_str(&raw)?;
        if let Some(base) = path.parent() {
            for sample in &mut batch.samples {
                sample.rebase(base);
            }
        }
        Ok(batch)
    }
}

/// One field of a finished run, keyed by physical field number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldReport {
    pub field: FieldIndex,
    pub scan_field: FieldIndex,
    pub origin: Corner,
    pub count: u32,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub sample_name: String,
    pub holder: String,
    pub orientation: Orientation,
    pub grid: FieldGrid,
    /// Ordered by physical field number.
    pub fields: Vec<FieldReport>,
    pub selected_fields: Vec<FieldIndex>,
    /// Sum over the selected fields.
    pub total_count: u32,
    pub sheet_path: PathBuf,
    pub sheet_saved: bool,
    /// Why the sheet could not be saved, when it was locked.
    #[serde(default)]
    pub sheet_error: Option<String>,
    #[serde(default)]
    pub overlay_path: Option<PathBuf>,
}

impl RunReport {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn count(&self, field: FieldIndex) -> Option<u32> {
        self.fields.iter().find(|f| f.field == field).map(|f| f.count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleStatus {
    Done,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    pub sample_dir: PathBuf,
    pub status: SampleStatus,
    #[serde(default)]
    pub message: Option<String>,
}
