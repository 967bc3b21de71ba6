//! Fixed-layout count sheet.
//!
//! Two columns, stored as CSV without a header row:
//!
//! | row | A              | B               |
//! |-----|----------------|-----------------|
//! | 1   | sample name    |                 |
//! | 2   | 1              | count, field 1  |
//! | ... | ...            | ...             |
//! | 65  | 64             | count, field 64 |
//!
//! The count of field `n` lives at `B{n+1}`.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use fieldgrid_core::{FieldIndex, FIELD_COUNT};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Rows in a complete sheet: the name row plus one row per field.
pub const SHEET_ROWS: usize = FIELD_COUNT as usize + 1;

#[derive(thiserror::Error, Debug)]
pub enum SheetError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid cell address `{0}`")]
    InvalidCell(String),
    #[error("template has {rows} rows, need at least 65")]
    ShortTemplate { rows: usize },
    #[error("{path} is locked or read-only; close it in other programs and retry")]
    Locked { path: PathBuf },
}

impl SheetError {
    /// A save that failed only because the target was not writable.
    pub fn is_locked(&self) -> bool {
        matches!(self, SheetError::Locked { .. })
    }

    fn from_io(path: &Path, source: io::Error) -> Self {
        if is_lock_error(&source) {
            SheetError::Locked {
                path: path.to_path_buf(),
            }
        } else {
            SheetError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Count sheet for one sample; columns A and B only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountSheet {
    rows: Vec<[String; 2]>,
}

impl Default for CountSheet {
    fn default() -> Self {
        Self::template()
    }
}

impl CountSheet {
    /// Empty name, field numbers in A, zeros in B.
    pub fn template() -> Self {
        let mut rows = Vec::with_capacity(SHEET_ROWS);
        rows.push([String::new(), String::new()]);
        rows.extend(FieldIndex::all().map(|f| [f.to_string(), "0".to_string()]));
        Self { rows }
    }

    /// Read a sheet (or template) CSV. Columns past B are dropped; rows past
    /// 65 are kept as they are.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SheetError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| SheetError::from_io(path, e))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut rows = Vec::with_capacity(SHEET_ROWS);
        for record in reader.records() {
            let record = record?;
            let a = record.get(0).unwrap_or_default().to_string();
            let b = record.get(1).unwrap_or_default().to_string();
            rows.push([a, b]);
        }
        if rows.len() < SHEET_ROWS {
            return Err(SheetError::ShortTemplate { rows: rows.len() });
        }
        Ok(Self { rows })
    }

    /// `B{n+1}` for field `n`.
    pub fn cell_address(field: FieldIndex) -> String {
        format!("B{}", field.get() + 1)
    }

    pub fn sample_name(&self) -> &str {
        &self.rows[0][0]
    }

    pub fn set_sample_name(&mut self, name: impl Into<String>) {
        self.rows[0][0] = name.into();
    }

    pub fn set(&mut self, field: FieldIndex, count: u32) {
        self.rows[field.get() as usize][1] = count.to_string();
    }

    /// Count stored for `field`, if the cell holds a number.
    pub fn count(&self, field: FieldIndex) -> Option<u32> {
        self.rows[field.get() as usize][1].trim().parse().ok()
    }

    /// Raw cell text by address (`A1`, `B17`, ...). Cells past the sheet
    /// read as empty.
    pub fn cell(&self, address: &str) -> Result<&str, SheetError> {
        let (row, col) = parse_address(address)?;
        Ok(self
            .rows
            .get(row)
            .map(|r| r[col].as_str())
            .unwrap_or_default())
    }

    pub fn rows(&self) -> &[[String; 2]] {
        &self.rows
    }

    /// Create or overwrite `path`.
    ///
    /// Permission failures come back as [`SheetError::Locked`]; the sheet
    /// itself is untouched, so the caller can retry later.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), SheetError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| SheetError::from_io(path, e))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush().map_err(|e| SheetError::from_io(path, e))?;
        log::info!("sheet saved to {}", path.display());
        Ok(())
    }
}

/// Windows reports a file held open by another program as a sharing or lock
/// violation rather than `PermissionDenied`.
#[cfg(windows)]
const LOCK_OS_ERRORS: [i32; 2] = [32, 33];

fn is_lock_error(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::PermissionDenied {
        return true;
    }
    #[cfg(windows)]
    if e.raw_os_error().is_some_and(|code| LOCK_OS_ERRORS.contains(&code)) {
        return true;
    }
    false
}

/// `"B12"` → `(11, 1)`: zero-based row and column.
fn parse_address(address: &str) -> Result<(usize, usize), SheetError> {
    let invalid = || SheetError::InvalidCell(address.to_string());
    let mut chars = address.chars();
    let col = match chars.next().map(|c| c.to_ascii_uppercase()) {
        Some('A') => 0,
        Some('B') => 1,
        _ => return Err(invalid()),
    };
    let row: usize = chars.as_str().parse().map_err(|_| invalid())?;
    if row == 0 {
        return Err(invalid());
    }
    Ok((row - 1, col))
}
