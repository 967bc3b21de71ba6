//! Combine per-sample sheets into one table per experiment day.
//!
//! Sheets are identified by name: split on `_`, the day is the third part and
//! the sample number the fifth (`X_Dag_3_sample_2_`). A sheet is found either
//! as `<name>.csv` directly in the source folder, or as any `.csv` inside a
//! `<name>/` sample folder.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::sheet::{CountSheet, SheetError};

#[derive(thiserror::Error, Debug)]
pub enum CollectError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> CollectError + '_ {
    move |source| CollectError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Day and sample number parsed from a sheet name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleKey {
    pub day: u32,
    pub sample: u32,
}

impl SampleKey {
    pub fn parse(name: &str) -> Option<Self> {
        let parts: Vec<&str> = name.split('_').collect();
        let day = parts.get(2)?.trim().parse().ok()?;
        let sample = parts.get(4)?.trim().parse().ok()?;
        Some(Self { day, sample })
    }
}

/// Optional day/sample allow-lists; `None` accepts everything.
#[derive(Clone, Debug, Default)]
pub struct CollectFilter {
    pub days: Option<BTreeSet<u32>>,
    pub samples: Option<BTreeSet<u32>>,
}

impl CollectFilter {
    pub fn accepts(&self, key: SampleKey) -> bool {
        self.days.as_ref().is_none_or(|d| d.contains(&key.day))
            && self.samples.as_ref().is_none_or(|s| s.contains(&key.sample))
    }
}

/// One day's combined counts: the field column plus one column per sample.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DayTable {
    pub fields: Vec<String>,
    pub samples: BTreeMap<u32, Vec<String>>,
}

impl DayTable {
    fn add(&mut self, sample: u32, sheet: &CountSheet) {
        let rows = &sheet.rows()[1..];
        if self.fields.is_empty() {
            self.fields = rows.iter().map(|r| r[0].clone()).collect();
        }
        let counts = rows.iter().map(|r| r[1].clone()).collect();
        if self.samples.insert(sample, counts).is_some() {
            log::warn!("sample {sample} seen twice; keeping the last sheet");
        }
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), CollectError> {
        let mut writer = csv::Writer::from_path(path)?;
        let mut header = vec!["Field".to_string()];
        header.extend(self.samples.keys().map(|n| format!("Sample{n}")));
        writer.write_record(&header)?;

        let height = self
            .samples
            .values()
            .map(Vec::len)
            .chain(std::iter::once(self.fields.len()))
            .max()
            .unwrap_or(0);
        for i in 0..height {
            let mut row = vec![self.fields.get(i).cloned().unwrap_or_default()];
            row.extend(
                self.samples
                    .values()
                    .map(|col| col.get(i).cloned().unwrap_or_default()),
            );
            writer.write_record(&row)?;
        }
        writer.flush().map_err(io_err(path))?;
        Ok(())
    }
}

/// `(name, path)` for every candidate sheet under `source`, sorted by name.
fn candidate_sheets(source: &Path) -> Result<Vec<(String, PathBuf)>, CollectError> {
    let mut found = Vec::new();
    for entry in fs::read_dir(source).map_err(io_err(source))? {
        let path = entry.map_err(io_err(source))?.path();
        if path.is_dir() {
            let name = file_name(&path);
            let mut inner: Vec<PathBuf> = fs::read_dir(&path)
                .map_err(io_err(&path))?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| is_csv(p))
                .collect();
            inner.sort();
            match inner.len() {
                0 => log::info!("no sheet in {}, skipping", path.display()),
                1 => {}
                n => log::warn!("{n} sheets in {}, using the first", path.display()),
            }
            if let Some(sheet) = inner.into_iter().next() {
                found.push((name, sheet));
            }
        } else if is_csv(&path) {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            found.push((name, path));
        }
    }
    found.sort();
    Ok(found)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Group every matching sheet under `source` by day.
pub fn collect_sheets(
    source: &Path,
    filter: &CollectFilter,
) -> Result<BTreeMap<u32, DayTable>, CollectError> {
    let mut days: BTreeMap<u32, DayTable> = BTreeMap::new();
    for (name, path) in candidate_sheets(source)? {
        let Some(key) = SampleKey::parse(&name) else {
            log::info!("{name} does not match the day/sample pattern, skipping");
            continue;
        };
        if !filter.accepts(key) {
            log::info!("{name} is outside the requested days/samples, skipping");
            continue;
        }
        log::info!("processing {}", path.display());
        let sheet = CountSheet::load(&path)?;
        days.entry(key.day).or_default().add(key.sample, &sheet);
    }
    Ok(days)
}

/// Collect and write `Dag_<day>_combined.csv` files into `target`.
pub fn collect_results(
    source: &Path,
    target: &Path,
    filter: &CollectFilter,
) -> Result<Vec<PathBuf>, CollectError> {
    fs::create_dir_all(target).map_err(io_err(target))?;
    let days = collect_sheets(source, filter)?;
    let mut written = Vec::with_capacity(days.len());
    for (day, table) in &days {
        let path = target.join(format!("Dag_{day}_combined.csv"));
        table.write_csv(&path)?;
        log::info!("combined data for day {day} saved to {}", path.display());
        written.push(path);
    }
    Ok(written)
}
