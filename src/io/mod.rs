mod csv_io;
mod excel_io;
mod json_io;
mod transcript;

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::InputConfig;
use crate::error::FitError;
use crate::models::{TimeSeries, Trajectory};

pub use csv_io::{read_csv, read_csv_from_bytes, write_trajectory_csv};
pub use excel_io::{read_excel, write_trajectory_excel};
pub use json_io::{read_json, write_report_json, write_trajectory_json, FitReport, ForecastSummary};
pub use transcript::excel_to_markdown;

/// Trait for reading an observed series from a file.
pub trait SeriesReader {
    fn read(&self, path: &Path, columns: &InputConfig) -> Result<TimeSeries, FitError>;
}

/// Trait for writing a simulated trajectory to a file.
pub trait TrajectoryWriter {
    fn write(&self, trajectory: &Trajectory, path: &Path) -> Result<(), FitError>;
}

/// CSV format reader/writer.
pub struct CsvFormat;

impl SeriesReader for CsvFormat {
    fn read(&self, path: &Path, columns: &InputConfig) -> Result<TimeSeries, FitError> {
        read_csv(path, columns)
    }
}

impl TrajectoryWriter for CsvFormat {
    fn write(&self, trajectory: &Trajectory, path: &Path) -> Result<(), FitError> {
        write_trajectory_csv(trajectory, path)
    }
}

/// JSON format reader/writer.
#[derive(Default)]
pub struct JsonFormat {
    pub pretty: bool,
}

impl SeriesReader for JsonFormat {
    fn read(&self, path: &Path, _columns: &InputConfig) -> Result<TimeSeries, FitError> {
        read_json(path)
    }
}

impl TrajectoryWriter for JsonFormat {
    fn write(&self, trajectory: &Trajectory, path: &Path) -> Result<(), FitError> {
        write_trajectory_json(trajectory, path, self.pretty)
    }
}

/// Excel (.xlsx) format reader/writer.
pub struct ExcelFormat;

impl SeriesReader for ExcelFormat {
    fn read(&self, path: &Path, columns: &InputConfig) -> Result<TimeSeries, FitError> {
        read_excel(path, columns)
    }
}

impl TrajectoryWriter for ExcelFormat {
    fn write(&self, trajectory: &Trajectory, path: &Path) -> Result<(), FitError> {
        write_trajectory_excel(trajectory, path)
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Pick a reader from the file extension.
pub fn reader_for(path: &Path) -> Result<Box<dyn SeriesReader>, FitError> {
    match extension(path).as_str() {
        "csv" => Ok(Box::new(CsvFormat)),
        "json" => Ok(Box::new(JsonFormat::default())),
        "xlsx" => Ok(Box::new(ExcelFormat)),
        other => Err(FitError::InvalidInput(format!(
            "unsupported input format '{other}' (expected csv, json or xlsx)"
        ))),
    }
}

/// Pick a writer from the file extension.
pub fn writer_for(path: &Path) -> Result<Box<dyn TrajectoryWriter>, FitError> {
    match extension(path).as_str() {
        "csv" => Ok(Box::new(CsvFormat)),
        "json" => Ok(Box::new(JsonFormat { pretty: true })),
        "xlsx" => Ok(Box::new(ExcelFormat)),
        other => Err(FitError::InvalidInput(format!(
            "unsupported output format '{other}' (expected csv, json or xlsx)"
        ))),
    }
}

/// Read a series, choosing the format from the extension.
pub fn read_series(path: impl AsRef<Path>, columns: &InputConfig) -> Result<TimeSeries, FitError> {
    let path = path.as_ref();
    reader_for(path)?.read(path, columns)
}

/// Locate the workbook to analyse in `dir`.
///
/// Excel lock files (`~$name.xlsx`) are ignored. With several candidates the
/// lexicographically first one is used.
pub fn find_single_input(dir: impl AsRef<Path>) -> Result<PathBuf, FitError> {
    let dir = dir.as_ref();
    let mut found: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && extension(p) == "xlsx")
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| !n.starts_with("~$"))
        })
        .collect();
    found.sort();

    let mut found = found.into_iter();
    let first = found.next().ok_or_else(|| {
        FitError::InvalidInput(format!("no .xlsx file found in {}", dir.display()))
    })?;
    let skipped = found.count();
    if skipped > 0 {
        warn!(
            using = %first.display(),
            skipped,
            "several .xlsx files found; using the first"
        );
    }
    Ok(first)
}

/// Check that the header starts with the configured time and value columns.
pub(crate) fn check_header(
    first: Option<&str>,
    second: Option<&str>,
    columns: &InputConfig,
) -> Result<(), FitError> {
    let first = first.map(str::trim).unwrap_or("");
    let second = second.map(str::trim).unwrap_or("");
    if first != columns.time_column || second != columns.value_column {
        return Err(FitError::InvalidInput(format!(
            "header must start with '{}', '{}' (found '{}', '{}')",
            columns.time_column, columns.value_column, first, second
        )));
    }
    Ok(())
}
