use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use tracing::warn;

use crate::config::InputConfig;
use crate::error::FitError;
use crate::io::check_header;
use crate::models::{TimeSeries, Trajectory};

/// First worksheet of an xlsx workbook.
pub(crate) fn first_sheet(path: &Path) -> Result<Range<Data>, FitError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| FitError::Excel("No sheets found in workbook".to_string()))?;

    Ok(workbook.worksheet_range(&sheet_name)?)
}

fn cell_number(cell: Option<&Data>, row: usize, column: &str) -> Result<f64, FitError> {
    match cell {
        Some(Data::Float(f)) => Ok(*f),
        Some(Data::Int(i)) => Ok(*i as f64),
        Some(other) => Err(FitError::InvalidInput(format!(
            "row {row}: expected a number in column '{column}', found '{other}'"
        ))),
        None => Err(FitError::InvalidInput(format!(
            "row {row}: missing value in column '{column}'"
        ))),
    }
}

/// Read an observed series from the first sheet of an Excel (.xlsx) file.
///
/// The header row must start with the configured time and value columns; further columns are
/// ignored. Every following non-empty row must hold two numeric cells.
pub fn read_excel(path: impl AsRef<Path>, columns: &InputConfig) -> Result<TimeSeries, FitError> {
    let range = first_sheet(path.as_ref())?;
    // 1-based sheet row of the header
    let header_row = range.start().map_or(0, |(r, _)| r as usize) + 1;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| FitError::InvalidInput("worksheet is empty".to_string()))?;
    let name = |idx: usize| header.get(idx).map(|c| c.to_string());
    check_header(name(0).as_deref(), name(1).as_deref(), columns)?;

    let mut time = Vec::new();
    let mut value = Vec::new();
    for (idx, row) in rows.enumerate() {
        let row_number = header_row + idx + 1;
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            warn!(row = row_number, "skipping empty row");
            continue;
        }
        time.push(cell_number(row.first(), row_number, &columns.time_column)?);
        value.push(cell_number(row.get(1), row_number, &columns.value_column)?);
    }

    TimeSeries::new(time, value)
}

/// Write a trajectory to an Excel (.xlsx) file as `time`, `value` columns.
///
/// Divergent samples are written as the text `inf`.
pub fn write_trajectory_excel(
    trajectory: &Trajectory,
    path: impl AsRef<Path>,
) -> Result<(), FitError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    worksheet.write_string(0, 0, "time")?;
    worksheet.write_string(0, 1, "value")?;

    for (i, (t, v)) in trajectory.points().enumerate() {
        let row = u32::try_from(i + 1).map_err(|_| {
            FitError::Excel(format!("trajectory too long for a worksheet ({} rows)", trajectory.len()))
        })?;
        worksheet.write_number(row, 0, t)?;
        if v.is_finite() {
            worksheet.write_number(row, 1, v)?;
        } else {
            worksheet.write_string(row, 1, v.to_string())?;
        }
    }

    workbook.save(path.as_ref())?;
    Ok(())
}
