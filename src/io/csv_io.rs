use std::io::Read;
use std::path::Path;

use tracing::warn;

use crate::config::InputConfig;
use crate::error::FitError;
use crate::io::check_header;
use crate::models::{TimeSeries, Trajectory};

fn parse_csv_records<R: Read>(
    rdr: &mut csv::Reader<R>,
    columns: &InputConfig,
) -> Result<TimeSeries, FitError> {
    let headers = rdr.headers()?.clone();
    check_header(headers.get(0), headers.get(1), columns)?;

    let mut time = Vec::new();
    let mut value = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        // header is line 1
        let row = idx + 2;
        if record.iter().all(|field| field.is_empty()) {
            warn!(row, "skipping empty row");
            continue;
        }
        time.push(parse_field(record.get(0), row, &columns.time_column)?);
        value.push(parse_field(record.get(1), row, &columns.value_column)?);
    }

    TimeSeries::new(time, value)
}

fn parse_field(field: Option<&str>, row: usize, column: &str) -> Result<f64, FitError> {
    let field = field.unwrap_or("");
    field.parse::<f64>().map_err(|_| {
        FitError::InvalidInput(format!(
            "row {row}: expected a number in column '{column}', found '{field}'"
        ))
    })
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All);
    builder
}

/// Read an observed series from a CSV file.
pub fn read_csv(path: impl AsRef<Path>, columns: &InputConfig) -> Result<TimeSeries, FitError> {
    let mut rdr = reader_builder().from_path(path.as_ref())?;
    parse_csv_records(&mut rdr, columns)
}

/// Read an observed series from CSV bytes.
pub fn read_csv_from_bytes(data: &[u8], columns: &InputConfig) -> Result<TimeSeries, FitError> {
    let mut rdr = reader_builder().from_reader(data);
    parse_csv_records(&mut rdr, columns)
}

/// Write a trajectory as `time,value` rows. Divergent samples are written as `inf`.
pub fn write_trajectory_csv(trajectory: &Trajectory, path: impl AsRef<Path>) -> Result<(), FitError> {
    let mut wtr = csv::Writer::from_path(path.as_ref())?;
    wtr.write_record(["time", "value"])?;
    for (t, v) in trajectory.points() {
        wtr.write_record([t.to_string(), v.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}
