use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::SearchInfo;
use crate::error::FitError;
use crate::models::{FitResult, SeriesSummary, TimeSeries, Trajectory};

/// Read an observed series from a JSON file of the form `{"time": [...], "value": [...]}`.
pub fn read_json(path: impl AsRef<Path>) -> Result<TimeSeries, FitError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let series: TimeSeries = serde_json::from_str(&content)?;
    Ok(series)
}

fn write_json<T: Serialize>(value: &T, path: &Path, pretty: bool) -> Result<(), FitError> {
    let content = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    std::fs::write(path, content)?;
    Ok(())
}

/// Write a trajectory as JSON. Divergent samples become `null`.
pub fn write_trajectory_json(
    trajectory: &Trajectory,
    path: impl AsRef<Path>,
    pretty: bool,
) -> Result<(), FitError> {
    write_json(trajectory, path.as_ref(), pretty)
}

/// Key figures of a forecast trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub start_time: f64,
    pub end_time: f64,
    pub step: f64,
    pub samples: usize,
    /// Last forecast value, absent when the forecast diverged
    pub final_value: Option<f64>,
    pub diverged_at: Option<usize>,
}

impl ForecastSummary {
    pub fn from_trajectory(trajectory: &Trajectory, step: f64) -> Self {
        let start_time = trajectory.times().first().copied().unwrap_or(f64::NAN);
        let (end_time, last) = trajectory.last().unwrap_or((f64::NAN, f64::NAN));
        Self {
            start_time,
            end_time,
            step,
            samples: trajectory.len(),
            final_value: last.is_finite().then_some(last),
            diverged_at: trajectory.diverged_at(),
        }
    }
}

/// Machine-readable record of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub series: SeriesSummary,
    pub search: SearchInfo,
    pub fit: FitResult,
    pub rmse: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub forecast: Option<ForecastSummary>,
}

impl FitReport {
    pub fn new(series: &TimeSeries, search: SearchInfo, fit: &FitResult) -> Self {
        Self {
            series: series.summary(),
            search,
            fit: fit.clone(),
            rmse: fit.rmse(series.len()),
            forecast: None,
        }
    }

    pub fn with_forecast(mut self, forecast: &Trajectory, step: f64) -> Self {
        self.forecast = Some(ForecastSummary::from_trajectory(forecast, step));
        self
    }
}

/// Write a fit report as JSON.
pub fn write_report_json(
    report: &FitReport,
    path: impl AsRef<Path>,
    pretty: bool,
) -> Result<(), FitError> {
    write_json(report, path.as_ref(), pretty)
}
