use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::FitError;

/// An observed (time, value) series.
///
/// Construction validates the series, so every `TimeSeries` in the program has at least two
/// points, finite numbers, non-decreasing time and non-negative values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    time: Vec<f64>,
    value: Vec<f64>,
}

impl TimeSeries {
    /// Build a validated series from two equal-length columns.
    ///
    /// # Examples
    ///
    /// ```
    /// use logistic_forecaster::TimeSeries;
    ///
    /// let series = TimeSeries::new(vec![0.0, 1.0, 2.0], vec![10.0, 12.0, 15.0]).unwrap();
    /// assert_eq!(series.len(), 3);
    /// assert!(TimeSeries::new(vec![1.0, 0.0], vec![1.0, 1.0]).is_err());
    /// ```
    pub fn new(time: Vec<f64>, value: Vec<f64>) -> Result<Self, FitError> {
        if time.len() != value.len() {
            return Err(FitError::InvalidInput(format!(
                "time and value columns differ in length ({} vs {})",
                time.len(),
                value.len()
            )));
        }
        if time.len() < 2 {
            return Err(FitError::InvalidInput(format!(
                "need at least 2 observations, got {}",
                time.len()
            )));
        }
        for (i, (&t, &v)) in time.iter().zip(value.iter()).enumerate() {
            if !t.is_finite() {
                return Err(FitError::InvalidInput(format!(
                    "row {}: time must be finite, got {t}",
                    i + 1
                )));
            }
            if !v.is_finite() {
                return Err(FitError::InvalidInput(format!(
                    "row {}: value must be finite, got {v}",
                    i + 1
                )));
            }
            if v < 0.0 {
                return Err(FitError::InvalidInput(format!(
                    "row {}: value must be non-negative, got {v}",
                    i + 1
                )));
            }
            if i > 0 && t < time[i - 1] {
                return Err(FitError::InvalidInput(format!(
                    "row {}: time must be non-decreasing ({} follows {})",
                    i + 1,
                    t,
                    time[i - 1]
                )));
            }
        }
        Ok(Self { time, value })
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn value(&self) -> &[f64] {
        &self.value
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Always false for a validated series; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// First observation as `(time, value)`.
    pub fn first(&self) -> (f64, f64) {
        (self.time[0], self.value[0])
    }

    /// Last observation as `(time, value)`.
    pub fn last(&self) -> (f64, f64) {
        let i = self.time.len() - 1;
        (self.time[i], self.value[i])
    }

    /// Iterate over `(time, value)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.time.iter().copied().zip(self.value.iter().copied())
    }

    /// Descriptive statistics of both columns.
    pub fn summary(&self) -> SeriesSummary {
        SeriesSummary {
            data_points: self.len(),
            time_min: Statistics::min(self.time.iter()),
            time_max: Statistics::max(self.time.iter()),
            value_min: Statistics::min(self.value.iter()),
            value_max: Statistics::max(self.value.iter()),
            time_mean: self.time.iter().mean(),
            value_mean: self.value.iter().mean(),
            time_std: self.time.iter().population_std_dev(),
            value_std: self.value.iter().population_std_dev(),
        }
    }
}

#[derive(Deserialize)]
struct RawSeries {
    time: Vec<f64>,
    value: Vec<f64>,
}

impl<'de> Deserialize<'de> for TimeSeries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawSeries::deserialize(deserializer)?;
        TimeSeries::new(raw.time, raw.value).map_err(serde::de::Error::custom)
    }
}

/// Basic statistics of an observed series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub data_points: usize,
    pub time_min: f64,
    pub time_max: f64,
    pub value_min: f64,
    pub value_max: f64,
    pub time_mean: f64,
    pub value_mean: f64,
    /// Population standard deviation
    pub time_std: f64,
    /// Population standard deviation
    pub value_std: f64,
}
