use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::{SearchInfo, DEFAULT_FORECAST_STEP, DEFAULT_SEARCH_STEP};
use crate::error::FitError;
use crate::models::ParameterRange;

/// Run configuration, loaded from TOML.
///
/// Every field has a default, so a config file only needs the values it overrides:
///
/// ```toml
/// [search]
/// parallel = true
/// k = { min = 1000.0, max = 5000.0, step = 100.0 }
///
/// [forecast]
/// end_time = 120.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FitConfig {
    pub search: SearchConfig,
    pub forecast: ForecastConfig,
    pub input: InputConfig,
}

/// Grid definition and integration step for the search loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Integration step while scoring candidates
    pub step: f64,
    /// Score grid cells on the rayon thread pool
    pub parallel: bool,
    /// Carrying capacity axis
    pub k: ParameterRange,
    /// Growth rate axis
    pub gamma: ParameterRange,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            step: DEFAULT_SEARCH_STEP,
            parallel: false,
            k: ParameterRange::new(2_000_000.0, 3_000_000.0, 10_000.0),
            gamma: ParameterRange::new(0.02, 0.04, 0.0005),
        }
    }
}

/// Forecast horizon and resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Last time (in series units) to forecast
    pub end_time: f64,
    /// Integration step of the forecast trajectory
    pub step: f64,
    /// Calendar year of time 0, used only for display
    pub start_year: Option<i32>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            end_time: 250.0,
            step: DEFAULT_FORECAST_STEP,
            start_year: Some(1950),
        }
    }
}

/// Column names expected in the input header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub time_column: String,
    pub value_column: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            time_column: "time".to_string(),
            value_column: "value".to_string(),
        }
    }
}

impl FitConfig {
    /// Read a TOML config file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FitError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: FitConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, FitError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the config as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), FitError> {
        std::fs::write(path.as_ref(), self.to_toml_string()?)?;
        Ok(())
    }

    /// Reject steps and horizons no run could use.
    pub fn validate(&self) -> Result<(), FitError> {
        if !(self.search.step.is_finite() && self.search.step > 0.0) {
            return Err(FitError::InvalidInput(format!(
                "search.step must be positive, got {}",
                self.search.step
            )));
        }
        if !(self.forecast.step.is_finite() && self.forecast.step > 0.0) {
            return Err(FitError::InvalidInput(format!(
                "forecast.step must be positive, got {}",
                self.forecast.step
            )));
        }
        if !self.forecast.end_time.is_finite() || self.forecast.end_time < 0.0 {
            return Err(FitError::InvalidInput(format!(
                "forecast.end_time must be a non-negative number, got {}",
                self.forecast.end_time
            )));
        }
        if self.input.time_column.trim().is_empty() || self.input.value_column.trim().is_empty() {
            return Err(FitError::InvalidInput(
                "input column names must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Candidate counts of the configured grid.
    pub fn search_info(&self) -> SearchInfo {
        SearchInfo::new(&self.search.k, &self.search.gamma)
    }
}
