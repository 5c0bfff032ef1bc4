use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::{FitObserver, Forecaster, GridSearchFitter, SearchInfo};
use crate::config::FitConfig;
use crate::error::FitError;
use crate::models::{FitResult, TimeSeries, Trajectory};

/// Output of a full fit-then-forecast pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRun {
    pub fit: FitResult,
    /// Fitted model over the observed span, at the search step
    pub fitted_curve: Trajectory,
    /// Forecast from the first observation through the configured horizon
    pub forecast: Trajectory,
}

/// Unified API that runs every configured operation on one series.
pub struct Analyzer<'a> {
    series: &'a TimeSeries,
    config: &'a FitConfig,
}

impl<'a> Analyzer<'a> {
    /// Create a new Analyzer for the given series and configuration.
    pub fn new(series: &'a TimeSeries, config: &'a FitConfig) -> Self {
        Self { series, config }
    }

    pub fn series(&self) -> &TimeSeries {
        self.series
    }

    pub fn search_info(&self) -> SearchInfo {
        self.config.search_info()
    }

    /// Grid-search fitter configured from the `[search]` section.
    pub fn fitter(&self) -> GridSearchFitter<'a> {
        let search = &self.config.search;
        GridSearchFitter::new(self.series, search.k, search.gamma)
            .with_step(search.step)
            .parallel(search.parallel)
    }

    /// Fit (K, γ) over the configured grid.
    pub fn fit(&self) -> Result<FitResult, FitError> {
        self.fitter().fit()
    }

    /// Fit, reporting every evaluated cell to `observer`.
    pub fn fit_with_observer(&self, observer: &dyn FitObserver) -> Result<FitResult, FitError> {
        self.fitter().with_observer(observer).fit()
    }

    /// Fitted curve over the observed span.
    pub fn fitted_curve(&self, fit: &FitResult) -> Result<Trajectory, FitError> {
        Forecaster::from_fit(fit).fitted_curve(self.series, self.config.search.step)
    }

    /// Forecast through the configured horizon.
    pub fn forecast(&self, fit: &FitResult) -> Result<Trajectory, FitError> {
        let forecast = &self.config.forecast;
        Forecaster::from_fit(fit).forecast(self.series, forecast.end_time, forecast.step)
    }

    /// Fit, then build the fitted curve and the forecast.
    pub fn run(&self, observer: Option<&dyn FitObserver>) -> Result<AnalysisRun, FitError> {
        let fit = match observer {
            Some(observer) => self.fit_with_observer(observer)?,
            None => self.fit()?,
        };
        let fitted_curve = self.fitted_curve(&fit)?;
        let forecast = self.forecast(&fit)?;
        info!(
            forecast_samples = forecast.len(),
            diverged = forecast.is_divergent(),
            "analysis complete"
        );
        Ok(AnalysisRun {
            fit,
            fitted_curve,
            forecast,
        })
    }
}
