use tracing::debug;

use crate::analysis::integrator::{covering_step, integrate};
use crate::error::FitError;
use crate::models::{FitResult, ModelParameters, TimeSeries, Trajectory};

/// Default integration step for forecasts.
pub const DEFAULT_FORECAST_STEP: f64 = 0.1;

/// Extrapolates the fitted logistic curve.
///
/// A forecaster built with [`Forecaster::unfitted`] refuses to run until parameters are
/// supplied.
#[derive(Debug, Clone, Copy, Default)]
pub struct Forecaster {
    params: Option<ModelParameters>,
}

impl Forecaster {
    pub fn unfitted() -> Self {
        Self { params: None }
    }

    pub fn new(params: ModelParameters) -> Self {
        Self {
            params: Some(params),
        }
    }

    pub fn from_fit(fit: &FitResult) -> Self {
        Self::new(fit.params)
    }

    pub fn params(&self) -> Option<ModelParameters> {
        self.params
    }

    fn fitted(&self) -> Result<ModelParameters, FitError> {
        let params = self.params.ok_or(FitError::UnfittedModel)?;
        if !(params.gamma.is_finite() && params.k.is_finite()) {
            return Err(FitError::UnfittedModel);
        }
        Ok(params)
    }

    /// Integrate from the first observation through `end_time`.
    pub fn forecast(
        &self,
        observed: &TimeSeries,
        end_time: f64,
        dt: f64,
    ) -> Result<Trajectory, FitError> {
        let params = self.fitted()?;
        let (t_start, v0) = observed.first();
        check_horizon(t_start, end_time)?;
        let trajectory = integrate(v0, t_start, end_time, dt, params.gamma, params.k)?;
        debug!(
            samples = trajectory.len(),
            end_time,
            dt,
            diverged = trajectory.is_divergent(),
            "forecast computed"
        );
        Ok(trajectory)
    }

    /// Integrate from the last observation through `end_time`.
    pub fn forecast_from_last_point(
        &self,
        observed: &TimeSeries,
        end_time: f64,
        dt: f64,
    ) -> Result<Trajectory, FitError> {
        let params = self.fitted()?;
        let (t_last, v_last) = observed.last();
        check_horizon(t_last, end_time)?;
        integrate(v_last, t_last, end_time, dt, params.gamma, params.k)
    }

    /// Fitted curve over the observed span, for overlaying on the data.
    ///
    /// A step longer than the span is shrunk to it so the curve reaches the last observation.
    pub fn fitted_curve(&self, observed: &TimeSeries, dt: f64) -> Result<Trajectory, FitError> {
        let (t_start, _) = observed.first();
        let (t_end, _) = observed.last();
        self.forecast(observed, t_end, covering_step(t_start, t_end, dt))
    }
}

fn check_horizon(start: f64, end_time: f64) -> Result<(), FitError> {
    if !end_time.is_finite() || end_time < start {
        return Err(FitError::InvalidInput(format!(
            "forecast end time {end_time} must not precede the series start {start}"
        )));
    }
    Ok(())
}

/// Forecast with explicit parameters.
pub fn forecast(
    fitted: &ModelParameters,
    observed: &TimeSeries,
    end_time: f64,
    dt: f64,
) -> Result<Trajectory, FitError> {
    Forecaster::new(*fitted).forecast(observed, end_time, dt)
}
