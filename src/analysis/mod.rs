mod analyzer;
mod fitter;
mod forecast;
mod integrator;
mod objective;

pub use analyzer::{AnalysisRun, Analyzer};
pub use fitter::{
    fit, FitObserver, GridProgress, GridSearchFitter, SearchInfo, DEFAULT_SEARCH_STEP,
    MAX_GRID_CELLS,
};
pub use forecast::{forecast, Forecaster, DEFAULT_FORECAST_STEP};
pub use integrator::{
    covering_step, integrate, logistic_derivative, sample_count, CAPACITY_EPSILON, MAX_SAMPLES,
};
pub use objective::{align, interpolate, sse};
