mod series;
mod parameters;
mod trajectory;

pub use series::{SeriesSummary, TimeSeries};
pub use parameters::{FitResult, ModelParameters, ParameterRange, MAX_AXIS_VALUES};
pub use trajectory::{Trajectory, DIVERGENCE_SENTINEL};
