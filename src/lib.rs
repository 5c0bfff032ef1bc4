pub mod analysis;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod visualization;

pub use analysis::Analyzer;
pub use config::FitConfig;
pub use error::FitError;
pub use io::{SeriesReader, TrajectoryWriter};
pub use models::{FitResult, ModelParameters, ParameterRange, TimeSeries, Trajectory};
