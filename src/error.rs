use thiserror::Error;

/// Errors that can occur while loading a series, fitting or forecasting.
#[derive(Error, Debug)]
pub enum FitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Excel error: {0}")]
    Excel(String),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Degenerate search space: {axis} range [{min}, {max}) with step {step} has no candidates")]
    DegenerateSearchSpace {
        axis: &'static str,
        min: f64,
        max: f64,
        step: f64,
    },

    #[error("No feasible parameters: all {candidates} candidates diverged")]
    NoFeasibleFit { candidates: usize },

    #[error("Unfitted model: growth rate and carrying capacity must be fitted before forecasting")]
    UnfittedModel,
}

impl From<calamine::Error> for FitError {
    fn from(e: calamine::Error) -> Self {
        FitError::Excel(e.to_string())
    }
}

impl From<calamine::XlsxError> for FitError {
    fn from(e: calamine::XlsxError) -> Self {
        FitError::Excel(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for FitError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        FitError::Excel(e.to_string())
    }
}
