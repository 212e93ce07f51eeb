//! Error taxonomy for the simulate-and-forecast pipeline.
//!
//! Input and configuration errors are fatal and abort a run before any
//! simulation happens. Per-series forecasting errors live in
//! [`crate::forecast::ForecastError`] and are collected, never propagated.

use std::io;
use std::path::PathBuf;

use crate::config::ConfigError;

/// The state-totals input or a simulated dataset could not be read.
#[derive(Debug, thiserror::Error)]
pub enum InputFormatError {
    #[error("cannot read \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column \"{0}\"")]
    MissingColumn(&'static str),
    #[error("row {row}: {message}")]
    InvalidRow { row: usize, message: String },
    #[error("state \"{0}\" appears more than once")]
    DuplicateState(String),
    #[error("input contains no rows")]
    Empty,
}

/// Simulation parameters that cannot produce a valid allocation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AllocationConfigError {
    #[error("wards_per_state must be >= 1")]
    NoWards,
    #[error("seasonal profile must have exactly 12 weights, got {0}")]
    ProfileLength(usize),
    #[error("seasonal profile weight for month {index} is {value}, must be finite and >= 0")]
    ProfileWeight { index: usize, value: f64 },
    #[error("seasonal profile weights must have a positive sum")]
    ProfileSum,
    #[error("noise standard deviation must be finite and >= 0, got {0}")]
    NoiseSpread(f64),
    #[error("annual total for state \"{state}\" is {value}, must be positive and finite")]
    StateTotal { state: String, value: f64 },
}

/// An output dataset could not be written.
#[derive(Debug, thiserror::Error)]
#[error("failed to write \"{}\": {source}", path.display())]
pub struct PersistenceError {
    pub path: PathBuf,
    #[source]
    pub source: csv::Error,
}

/// Fatal errors that stop a whole run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid configuration: {}", join_config_errors(.0))]
    Config(Vec<ConfigError>),
    #[error(transparent)]
    Input(#[from] InputFormatError),
    #[error(transparent)]
    Allocation(#[from] AllocationConfigError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

fn join_config_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        Self::Config(vec![err])
    }
}
