//! Error types for loading, configuration and estimation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure while reading a source table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read \"{path}\": {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed CSV in \"{path}\": {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("\"{path}\" row {row}: column `{column}` {message}")]
    InvalidField {
        path: PathBuf,
        row: usize,
        column: &'static str,
        message: String,
    },
    #[error("\"{path}\": program years must strictly increase, found {previous} then {current}")]
    NonIncreasingYears {
        path: PathBuf,
        previous: i32,
        current: i32,
    },
    #[error("\"{path}\": no four-digit year in file name")]
    MissingFileYear { path: PathBuf },
}

/// Failure that stops an estimation run before any table is produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EstimationError {
    /// A table required by the combined report was not supplied.
    #[error("required table `{0}` is missing")]
    MissingTable(&'static str),
    /// The program tracker leaves more than one unobserved year after the
    /// baseline snapshot. The single-step midpoint interpolation only covers
    /// a one-year gap.
    #[error(
        "heat-pump tracker starts in {first_tracked_year}, leaving more than one \
         year to interpolate after the {baseline_year} baseline"
    )]
    UnsupportedGap {
        baseline_year: i32,
        first_tracked_year: i32,
    },
    /// Tracker years must strictly increase.
    #[error("heat-pump tracker years must strictly increase, found {previous} then {current}")]
    UnorderedTracker { previous: i32, current: i32 },
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"heating.commercial_factor"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub(crate) fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
