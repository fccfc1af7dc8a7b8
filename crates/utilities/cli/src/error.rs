//! Error types for CLI utilities.

use std::{io, path::PathBuf};
use thiserror::Error;
use tracing_subscriber::{filter::ParseError, util::TryInitError};

/// Errors that can occur in CLI operations.
#[derive(Error, Debug)]
pub enum CliError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadConfig {
        /// The config file.
        path: PathBuf,
        /// The underlying IO error.
        source: io::Error,
    },
    /// The config file is not valid TOML for the expected schema.
    #[error("failed to parse config file {path}: {source}")]
    ParseConfig {
        /// The config file.
        path: PathBuf,
        /// The underlying parse error.
        source: toml::de::Error,
    },
    /// The log filter directive is invalid.
    #[error("invalid log filter: {0}")]
    LogFilter(#[from] ParseError),
    /// A global tracing subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Tracing(#[from] TryInitError),
}

/// Type alias for CLI results.
pub type CliResult<T> = Result<T, CliError>;
