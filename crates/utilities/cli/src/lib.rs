//! Shared command line utilities: argument styling, logging setup and config file loading.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod backtrace;

mod styles;
pub use styles::cli_styles;

mod error;
pub use error::{CliError, CliResult};

pub mod log;
pub use log::{LogArgs, LogFormat};

mod subscriber;
pub use subscriber::{init_tracing_subscriber, verbosity_level};

mod config;
pub use config::load_toml;
