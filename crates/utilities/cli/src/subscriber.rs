//! Tracing subscriber setup.

use crate::{CliResult, LogFormat};
use std::io;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

/// Maps a `-v` count to the most verbose level that is logged.
pub const fn verbosity_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::OFF,
        1 => LevelFilter::ERROR,
        2 => LevelFilter::WARN,
        3 => LevelFilter::INFO,
        4 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Installs the global tracing subscriber.
///
/// Logs go to stderr so command output on stdout stays machine readable. `directives` are
/// applied on top of the level derived from `verbosity`.
pub fn init_tracing_subscriber(
    verbosity: u8,
    format: LogFormat,
    directives: Option<&str>,
) -> CliResult<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity_level(verbosity).into())
        .parse(directives.unwrap_or_default())?;

    let layer = match format {
        LogFormat::Full => fmt::layer().with_writer(io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(io::stderr).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(io::stderr).boxed(),
    };

    tracing_subscriber::registry().with(layer).with(filter).try_init()?;
    Ok(())
}
