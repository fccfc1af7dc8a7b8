//! Logging arguments.

use crate::{CliResult, init_tracing_subscriber};
use clap::{ArgAction, Args, ValueEnum};

/// The output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Multi-field human readable lines.
    #[default]
    Full,
    /// Shortened human readable lines.
    Compact,
    /// Newline delimited JSON.
    Json,
}

/// Logging arguments shared by every command.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct LogArgs {
    /// Verbosity level: `-v` errors, `-vv` warnings, `-vvv` info, `-vvvv` debug, `-vvvvv` trace.
    #[arg(
        short = 'v',
        long = "verbosity",
        global = true,
        action = ArgAction::Count,
        default_value_t = 3
    )]
    pub verbosity: u8,
    /// Log line format.
    #[arg(long = "log.format", global = true, value_enum, default_value_t = LogFormat::Full)]
    pub format: LogFormat,
    /// Extra `tracing` filter directives, e.g. `graph=debug,provider=trace`.
    #[arg(long = "log.filter", global = true, env = "RUST_LOG")]
    pub filter: Option<String>,
}

impl LogArgs {
    /// Installs the global tracing subscriber described by these arguments.
    pub fn init_tracing_subscriber(&self) -> CliResult<()> {
        init_tracing_subscriber(self.verbosity, self.format, self.filter.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rstest::rstest;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        log: LogArgs,
    }

    #[test]
    fn test_log_args_defaults() {
        let cli = TestCli::try_parse_from(["orbit-audit"]).unwrap();
        assert_eq!(cli.log.verbosity, 3);
        assert_eq!(cli.log.format, LogFormat::Full);
    }

    #[rstest]
    #[case(&["orbit-audit", "-vv"], 2, LogFormat::Full)]
    #[case(&["orbit-audit", "-vvvv", "--log.format", "json"], 4, LogFormat::Json)]
    #[case(&["orbit-audit", "--log.format", "compact"], 3, LogFormat::Compact)]
    fn test_log_args_parse(#[case] args: &[&str], #[case] verbosity: u8, #[case] format: LogFormat) {
        let cli = TestCli::try_parse_from(args).unwrap();
        assert_eq!(cli.log.verbosity, verbosity);
        assert_eq!(cli.log.format, format);
    }

    #[test]
    fn test_log_args_rejects_unknown_format() {
        assert!(TestCli::try_parse_from(["orbit-audit", "--log.format", "xml"]).is_err());
    }
}
