//! `orbit-audit`: verifies the governance topology of Arbitrum Orbit rollups.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod cli;
pub mod commands;
pub mod flags;

use clap::Parser;
use std::process::ExitCode;

/// Exit code for usage, configuration and transport errors.
const SETUP_ERROR: u8 = 2;

fn main() -> ExitCode {
    orbit_cli::backtrace::enable();

    match cli::Cli::parse().run() {
        Ok(outcome) => outcome.into(),
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(SETUP_ERROR)
        }
    }
}
