//! Contains the audit CLI.

use crate::{
    commands::{FindRollupsCommand, VerifyCommand},
    flags::GlobalArgs,
};
use anyhow::Result;
use clap::{Parser, Subcommand};
use orbit_cli::cli_styles;
use std::process::ExitCode;

/// Governance audit for Arbitrum Orbit rollups.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, styles = cli_styles(), long_about = None)]
pub struct Cli {
    /// Global arguments for the CLI.
    #[command(flatten)]
    pub global: GlobalArgs,
    /// The subcommand to run.
    #[command(subcommand)]
    pub subcommand: Commands,
}

/// Subcommands of the CLI.
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Audits the governance of a single rollup.
    Verify(VerifyCommand),
    /// Lists the rollups deployed on the parent chain.
    FindRollups(FindRollupsCommand),
}

/// The result of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing at or above the failure threshold was found.
    Passed,
    /// At least one finding reached the failure threshold.
    Failed,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Passed => Self::SUCCESS,
            Outcome::Failed => Self::from(1),
        }
    }
}

impl Cli {
    /// Runs the CLI.
    pub fn run(self) -> Result<Outcome> {
        self.global.log.init_tracing_subscriber()?;

        let mut config = self.global.audit_config()?;
        let client = self.global.chain_client();
        debug!(target: "cli", ?config, rpc = %self.global.rpc_url, "Loaded configuration");

        Self::tokio_runtime()?.block_on(async move {
            match self.subcommand {
                Commands::Verify(command) => command.run(&client, &config).await,
                Commands::FindRollups(command) => {
                    command.apply(&mut config);
                    command.run(&client, &config).await
                }
            }
        })
    }

    /// Creates a new multi-thread tokio runtime with all features enabled.
    pub fn tokio_runtime() -> Result<tokio::runtime::Runtime, std::io::Error> {
        tokio::runtime::Builder::new_multi_thread().enable_all().build()
    }
}
