//! The `find-rollups` subcommand.

use crate::cli::Outcome;
use anyhow::{Context, Result};
use clap::Parser;
use orbit_governance::{AuditConfig, ChainClient, DiscoveredRollup, discover_rollups};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Style, object::Columns},
};

/// Lists the rollups deployed on the parent chain.
#[derive(Parser, Debug, Clone)]
pub struct FindRollupsCommand {
    /// Also list rollups without recent batches.
    #[arg(long = "include-inactive")]
    pub include_inactive: bool,
    /// Number of recent blocks searched for batch deliveries.
    #[arg(long = "activity-window")]
    pub activity_window: Option<u64>,
    /// Print the rollups as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Tabled)]
struct RollupRow {
    #[tabled(rename = "Chain ID")]
    chain_id: String,
    #[tabled(rename = "Rollup")]
    rollup: String,
    #[tabled(rename = "Sequencer Inbox")]
    sequencer_inbox: String,
    #[tabled(rename = "Initialized")]
    initialized_at: String,
    #[tabled(rename = "Active")]
    active: bool,
}

impl From<&DiscoveredRollup> for RollupRow {
    fn from(rollup: &DiscoveredRollup) -> Self {
        Self {
            chain_id: rollup.chain_id.to_string(),
            rollup: rollup.rollup.to_string(),
            sequencer_inbox: rollup
                .sequencer_inbox
                .map_or_else(|| "unknown".to_string(), |inbox| inbox.to_string()),
            initialized_at: rollup.initialized_at.to_string(),
            active: rollup.is_active,
        }
    }
}

impl FindRollupsCommand {
    /// Applies the command flags to the discovery settings.
    pub fn apply(&self, config: &mut AuditConfig) {
        if self.include_inactive {
            config.discovery.include_inactive = true;
        }
        if let Some(window) = self.activity_window {
            config.discovery.activity_window_blocks = window;
        }
    }

    /// Discovers the rollups and prints them.
    pub async fn run<C: ChainClient>(&self, client: &C, config: &AuditConfig) -> Result<Outcome> {
        let rollups = discover_rollups(client, config).await.context("discovering rollups")?;
        info!(target: "cli", count = rollups.len(), "Discovered rollups");

        if self.json {
            println!("{}", serde_json::to_string_pretty(&rollups)?);
        } else {
            println!("{}", Self::render(&rollups));
        }
        Ok(Outcome::Passed)
    }

    fn render(rollups: &[DiscoveredRollup]) -> String {
        if rollups.is_empty() {
            return "No rollups found.".to_string();
        }
        let mut table = Table::new(rollups.iter().map(RollupRow::from));
        table.with(Style::modern());
        table.modify(Columns::first(), Alignment::right());
        table.to_string()
    }
}
