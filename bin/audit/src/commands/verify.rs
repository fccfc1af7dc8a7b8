//! The `verify` subcommand.

use crate::cli::Outcome;
use alloy_primitives::Address;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use orbit_governance::{
    AuditConfig, ChainClient, Finding, GovernanceReport, Severity, verify_rollup_governance,
};
use tabled::{
    Table, Tabled,
    settings::{Style, Width},
};

/// The least severe finding that fails the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SeverityThreshold {
    /// Fail on any finding, including skipped checks.
    #[default]
    Skipped,
    /// Fail on violations and critical findings.
    Violation,
    /// Fail on critical findings only.
    Critical,
    /// Never fail because of findings.
    Never,
}

impl SeverityThreshold {
    /// The matching [`Severity`], `None` for [`Never`](Self::Never).
    pub const fn severity(self) -> Option<Severity> {
        match self {
            Self::Skipped => Some(Severity::Skipped),
            Self::Violation => Some(Severity::Violation),
            Self::Critical => Some(Severity::Critical),
            Self::Never => None,
        }
    }
}

/// Audits the governance of a single rollup.
#[derive(Parser, Debug, Clone)]
pub struct VerifyCommand {
    /// Address of the rollup core contract on the parent chain.
    #[arg(long = "rollup")]
    pub rollup: Address,
    /// Print the report as JSON.
    #[arg(long = "json")]
    pub json: bool,
    /// The least severe finding that produces a non-zero exit code.
    #[arg(long = "fail-on", value_enum, default_value_t = SeverityThreshold::Skipped)]
    pub fail_on: SeverityThreshold,
}

#[derive(Tabled)]
struct ContractRow {
    #[tabled(rename = "Contract")]
    role: String,
    #[tabled(rename = "Address")]
    address: String,
}

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Finding")]
    message: String,
}

impl From<&Finding> for FindingRow {
    fn from(finding: &Finding) -> Self {
        Self {
            severity: finding.severity.to_string(),
            category: finding.category.to_string(),
            message: finding.message.clone(),
        }
    }
}

impl VerifyCommand {
    /// Runs the audit and prints the report.
    pub async fn run<C: ChainClient>(&self, client: &C, config: &AuditConfig) -> Result<Outcome> {
        info!(target: "cli", rollup = %self.rollup, "Auditing rollup governance");
        let report = verify_rollup_governance(client, config, self.rollup).await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report.summary())?);
        } else {
            println!("{}", Self::render(&report));
        }

        Ok(self.outcome(&report))
    }

    /// Maps the report to the exit status of the run.
    pub fn outcome(&self, report: &GovernanceReport) -> Outcome {
        match self.fail_on.severity() {
            Some(threshold) if report.exceeds(threshold) => Outcome::Failed,
            _ => Outcome::Passed,
        }
    }

    fn render(report: &GovernanceReport) -> String {
        let summary = report.summary();
        let mut out = format!(
            "Rollup {} (chain id {})\n",
            summary.rollup,
            summary.chain_id.as_deref().unwrap_or("unknown")
        );

        let contracts = report
            .graph
            .binding
            .iter()
            .map(|(role, address)| ContractRow { role: role.to_string(), address: address.to_string() });
        out.push_str(&Table::new(contracts).with(Style::modern()).to_string());
        out.push('\n');

        if report.is_clean() {
            out.push_str("No findings.");
        } else {
            let findings = report.findings.iter().map(FindingRow::from);
            out.push_str(
                &Table::new(findings).with(Style::modern()).with(Width::wrap(100)).to_string(),
            );
        }
        out
    }
}
