//! The audit entry point.

use crate::{
    AddressBinding, AuditConfig, ChainClient, DataAvailabilityValidator, Finding,
    GovernanceGraph, GovernanceGraphBuilder, InvariantVerifier, Severity,
};
use alloy_primitives::Address;
use serde::Serialize;

/// The outcome of auditing one rollup.
#[derive(Debug)]
pub struct GovernanceReport {
    /// The graph the findings were derived from.
    pub graph: GovernanceGraph,
    /// Findings in check order: invariants first, then data availability.
    pub findings: Vec<Finding>,
}

impl GovernanceReport {
    /// The most severe finding, `None` for a clean report.
    pub fn max_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|finding| finding.severity).max()
    }

    /// Returns `true` if nothing was found.
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Returns `true` if any finding is at least as severe as `threshold`.
    pub fn exceeds(&self, threshold: Severity) -> bool {
        self.max_severity().is_some_and(|severity| severity >= threshold)
    }

    /// A serializable view of the report.
    pub fn summary(&self) -> ReportSummary<'_> {
        ReportSummary {
            rollup: self.graph.rollup,
            chain_id: self
                .graph
                .provenance
                .as_ref()
                .ok()
                .map(|provenance| provenance.initialization.chain_id.to_string()),
            binding: &self.graph.binding,
            findings: &self.findings,
        }
    }
}

/// The serialized form of a [`GovernanceReport`].
#[derive(Debug, Serialize)]
pub struct ReportSummary<'a> {
    /// The audited rollup.
    pub rollup: Address,
    /// The child chain id, when the deployment was found.
    pub chain_id: Option<String>,
    /// The resolved contract addresses.
    pub binding: &'a AddressBinding,
    /// The findings.
    pub findings: &'a [Finding],
}

/// Audits the governance of `rollup`.
///
/// Builds the governance graph, verifies its invariants and, for AnyTrust chains, validates the
/// committee keysets. Read failures degrade into skipped findings; this never fails.
pub async fn verify_rollup_governance<C: ChainClient>(
    client: &C,
    config: &AuditConfig,
    rollup: Address,
) -> GovernanceReport {
    info!(target: "verifier", %rollup, "Auditing rollup governance");

    let graph = GovernanceGraphBuilder::new(client, config).build(rollup).await;
    let mut findings = InvariantVerifier.verify(&graph);
    findings.extend(DataAvailabilityValidator::new(client, config).validate(&graph).await);

    info!(
        target: "verifier",
        %rollup,
        findings = findings.len(),
        max_severity = ?findings.iter().map(|finding| finding.severity).max(),
        "Audit complete"
    );
    GovernanceReport { graph, findings }
}
