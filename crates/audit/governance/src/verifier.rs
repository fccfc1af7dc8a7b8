//! Governance invariants.

use crate::{
    CodePresence, ContractRole, Finding, FindingCategory, GovernanceGraph, RoleGrants,
    TokenStatus,
};
use alloy_primitives::Address;
use orbit_abi::{ADMIN_ROLE, EXECUTOR_ROLE};

/// Checks a [`GovernanceGraph`] against the expected Orbit governance pattern:
///
/// - the `UpgradeExecutor` owns the rollup, administers the rollup proxy and owns the
///   `ProxyAdmin`,
/// - only the `UpgradeExecutor` administers its own roles and someone can execute upgrades,
/// - the `ProxyAdmin` administers every satellite proxy,
/// - configured tokens are deployed contracts.
///
/// Checks run in a fixed order and never short-circuit each other.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvariantVerifier;

impl InvariantVerifier {
    /// Returns the findings for `graph`, in check order.
    pub fn verify(&self, graph: &GovernanceGraph) -> Vec<Finding> {
        let mut findings = Vec::new();
        Self::check_provenance(graph, &mut findings);
        if graph.created().is_some() {
            Self::check_upgrade_executor(graph, &mut findings);
            Self::check_proxy_admin(graph, &mut findings);
        }
        Self::check_native_token(graph, &mut findings);
        Self::check_stake_token(graph, &mut findings);

        debug!(
            target: "verifier",
            rollup = %graph.rollup,
            findings = findings.len(),
            "Verified governance graph"
        );
        findings
    }

    fn check_provenance(graph: &GovernanceGraph, findings: &mut Vec<Finding>) {
        let provenance = match &graph.provenance {
            Ok(provenance) => provenance,
            Err(err) => {
                findings.push(Finding::skipped(
                    FindingCategory::Provenance,
                    format!(
                        "{err}; skipped UpgradeExecutor, ProxyAdmin, native token, data \
                         availability checks"
                    ),
                ));
                return;
            }
        };

        let mut failures = Vec::new();
        let mut skipped = Vec::new();
        if let Err(err) = &provenance.created {
            failures.push(err.to_string());
            skipped.extend(["UpgradeExecutor", "ProxyAdmin", "native token"]);
        }
        if let Err(err) = &provenance.params {
            failures.push(err.to_string());
        }
        if let Some(Err(err)) = &provenance.chain_config {
            failures.push(err.to_string());
        }
        if provenance.chain_config().is_none() {
            skipped.push("data availability");
        }

        if failures.is_empty() {
            return;
        }
        let mut message = failures.join("; ");
        if !skipped.is_empty() {
            message.push_str(&format!("; skipped {} checks", skipped.join(", ")));
        }
        findings.push(Finding::skipped(FindingCategory::Provenance, message));
    }

    fn check_upgrade_executor(graph: &GovernanceGraph, findings: &mut Vec<Finding>) {
        let Some(executor) = graph.binding.get(ContractRole::UpgradeExecutor) else {
            findings.push(Finding::skipped(
                FindingCategory::UpgradeExecutor,
                "deployment has no UpgradeExecutor; ownership checks skipped",
            ));
            return;
        };

        match &graph.rollup_owner {
            Ok(owner) if *owner != executor => findings.push(Finding::violation(
                FindingCategory::Ownership,
                format!("Rollup owner {owner} is not the UpgradeExecutor {executor}"),
            )),
            Ok(_) => {}
            Err(err) => findings.push(Finding::skipped(
                FindingCategory::Ownership,
                format!("Rollup owner unknown: {err}"),
            )),
        }

        Self::expect_admin(
            graph,
            ContractRole::Rollup,
            executor,
            "UpgradeExecutor",
            FindingCategory::Ownership,
            findings,
        );

        match &graph.proxy_admin_owner {
            Some(Ok(owner)) if *owner != executor => findings.push(Finding::violation(
                FindingCategory::Ownership,
                format!("ProxyAdmin owner {owner} is not the UpgradeExecutor {executor}"),
            )),
            Some(Err(err)) => findings.push(Finding::skipped(
                FindingCategory::Ownership,
                format!("ProxyAdmin owner unknown: {err}"),
            )),
            _ => {}
        }

        match &graph.upgrade_executor_roles {
            Some(Ok(grants)) => Self::check_roles(grants, executor, findings),
            Some(Err(err)) => findings.push(Finding::skipped(
                FindingCategory::UpgradeExecutor,
                format!("UpgradeExecutor roles unknown: {err}"),
            )),
            None => {}
        }
    }

    fn check_roles(grants: &RoleGrants, executor: Address, findings: &mut Vec<Finding>) {
        if *grants == RoleGrants::NoPrivilegedAccounts {
            findings.push(Finding::violation(
                FindingCategory::UpgradeExecutor,
                format!("UpgradeExecutor {executor} never granted any role"),
            ));
            return;
        }

        for holder in grants.holders(&ADMIN_ROLE) {
            if holder != executor {
                findings.push(Finding::violation(
                    FindingCategory::UpgradeExecutor,
                    format!("{holder} holds ADMIN_ROLE on the UpgradeExecutor {executor}"),
                ));
            }
        }

        if grants.holders(&EXECUTOR_ROLE).is_empty() {
            findings.push(Finding::violation(
                FindingCategory::UpgradeExecutor,
                format!("no account holds EXECUTOR_ROLE on the UpgradeExecutor {executor}"),
            ));
        }
    }

    fn check_proxy_admin(graph: &GovernanceGraph, findings: &mut Vec<Finding>) {
        let Some(proxy_admin) = graph.binding.get(ContractRole::ProxyAdmin) else {
            findings.push(Finding::skipped(
                FindingCategory::ProxyAdmin,
                "ProxyAdmin unresolved; satellite admin checks skipped",
            ));
            return;
        };

        for role in ContractRole::SATELLITES {
            Self::expect_admin(
                graph,
                role,
                proxy_admin,
                "ProxyAdmin",
                FindingCategory::ProxyAdmin,
                findings,
            );
        }
    }

    fn expect_admin(
        graph: &GovernanceGraph,
        role: ContractRole,
        expected: Address,
        expected_name: &str,
        category: FindingCategory,
        findings: &mut Vec<Finding>,
    ) {
        match graph.admin(role) {
            Some(Ok(Some(admin))) if *admin == expected => {}
            Some(Ok(Some(admin))) => findings.push(Finding::violation(
                category,
                format!(
                    "{role} admin is not the {expected_name} (admin {admin}, expected {expected})"
                ),
            )),
            Some(Ok(None)) => findings.push(Finding::violation(
                category,
                format!(
                    "{role} admin is not the {expected_name} (no admin set, expected {expected})"
                ),
            )),
            Some(Err(err)) => {
                findings.push(Finding::skipped(category, format!("{role} admin unknown: {err}")))
            }
            None => findings.push(Finding::skipped(category, format!("{role} address unresolved"))),
        }
    }

    fn check_native_token(graph: &GovernanceGraph, findings: &mut Vec<Finding>) {
        if let Some(token) = &graph.native_token {
            Self::check_token("native token", token, findings);
        }
    }

    fn check_stake_token(graph: &GovernanceGraph, findings: &mut Vec<Finding>) {
        match &graph.stake_token {
            Ok(token) => Self::check_token("stake token", token, findings),
            Err(err) => findings
                .push(Finding::skipped(FindingCategory::Token, format!("stake token unknown: {err}"))),
        }
    }

    fn check_token(name: &str, token: &TokenStatus, findings: &mut Vec<Finding>) {
        match &token.code {
            CodePresence::NotApplicable | CodePresence::Present => {}
            CodePresence::Missing => findings.push(Finding::violation(
                FindingCategory::Token,
                format!("{name} {} has no bytecode", token.address),
            )),
            CodePresence::Unknown(err) => findings.push(Finding::skipped(
                FindingCategory::Token,
                format!("{name} {} bytecode unknown: {err}", token.address),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuditConfig, GovernanceGraphBuilder, Severity, test_utils::DeploymentFixture};
    use alloy_primitives::Bytes;
    use orbit_abi::{IAccessControl, IOwnable, IRollupCore};

    async fn verify(client: &crate::test_utils::MockChainClient, rollup: Address) -> Vec<Finding> {
        let config = AuditConfig::default();
        let graph = GovernanceGraphBuilder::new(client, &config).build(rollup).await;
        InvariantVerifier.verify(&graph)
    }

    #[tokio::test]
    async fn test_healthy_deployment_is_clean() {
        let fixture = DeploymentFixture::default();
        assert_eq!(verify(&fixture.client(), fixture.rollup).await, vec![]);
    }

    #[tokio::test]
    async fn test_single_foreign_satellite_admin() {
        let fixture = DeploymentFixture::default();
        let foreign = Address::repeat_byte(0x51);
        let client = fixture.client().with_admin(fixture.sequencer_inbox, foreign);

        let findings = verify(&client, fixture.rollup).await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, FindingCategory::ProxyAdmin);
        assert_eq!(findings[0].severity, Severity::Violation);
        assert!(findings[0].message.starts_with("SequencerInbox admin is not the ProxyAdmin"));
        assert!(findings.iter().all(|finding| !finding.message.contains("Bridge")));
    }

    #[tokio::test]
    async fn test_unresolved_proxy_admin_keeps_executor_checks() {
        let fixture = DeploymentFixture { proxy_admin: Address::ZERO, ..Default::default() };
        let client = fixture.client().with_admin(fixture.rollup, Address::repeat_byte(0x52));

        let findings = verify(&client, fixture.rollup).await;
        let proxy_admin: Vec<_> =
            findings.iter().filter(|f| f.category == FindingCategory::ProxyAdmin).collect();
        assert_eq!(proxy_admin.len(), 1);
        assert_eq!(proxy_admin[0].severity, Severity::Skipped);
        assert!(findings.iter().any(|f| {
            f.category == FindingCategory::Ownership &&
                f.message.starts_with("Rollup admin is not the UpgradeExecutor")
        }));
    }

    #[tokio::test]
    async fn test_ownership_mismatches() {
        let fixture = DeploymentFixture::default();
        let stranger = Address::repeat_byte(0x53);
        let client = fixture
            .client()
            .with_call(fixture.rollup, IOwnable::ownerCall {}, stranger)
            .with_call(fixture.proxy_admin, IOwnable::ownerCall {}, stranger);

        let findings = verify(&client, fixture.rollup).await;
        let messages: Vec<_> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(findings.len(), 2);
        assert!(messages[0].starts_with("Rollup owner"));
        assert!(messages[1].starts_with("ProxyAdmin owner"));
    }

    #[tokio::test]
    async fn test_foreign_admin_role_and_missing_executor() {
        let fixture = DeploymentFixture::default();
        let intruder = Address::repeat_byte(0x54);
        let client = fixture
            .client()
            .with_event(
                fixture.upgrade_executor,
                &IAccessControl::RoleGranted {
                    role: *ADMIN_ROLE,
                    account: intruder,
                    sender: fixture.upgrade_executor,
                },
                120,
                0,
            )
            .with_event(
                fixture.upgrade_executor,
                &IAccessControl::RoleRevoked {
                    role: *EXECUTOR_ROLE,
                    account: fixture.chain_owner,
                    sender: fixture.upgrade_executor,
                },
                121,
                0,
            );

        let findings = verify(&client, fixture.rollup).await;
        assert_eq!(findings.len(), 2);
        assert!(findings[0].message.contains("holds ADMIN_ROLE"));
        assert!(findings[1].message.starts_with("no account holds EXECUTOR_ROLE"));
    }

    #[tokio::test]
    async fn test_executor_without_roles() {
        let fixture = DeploymentFixture { grant_roles: false, ..Default::default() };
        let findings = verify(&fixture.client(), fixture.rollup).await;
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("never granted any role"));
    }

    #[tokio::test]
    async fn test_legacy_deployment_skips_executor_checks() {
        let fixture = DeploymentFixture { legacy: true, ..Default::default() };
        let findings = verify(&fixture.client(), fixture.rollup).await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, FindingCategory::UpgradeExecutor);
        assert_eq!(findings[0].severity, Severity::Skipped);
    }

    #[tokio::test]
    async fn test_missing_receipt_skips_dependent_checks() {
        let fixture = DeploymentFixture::default();
        let client = fixture.client().without_receipt(fixture.creation_tx);

        let findings = verify(&client, fixture.rollup).await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, FindingCategory::Provenance);
        assert!(
            findings[0].message.contains("skipped UpgradeExecutor, ProxyAdmin, native token checks")
        );
    }

    #[tokio::test]
    async fn test_tokens_without_code() {
        let native_token = Address::repeat_byte(0x61);
        let fixture = DeploymentFixture { native_token, ..Default::default() };
        let client = fixture.client().without_code(native_token).without_code(fixture.stake_token);

        let findings = verify(&client, fixture.rollup).await;
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.category == FindingCategory::Token));
        assert!(findings[0].message.starts_with("native token"));
        assert!(findings[1].message.starts_with("stake token"));
    }

    #[tokio::test]
    async fn test_verification_is_idempotent() {
        let fixture = DeploymentFixture { proxy_admin: Address::ZERO, ..Default::default() };
        let client = fixture.client().with_admin(fixture.bridge, Address::repeat_byte(0x55));
        assert_eq!(verify(&client, fixture.rollup).await, verify(&client, fixture.rollup).await);
    }

    #[tokio::test]
    async fn test_undecodable_calldata_skips_only_data_availability() {
        let fixture = DeploymentFixture::default();
        let client = fixture
            .client()
            .with_input(fixture.creation_tx, Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]));

        let findings = verify(&client, fixture.rollup).await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, FindingCategory::Provenance);
        assert_eq!(findings[0].severity, Severity::Skipped);
        assert!(findings[0].message.starts_with("createRollup input"));
        assert!(findings[0].message.ends_with("; skipped data availability checks"));
    }

    #[tokio::test]
    async fn test_failed_stake_token_read_is_skipped() {
        let fixture = DeploymentFixture::default();
        let client = fixture.client().without_call(fixture.rollup, IRollupCore::stakeTokenCall {});

        let findings = verify(&client, fixture.rollup).await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, FindingCategory::Token);
        assert_eq!(findings[0].severity, Severity::Skipped);
        assert!(findings[0].message.starts_with("stake token unknown: "));
    }

    #[tokio::test]
    async fn test_zero_live_satellite_is_unresolved() {
        let fixture = DeploymentFixture::default();
        let client =
            fixture.client().with_call(fixture.rollup, IRollupCore::outboxCall {}, Address::ZERO);

        let findings = verify(&client, fixture.rollup).await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, FindingCategory::ProxyAdmin);
        assert_eq!(findings[0].severity, Severity::Skipped);
        assert_eq!(findings[0].message, "Outbox address unresolved");
    }
}
