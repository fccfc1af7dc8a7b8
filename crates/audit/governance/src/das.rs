//! Data availability committee keyset validation.

use crate::{
    AuditConfig, AuditError, AuditResult, ChainClient, ContractRole, Finding, FindingCategory,
    GovernanceGraph, LogPosition, LogQuery, read_contract,
    resolver::{Positioned, latest_by_block},
};
use alloy_primitives::{Address, B256};
use alloy_sol_types::SolEvent;
use derive_more::Constructor;
use futures::{StreamExt, stream};
use orbit_abi::ISequencerInbox;
use std::collections::BTreeMap;

/// The live validity of a keyset.
#[derive(Debug)]
pub enum KeysetValidity {
    /// The sequencer inbox accepts the keyset.
    Valid,
    /// The keyset was invalidated.
    Invalid,
    /// The validity could not be read.
    Unknown(AuditError),
}

/// An announced keyset and its current validity.
#[derive(Debug)]
pub struct KeysetStatus {
    /// The keyset hash.
    pub hash: B256,
    /// Where the keyset was last announced.
    pub announced_at: Option<LogPosition>,
    /// The live validity.
    pub validity: KeysetValidity,
}

/// The keysets announced on a sequencer inbox.
#[derive(Debug, Default)]
pub struct KeysetAnnouncements {
    /// Every decoded keyset with its live validity, ordered by hash.
    pub keysets: Vec<KeysetStatus>,
    /// `SetValidKeyset` logs that matched the topic but could not be decoded.
    pub undecodable: Vec<String>,
}

struct Announcement {
    hash: B256,
    position: Option<LogPosition>,
}

impl Positioned for Announcement {
    fn position(&self) -> Option<LogPosition> {
        self.position
    }
}

/// Validates the committee keysets of an AnyTrust chain.
#[derive(Debug, Constructor)]
pub struct DataAvailabilityValidator<'a, C> {
    client: &'a C,
    config: &'a AuditConfig,
}

impl<C: ChainClient> DataAvailabilityValidator<'_, C> {
    /// Returns the data availability findings for `graph`.
    ///
    /// Rollups that do not use a committee, or whose configuration is unknown, yield nothing.
    pub async fn validate(&self, graph: &GovernanceGraph) -> Vec<Finding> {
        let Some(chain_config) = graph.chain_config() else {
            return Vec::new();
        };
        if !chain_config.uses_data_availability_committee() {
            debug!(target: "das", rollup = %graph.rollup, "Chain does not use a committee");
            return Vec::new();
        }

        let Some(sequencer_inbox) = graph.binding.get(ContractRole::SequencerInbox) else {
            return vec![Finding::skipped(
                FindingCategory::DataAvailability,
                "SequencerInbox unresolved; keyset checks skipped",
            )];
        };

        match self.keysets(sequencer_inbox).await {
            Ok(announcements) => self.evaluate(sequencer_inbox, &announcements),
            Err(err) => vec![Finding::skipped(
                FindingCategory::DataAvailability,
                format!("keyset announcements unknown: {err}"),
            )],
        }
    }

    /// Reads every keyset ever announced on `sequencer_inbox`, with its live validity.
    pub async fn keysets(&self, sequencer_inbox: Address) -> AuditResult<KeysetAnnouncements> {
        let query = LogQuery::new(ISequencerInbox::SetValidKeyset::SIGNATURE_HASH)
            .address(sequencer_inbox)
            .range(self.config.block_range());
        let logs = self
            .client
            .get_logs(query)
            .await
            .map_err(|err| AuditError::call("SetValidKeyset log query", err))?;

        let mut announcements: BTreeMap<B256, Vec<Announcement>> = BTreeMap::new();
        let mut undecodable = Vec::new();
        for log in &logs {
            match ISequencerInbox::SetValidKeyset::decode_log_data(&log.inner.data) {
                Ok(event) => announcements
                    .entry(event.keysetHash)
                    .or_default()
                    .push(Announcement { hash: event.keysetHash, position: LogPosition::of(log) }),
                Err(err) => {
                    warn!(target: "das", %sequencer_inbox, %err, "Undecodable SetValidKeyset log");
                    let at = LogPosition::of(log)
                        .map_or_else(|| "pending log".to_string(), |position| position.to_string());
                    undecodable.push(format!("at {at}: {err}"));
                }
            }
        }
        debug!(target: "das", %sequencer_inbox, keysets = announcements.len(), "Checking keysets");

        let latest: Vec<_> = announcements.into_values().filter_map(latest_by_block).collect();
        let keysets = stream::iter(latest)
            .map(|announcement| async move {
                let validity = match read_contract(
                    self.client,
                    sequencer_inbox,
                    ISequencerInbox::isValidKeysetHashCall { ksHash: announcement.hash },
                )
                .await
                {
                    Ok(true) => KeysetValidity::Valid,
                    Ok(false) => KeysetValidity::Invalid,
                    Err(err) => KeysetValidity::Unknown(AuditError::call(
                        format!("isValidKeysetHash({})", announcement.hash),
                        err,
                    )),
                };
                KeysetStatus {
                    hash: announcement.hash,
                    announced_at: announcement.position,
                    validity,
                }
            })
            .buffered(self.config.concurrency())
            .collect()
            .await;
        Ok(KeysetAnnouncements { keysets, undecodable })
    }

    fn evaluate(
        &self,
        sequencer_inbox: Address,
        announcements: &KeysetAnnouncements,
    ) -> Vec<Finding> {
        let mut findings: Vec<_> = announcements
            .undecodable
            .iter()
            .map(|failure| {
                Finding::skipped(
                    FindingCategory::DataAvailability,
                    format!("SetValidKeyset log could not be decoded {failure}"),
                )
            })
            .collect();

        let keysets = &announcements.keysets;
        if keysets.is_empty() {
            if findings.is_empty() {
                findings.push(Finding::violation(
                    FindingCategory::DataAvailability,
                    format!("no keyset was ever announced on SequencerInbox {sequencer_inbox}"),
                ));
            }
            return findings;
        }

        let mut valid = Vec::new();
        for keyset in keysets {
            match &keyset.validity {
                KeysetValidity::Valid => valid.push(keyset.hash),
                KeysetValidity::Invalid => {}
                KeysetValidity::Unknown(err) => findings.push(Finding::skipped(
                    FindingCategory::DataAvailability,
                    format!("keyset {} validity unknown: {err}", keyset.hash),
                )),
            }
        }

        let all_known = findings.is_empty();
        if valid.is_empty() && all_known {
            findings.push(Finding::violation(
                FindingCategory::DataAvailability,
                format!("no valid keyset on SequencerInbox {sequencer_inbox}"),
            ));
        }
        if valid.len() > 1 {
            findings.push(Finding::violation(
                FindingCategory::DataAvailability,
                format!("{} keysets are valid at the same time", valid.len()),
            ));
        }
        for hash in valid.iter().filter(|hash| self.config.is_null_keyset(hash)) {
            findings.push(Finding::critical(
                FindingCategory::DataAvailability,
                format!("valid keyset {hash} uses the publicly known null key"),
            ));
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        GovernanceGraphBuilder, Severity,
        test_utils::{DeploymentFixture, MockChainClient, rpc_log},
    };
    use alloy_primitives::{Bytes, LogData};
    use orbit_abi::{IRollupCore, NULL_KEYSET_HASH};

    fn truncated_announcement(sequencer_inbox: Address, block: u64) -> alloy_rpc_types_eth::Log {
        let data = LogData::new_unchecked(
            vec![ISequencerInbox::SetValidKeyset::SIGNATURE_HASH, B256::repeat_byte(0x0d)],
            Bytes::from(vec![0u8; 7]),
        );
        rpc_log(sequencer_inbox, data, block, 3, B256::left_padding_from(&block.to_be_bytes()))
    }

    async fn validate(
        client: &MockChainClient,
        rollup: Address,
        config: &AuditConfig,
    ) -> Vec<Finding> {
        let graph = GovernanceGraphBuilder::new(client, config).build(rollup).await;
        DataAvailabilityValidator::new(client, config).validate(&graph).await
    }

    fn anytrust(keysets: Vec<(B256, bool)>) -> DeploymentFixture {
        DeploymentFixture { data_availability_committee: true, keysets, ..Default::default() }
    }

    #[tokio::test]
    async fn test_rollup_mode_yields_nothing() {
        let fixture =
            DeploymentFixture { keysets: vec![(*NULL_KEYSET_HASH, true)], ..Default::default() };
        let findings = validate(&fixture.client(), fixture.rollup, &AuditConfig::default()).await;
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn test_single_valid_keyset_is_clean() {
        let fixture =
            anytrust(vec![(B256::repeat_byte(0x01), false), (B256::repeat_byte(0x02), true)]);
        let findings = validate(&fixture.client(), fixture.rollup, &AuditConfig::default()).await;
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn test_null_keyset_is_critical() {
        let fixture = anytrust(vec![(*NULL_KEYSET_HASH, true)]);
        let findings = validate(&fixture.client(), fixture.rollup, &AuditConfig::default()).await;

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert!(!findings.iter().any(|f| f.message.contains("valid at the same time")));
    }

    #[tokio::test]
    async fn test_configured_null_keyset() {
        let custom = B256::repeat_byte(0x0c);
        let fixture = anytrust(vec![(custom, true)]);
        let config = AuditConfig { null_keyset_hashes: vec![custom], ..Default::default() };
        let findings = validate(&fixture.client(), fixture.rollup, &config).await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[tokio::test]
    async fn test_multiple_valid_keysets() {
        let fixture =
            anytrust(vec![(B256::repeat_byte(0x01), true), (B256::repeat_byte(0x02), true)]);
        let findings = validate(&fixture.client(), fixture.rollup, &AuditConfig::default()).await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "2 keysets are valid at the same time");
    }

    #[tokio::test]
    async fn test_no_keyset_announced() {
        let fixture = anytrust(vec![]);
        let findings = validate(&fixture.client(), fixture.rollup, &AuditConfig::default()).await;
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("no keyset was ever announced"));
    }

    #[tokio::test]
    async fn test_no_valid_keyset() {
        let fixture = anytrust(vec![(B256::repeat_byte(0x01), false)]);
        let findings = validate(&fixture.client(), fixture.rollup, &AuditConfig::default()).await;
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("no valid keyset"));
    }

    #[tokio::test]
    async fn test_unknown_validity_is_skipped_per_keyset() {
        let unknown = B256::repeat_byte(0x02);
        let fixture = anytrust(vec![(B256::repeat_byte(0x01), false), (unknown, false)]);
        let client = fixture.client().without_call(
            fixture.sequencer_inbox,
            ISequencerInbox::isValidKeysetHashCall { ksHash: unknown },
        );

        let findings = validate(&client, fixture.rollup, &AuditConfig::default()).await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Skipped);
        assert!(findings[0].message.contains(&unknown.to_string()));
    }

    #[tokio::test]
    async fn test_reannounced_keyset_is_checked_once() {
        let hash = B256::repeat_byte(0x01);
        let fixture = anytrust(vec![(hash, true)]);
        let client = fixture.client().with_event(
            fixture.sequencer_inbox,
            &ISequencerInbox::SetValidKeyset { keysetHash: hash, keysetBytes: vec![0x01].into() },
            190,
            0,
        );
        let config = AuditConfig::default();

        let validator = DataAvailabilityValidator::new(&client, &config);
        let announcements = validator.keysets(fixture.sequencer_inbox).await.unwrap();
        let keysets = &announcements.keysets;
        assert_eq!(keysets.len(), 1);
        assert!(announcements.undecodable.is_empty());
        assert_eq!(keysets[0].announced_at.map(|position| position.block_number), Some(190));
    }

    #[tokio::test]
    async fn test_undecodable_announcement_is_reported() {
        let fixture = anytrust(vec![]);
        let client =
            fixture.client().with_log(truncated_announcement(fixture.sequencer_inbox, 120));

        let findings = validate(&client, fixture.rollup, &AuditConfig::default()).await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Skipped);
        assert_eq!(findings[0].category, FindingCategory::DataAvailability);
        assert!(findings[0].message.starts_with("SetValidKeyset log could not be decoded"));
        assert!(findings[0].message.contains("block 120 log 3"));
    }

    #[tokio::test]
    async fn test_undecodable_announcement_suppresses_no_valid_keyset() {
        let fixture = anytrust(vec![(B256::repeat_byte(0x01), false)]);
        let client =
            fixture.client().with_log(truncated_announcement(fixture.sequencer_inbox, 120));

        let findings = validate(&client, fixture.rollup, &AuditConfig::default()).await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Skipped);
        assert!(!findings.iter().any(|finding| finding.message.starts_with("no valid keyset")));
    }

    #[tokio::test]
    async fn test_unresolved_sequencer_inbox_skips_keysets() {
        let fixture = anytrust(vec![(B256::repeat_byte(0x01), true)]);
        let client = fixture.client().with_call(
            fixture.rollup,
            IRollupCore::sequencerInboxCall {},
            Address::ZERO,
        );

        let findings = validate(&client, fixture.rollup, &AuditConfig::default()).await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Skipped);
        assert_eq!(findings[0].message, "SequencerInbox unresolved; keyset checks skipped");
    }
}
