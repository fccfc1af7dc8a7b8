//! Enumeration of the rollups deployed on a parent chain.

use crate::{AuditConfig, AuditError, AuditResult, BlockRange, ChainClient, LogPosition, LogQuery};
use alloy_primitives::{Address, B256, U256};
use alloy_rpc_types_eth::Log;
use alloy_sol_types::SolEvent;
use derive_more::Constructor;
use futures::{StreamExt, stream};
use orbit_abi::{IBridge, IRollupCore, ISequencerInbox};
use serde::Serialize;

/// A rollup found on the parent chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredRollup {
    /// The rollup proxy.
    pub rollup: Address,
    /// The child chain id.
    pub chain_id: U256,
    /// The deployment transaction.
    pub transaction_hash: B256,
    /// Where the rollup was initialized.
    pub initialized_at: LogPosition,
    /// The sequencer inbox wired up during deployment, if the receipt shows one.
    pub sequencer_inbox: Option<Address>,
    /// Whether the sequencer inbox received a batch within the activity window.
    pub is_active: bool,
}

/// Finds every rollup initialized on the parent chain.
#[derive(Debug, Constructor)]
pub struct RollupDiscovery<'a, C> {
    client: &'a C,
    config: &'a AuditConfig,
}

impl<C: ChainClient> RollupDiscovery<'_, C> {
    /// Lists the discovered rollups in deployment order.
    ///
    /// Rollups without batches in the activity window are omitted unless
    /// [`DiscoveryConfig::include_inactive`](crate::DiscoveryConfig::include_inactive) is set.
    pub async fn discover(&self) -> AuditResult<Vec<DiscoveredRollup>> {
        let head = self
            .client
            .block_number()
            .await
            .map_err(|err| AuditError::call("block number", err))?;
        let query = LogQuery::new(IRollupCore::RollupInitialized::SIGNATURE_HASH)
            .range(self.config.block_range());
        let logs = self
            .client
            .get_logs(query)
            .await
            .map_err(|err| AuditError::call("RollupInitialized log query", err))?;
        info!(target: "discovery", candidates = logs.len(), head, "Found initialized rollups");

        let activity = BlockRange {
            from: head.saturating_sub(self.config.discovery.activity_window_blocks),
            to: Some(head),
        };
        let mut rollups: Vec<_> = stream::iter(&logs)
            .map(|log| self.inspect(log, activity))
            .buffered(self.config.concurrency())
            .filter_map(|rollup| async move { rollup })
            .collect()
            .await;

        rollups.sort_by_key(|rollup| rollup.initialized_at);
        if !self.config.discovery.include_inactive {
            rollups.retain(|rollup| rollup.is_active);
        }
        Ok(rollups)
    }

    async fn inspect(&self, log: &Log, activity: BlockRange) -> Option<DiscoveredRollup> {
        let rollup = log.inner.address;
        let (Some(initialized_at), Some(transaction_hash)) =
            (LogPosition::of(log), log.transaction_hash)
        else {
            warn!(target: "discovery", %rollup, "Skipping unmined RollupInitialized log");
            return None;
        };
        let event = match IRollupCore::RollupInitialized::decode_log_data(&log.inner.data) {
            Ok(event) => event,
            Err(err) => {
                warn!(
                    target: "discovery",
                    %rollup,
                    %err,
                    "Skipping undecodable RollupInitialized log"
                );
                return None;
            }
        };

        let sequencer_inbox = match self.client.get_transaction_receipt(transaction_hash).await {
            Ok(receipt) => receipt
                .logs
                .iter()
                .filter(|log| {
                    log.inner.data.topics().first() ==
                        Some(&IBridge::SequencerInboxUpdated::SIGNATURE_HASH)
                })
                .find_map(|log| {
                    IBridge::SequencerInboxUpdated::decode_log_data(&log.inner.data)
                        .ok()
                        .map(|event| event.newSequencerInbox)
                }),
            Err(err) => {
                warn!(target: "discovery", %rollup, %err, "Deployment receipt unavailable");
                None
            }
        };

        let is_active = match sequencer_inbox {
            Some(inbox) => self.has_recent_batches(inbox, activity).await,
            None => false,
        };

        Some(DiscoveredRollup {
            rollup,
            chain_id: event.chainId,
            transaction_hash,
            initialized_at,
            sequencer_inbox,
            is_active,
        })
    }

    async fn has_recent_batches(&self, sequencer_inbox: Address, activity: BlockRange) -> bool {
        let query = LogQuery::new(ISequencerInbox::SequencerBatchDelivered::SIGNATURE_HASH)
            .address(sequencer_inbox)
            .range(activity);
        match self.client.get_logs(query).await {
            Ok(batches) => !batches.is_empty(),
            Err(err) => {
                warn!(
                    target: "discovery",
                    %sequencer_inbox,
                    %err,
                    "Batch query failed, assuming inactive"
                );
                false
            }
        }
    }
}

/// Lists the rollups initialized on the parent chain. See [`RollupDiscovery::discover`].
pub async fn discover_rollups<C: ChainClient>(
    client: &C,
    config: &AuditConfig,
) -> AuditResult<Vec<DiscoveredRollup>> {
    RollupDiscovery::new(client, config).discover().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DiscoveryConfig, test_utils::DeploymentFixture};

    fn second_rollup() -> DeploymentFixture {
        DeploymentFixture {
            rollup: Address::repeat_byte(0x21),
            bridge: Address::repeat_byte(0x22),
            sequencer_inbox: Address::repeat_byte(0x24),
            chain_id: 555,
            creation_tx: B256::repeat_byte(0xc2),
            creation_block: 90,
            batch_blocks: vec![],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_discovers_active_rollups() {
        let fixture = DeploymentFixture::default();
        let client = second_rollup().install(fixture.client());
        let config = AuditConfig::default();

        let rollups = RollupDiscovery::new(&client, &config).discover().await.unwrap();
        assert_eq!(rollups.len(), 1);
        assert_eq!(rollups[0].rollup, fixture.rollup);
        assert_eq!(rollups[0].sequencer_inbox, Some(fixture.sequencer_inbox));
        assert_eq!(rollups[0].chain_id, U256::from(fixture.chain_id));
        assert!(rollups[0].is_active);
    }

    #[tokio::test]
    async fn test_includes_inactive_rollups_in_deployment_order() {
        let fixture = DeploymentFixture::default();
        let client = second_rollup().install(fixture.client());
        let config = AuditConfig {
            discovery: DiscoveryConfig { include_inactive: true, ..Default::default() },
            ..Default::default()
        };

        let rollups = RollupDiscovery::new(&client, &config).discover().await.unwrap();
        let found: Vec<_> = rollups.iter().map(|rollup| (rollup.rollup, rollup.is_active)).collect();
        assert_eq!(found, vec![(Address::repeat_byte(0x21), false), (fixture.rollup, true)]);
    }

    #[tokio::test]
    async fn test_batches_outside_window_are_inactive() {
        let fixture = DeploymentFixture::default();
        let client = fixture.client();
        let config = AuditConfig {
            discovery: DiscoveryConfig { activity_window_blocks: 10, include_inactive: true },
            ..Default::default()
        };

        let rollups = RollupDiscovery::new(&client, &config).discover().await.unwrap();
        assert_eq!(rollups.len(), 1);
        assert!(!rollups[0].is_active);
    }
}
