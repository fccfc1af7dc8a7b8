//! Deployment provenance: how and with which parameters a rollup was created.

use crate::{
    AddressBinding, AuditError, AuditResult, BlockRange, ChainClient, ChainConfig,
    CreateRollupSchema, CreationParams, Decoded, LogPosition, LogQuery, RollupCreatedRecord,
    RollupCreatedSchema,
    resolver::{decode_call_input, decode_first},
};
use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolEvent;
use orbit_abi::IRollupCore;

/// The `RollupInitialized` event that anchors a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupInitialization {
    /// The initial machine hash.
    pub machine_hash: B256,
    /// The child chain id.
    pub chain_id: U256,
    /// The deployment transaction.
    pub transaction_hash: B256,
    /// Where the event was emitted.
    pub position: LogPosition,
}

/// Everything learned about a rollup from its deployment transaction.
///
/// Each step is kept as its own result: a deployment through an unknown factory still yields
/// its initialization even when the factory event cannot be decoded.
#[derive(Debug)]
pub struct DeploymentProvenance {
    /// The initialization event.
    pub initialization: RollupInitialization,
    /// The factory's `RollupCreated` event, from the deployment receipt.
    pub created: AuditResult<Decoded<RollupCreatedSchema, RollupCreatedRecord>>,
    /// The `createRollup` arguments, from the deployment calldata.
    pub params: AuditResult<Decoded<CreateRollupSchema, CreationParams>>,
    /// The chain configuration embedded in the arguments. `None` if the arguments are unknown.
    pub chain_config: Option<AuditResult<ChainConfig>>,
}

impl DeploymentProvenance {
    /// The decoded `RollupCreated` addresses.
    pub fn record(&self) -> Option<&RollupCreatedRecord> {
        self.created.as_ref().ok().map(|created| &created.value)
    }

    /// The contract roles announced at creation.
    pub fn binding(&self) -> Option<AddressBinding> {
        self.record().map(RollupCreatedRecord::binding)
    }

    /// The decoded creation parameters.
    pub fn creation_params(&self) -> Option<&CreationParams> {
        self.params.as_ref().ok().map(|params| &params.value)
    }

    /// The parsed chain configuration.
    pub fn chain_config(&self) -> Option<&ChainConfig> {
        self.chain_config.as_ref().and_then(|config| config.as_ref().ok())
    }

    /// Resolves the provenance of `rollup`.
    ///
    /// Only a missing or undecodable `RollupInitialized` event is an error. Later steps record
    /// their failure in the returned value.
    pub async fn resolve<C: ChainClient + ?Sized>(
        client: &C,
        rollup: Address,
        range: BlockRange,
    ) -> AuditResult<Self> {
        let initialization = Self::initialization(client, rollup, range).await?;
        let tx = initialization.transaction_hash;

        let receipt = client.get_transaction_receipt(tx).await;
        let input = client.get_transaction_input(tx).await;

        let created = receipt
            .map_err(|err| AuditError::call(format!("receipt of {tx}"), err))
            .and_then(|receipt| {
                decode_first(&receipt.logs, &RollupCreatedSchema::ALL)
                    .into_result("RollupCreated event")
            })
            .and_then(|created| {
                if created.value.rollup == rollup {
                    Ok(created)
                } else {
                    Err(AuditError::decode(
                        "RollupCreated event",
                        vec![format!("announces rollup {}, expected {rollup}", created.value.rollup)],
                    ))
                }
            });

        let params = input
            .map_err(|err| AuditError::call(format!("input of {tx}"), err))
            .and_then(|input| {
                decode_call_input(&CreateRollupSchema::ALL, &input).into_result("createRollup input")
            });

        let chain_config = params.as_ref().ok().map(|params| {
            params
                .value
                .parsed_chain_config()
                .map_err(|err| AuditError::decode("chain config", vec![err.to_string()]))
        });

        match &created {
            Ok(created) => {
                debug!(target: "graph", %rollup, variant = ?created.variant, "Resolved RollupCreated")
            }
            Err(err) => warn!(target: "graph", %rollup, %err, "RollupCreated unavailable"),
        }
        if let Err(err) = &params {
            warn!(target: "graph", %rollup, %err, "createRollup input unavailable");
        }

        Ok(Self { initialization, created, params, chain_config })
    }

    async fn initialization<C: ChainClient + ?Sized>(
        client: &C,
        rollup: Address,
        range: BlockRange,
    ) -> AuditResult<RollupInitialization> {
        let query = LogQuery::new(IRollupCore::RollupInitialized::SIGNATURE_HASH)
            .address(rollup)
            .range(range);
        let logs = client
            .get_logs(query)
            .await
            .map_err(|err| AuditError::call("RollupInitialized log query", err))?;

        let mut failures = Vec::new();
        let mut initializations = Vec::with_capacity(logs.len());
        for log in &logs {
            let (Some(position), Some(transaction_hash)) =
                (LogPosition::of(log), log.transaction_hash)
            else {
                failures.push("RollupInitialized log is not mined".to_string());
                continue;
            };
            match IRollupCore::RollupInitialized::decode_log_data(&log.inner.data) {
                Ok(event) => initializations.push(RollupInitialization {
                    machine_hash: event.machineHash,
                    chain_id: event.chainId,
                    transaction_hash,
                    position,
                }),
                Err(err) => failures.push(format!("at {position}: {err}")),
            }
        }

        if initializations.len() > 1 {
            warn!(
                target: "graph",
                %rollup,
                count = initializations.len(),
                "Rollup initialized more than once, using the earliest"
            );
        }

        match initializations.into_iter().min_by_key(|init| init.position) {
            Some(initialization) => Ok(initialization),
            None if failures.is_empty() => {
                Err(AuditError::not_found(format!("RollupInitialized event of {rollup}")))
            }
            None => Err(AuditError::decode(format!("RollupInitialized event of {rollup}"), failures)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{DeploymentFixture, MockChainClient};

    #[tokio::test]
    async fn test_resolves_canonical_deployment() {
        let fixture = DeploymentFixture::default();
        let provenance =
            DeploymentProvenance::resolve(&fixture.client(), fixture.rollup, BlockRange::FULL)
                .await
                .unwrap();

        assert_eq!(provenance.initialization.transaction_hash, fixture.creation_tx);
        let created = provenance.created.as_ref().unwrap();
        assert_eq!(created.variant, RollupCreatedSchema::Canonical);
        assert_eq!(created.value.upgrade_executor, Some(fixture.upgrade_executor));
        assert_eq!(provenance.params.as_ref().unwrap().variant, CreateRollupSchema::Canonical);
        assert_eq!(provenance.chain_config().unwrap().chain_id, Some(fixture.chain_id));
    }

    #[tokio::test]
    async fn test_resolves_legacy_deployment() {
        let fixture = DeploymentFixture { legacy: true, ..Default::default() };
        let provenance =
            DeploymentProvenance::resolve(&fixture.client(), fixture.rollup, BlockRange::FULL)
                .await
                .unwrap();

        let record = provenance.record().unwrap();
        assert_eq!(record.native_token, None);
        assert_eq!(record.upgrade_executor, None);
        assert_eq!(provenance.params.as_ref().unwrap().variant, CreateRollupSchema::Legacy);
        assert_eq!(provenance.creation_params().unwrap().owner, fixture.chain_owner);
    }

    #[tokio::test]
    async fn test_missing_initialization_is_not_found() {
        let client = MockChainClient::default();
        let result =
            DeploymentProvenance::resolve(&client, Address::repeat_byte(0x01), BlockRange::FULL)
                .await;
        assert!(matches!(result, Err(AuditError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_earliest_initialization_wins() {
        let fixture = DeploymentFixture::default();
        let client = fixture.client().with_event(
            fixture.rollup,
            &IRollupCore::RollupInitialized {
                machineHash: B256::repeat_byte(0x01),
                chainId: U256::from(fixture.chain_id),
            },
            fixture.creation_block + 50,
            0,
        );

        let provenance =
            DeploymentProvenance::resolve(&client, fixture.rollup, BlockRange::FULL).await.unwrap();
        assert_eq!(provenance.initialization.position.block_number, fixture.creation_block);
    }

    #[tokio::test]
    async fn test_unreadable_calldata_keeps_event() {
        let fixture = DeploymentFixture::default();
        let client = fixture.client().with_input(fixture.creation_tx, vec![0xde, 0xad].into());

        let provenance =
            DeploymentProvenance::resolve(&client, fixture.rollup, BlockRange::FULL).await.unwrap();
        assert!(provenance.record().is_some());
        assert!(matches!(provenance.params, Err(AuditError::NotFound(_))));
        assert!(provenance.chain_config.is_none());
    }

    #[tokio::test]
    async fn test_malformed_chain_config_is_retained() {
        let fixture =
            DeploymentFixture { chain_config: Some("{".to_string()), ..Default::default() };
        let provenance =
            DeploymentProvenance::resolve(&fixture.client(), fixture.rollup, BlockRange::FULL)
                .await
                .unwrap();
        assert!(provenance.creation_params().is_some());
        assert!(matches!(provenance.chain_config, Some(Err(AuditError::Decode { .. }))));
    }
}
