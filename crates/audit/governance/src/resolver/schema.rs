//! Known shapes of the `RollupCreated` event and the `createRollup` call.

use crate::{AddressBinding, ContractRole};
use alloy_primitives::{Address, B256, Log, U256};
use alloy_sol_types::{SolCall, SolEvent};
use core::fmt::Debug;
use orbit_abi::{RollupCreatorCanonical, RollupCreatorLegacy};
use serde::{Deserialize, Serialize};

/// A versioned event shape.
pub trait EventSchema: Debug + Copy + Send + Sync {
    /// The decoded value.
    type Output;

    /// The event signature hash, matched against `topic0`.
    fn topic(&self) -> B256;

    /// Decodes a log carrying [`Self::topic`].
    fn decode(&self, log: &Log) -> Result<Self::Output, alloy_sol_types::Error>;
}

/// A versioned function call shape.
pub trait CallSchema: Debug + Copy + Send + Sync {
    /// The decoded value.
    type Output;

    /// The 4-byte function selector.
    fn selector(&self) -> [u8; 4];

    /// Decodes calldata starting with [`Self::selector`].
    fn decode(&self, input: &[u8]) -> Result<Self::Output, alloy_sol_types::Error>;
}

/// Variants of the `RollupCreated` factory event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RollupCreatedSchema {
    /// Twelve addresses, including the native token and the upgrade executor.
    Canonical,
    /// Ten addresses. Predates custom gas tokens and the upgrade executor.
    Legacy,
}

impl RollupCreatedSchema {
    /// Every variant, newest first.
    pub const ALL: [Self; 2] = [Self::Canonical, Self::Legacy];
}

/// The addresses announced by a `RollupCreated` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollupCreatedRecord {
    /// The rollup proxy.
    pub rollup: Address,
    /// The delayed inbox.
    pub inbox: Address,
    /// The outbox.
    pub outbox: Address,
    /// The rollup event inbox.
    pub rollup_event_inbox: Address,
    /// The challenge manager.
    pub challenge_manager: Address,
    /// The `ProxyAdmin` of the satellite contracts.
    pub proxy_admin: Address,
    /// The sequencer inbox.
    pub sequencer_inbox: Address,
    /// The bridge.
    pub bridge: Address,
    /// The validator utilities contract.
    pub validator_utils: Address,
    /// The validator wallet creator.
    pub validator_wallet_creator: Address,
    /// The gas token of the chain, zero for ether. `None` when the event predates gas tokens.
    pub native_token: Option<Address>,
    /// The owner of the deployment. `None` when the event predates the upgrade executor.
    pub upgrade_executor: Option<Address>,
}

impl RollupCreatedRecord {
    /// The contract roles announced by the event. Zero addresses stay unbound.
    pub fn binding(&self) -> AddressBinding {
        let mut binding = AddressBinding::default();
        binding.insert(ContractRole::Rollup, self.rollup);
        binding.insert(ContractRole::Bridge, self.bridge);
        binding.insert(ContractRole::Inbox, self.inbox);
        binding.insert(ContractRole::SequencerInbox, self.sequencer_inbox);
        binding.insert(ContractRole::Outbox, self.outbox);
        binding.insert(ContractRole::ProxyAdmin, self.proxy_admin);
        if let Some(upgrade_executor) = self.upgrade_executor {
            binding.insert(ContractRole::UpgradeExecutor, upgrade_executor);
        }
        binding
    }
}

impl EventSchema for RollupCreatedSchema {
    type Output = RollupCreatedRecord;

    fn topic(&self) -> B256 {
        match self {
            Self::Canonical => RollupCreatorCanonical::RollupCreated::SIGNATURE_HASH,
            Self::Legacy => RollupCreatorLegacy::RollupCreated::SIGNATURE_HASH,
        }
    }

    fn decode(&self, log: &Log) -> Result<Self::Output, alloy_sol_types::Error> {
        match self {
            Self::Canonical => {
                let event = RollupCreatorCanonical::RollupCreated::decode_log_data(&log.data)?;
                Ok(RollupCreatedRecord {
                    rollup: event.rollupAddress,
                    inbox: event.inboxAddress,
                    outbox: event.outbox,
                    rollup_event_inbox: event.rollupEventInbox,
                    challenge_manager: event.challengeManager,
                    proxy_admin: event.adminProxy,
                    sequencer_inbox: event.sequencerInbox,
                    bridge: event.bridge,
                    validator_utils: event.validatorUtils,
                    validator_wallet_creator: event.validatorWalletCreator,
                    native_token: Some(event.nativeToken),
                    upgrade_executor: Some(event.upgradeExecutor),
                })
            }
            Self::Legacy => {
                let event = RollupCreatorLegacy::RollupCreated::decode_log_data(&log.data)?;
                Ok(RollupCreatedRecord {
                    rollup: event.rollupAddress,
                    inbox: event.inboxAddress,
                    outbox: event.outbox,
                    rollup_event_inbox: event.rollupEventInbox,
                    challenge_manager: event.challengeManager,
                    proxy_admin: event.adminProxy,
                    sequencer_inbox: event.sequencerInbox,
                    bridge: event.bridge,
                    validator_utils: event.validatorUtils,
                    validator_wallet_creator: event.validatorWalletCreator,
                    native_token: None,
                    upgrade_executor: None,
                })
            }
        }
    }
}

/// Variants of the `createRollup` factory call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CreateRollupSchema {
    /// A single `RollupDeploymentParams` tuple.
    Canonical,
    /// `Config`, batch poster and validators as separate arguments.
    Legacy,
}

impl CreateRollupSchema {
    /// Every variant, newest first.
    pub const ALL: [Self; 2] = [Self::Canonical, Self::Legacy];
}

/// The deployment parameters passed to `createRollup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreationParams {
    /// The initial rollup owner.
    pub owner: Address,
    /// The token validators stake.
    pub stake_token: Address,
    /// The required stake.
    pub base_stake: U256,
    /// The child chain id.
    pub chain_id: U256,
    /// The child chain configuration as a JSON document.
    pub chain_config: String,
    /// The initial WASM module root.
    pub wasm_module_root: B256,
    /// Blocks before an assertion can be confirmed.
    pub confirm_period_blocks: u64,
    /// The initial batch poster.
    pub batch_poster: Address,
    /// The initial validator set.
    pub validators: Vec<Address>,
    /// Maximum batch size. `None` for legacy calls.
    pub max_data_size: Option<U256>,
    /// The requested gas token. `None` for legacy calls.
    pub native_token: Option<Address>,
    /// Whether factories were deployed to the child chain. `None` for legacy calls.
    pub deploy_factories_to_l2: Option<bool>,
    /// Fee cap for factory retryables. `None` for legacy calls.
    pub max_fee_per_gas_for_retryables: Option<U256>,
}

impl CreationParams {
    /// Parses the embedded chain configuration.
    pub fn parsed_chain_config(&self) -> Result<ChainConfig, serde_json::Error> {
        serde_json::from_str(&self.chain_config)
    }
}

impl CallSchema for CreateRollupSchema {
    type Output = CreationParams;

    fn selector(&self) -> [u8; 4] {
        match self {
            Self::Canonical => RollupCreatorCanonical::createRollupCall::SELECTOR,
            Self::Legacy => RollupCreatorLegacy::createRollupCall::SELECTOR,
        }
    }

    fn decode(&self, input: &[u8]) -> Result<Self::Output, alloy_sol_types::Error> {
        match self {
            Self::Canonical => {
                let call = RollupCreatorCanonical::createRollupCall::abi_decode(input)?;
                let params = call.deployParams;
                let config = params.config;
                Ok(CreationParams {
                    owner: config.owner,
                    stake_token: config.stakeToken,
                    base_stake: config.baseStake,
                    chain_id: config.chainId,
                    chain_config: config.chainConfig,
                    wasm_module_root: config.wasmModuleRoot,
                    confirm_period_blocks: config.confirmPeriodBlocks,
                    batch_poster: params.batchPoster,
                    validators: params.validators,
                    max_data_size: Some(params.maxDataSize),
                    native_token: Some(params.nativeToken),
                    deploy_factories_to_l2: Some(params.deployFactoriesToL2),
                    max_fee_per_gas_for_retryables: Some(params.maxFeePerGasForRetryables),
                })
            }
            Self::Legacy => {
                let call = RollupCreatorLegacy::createRollupCall::abi_decode(input)?;
                let config = call.config;
                Ok(CreationParams {
                    owner: config.owner,
                    stake_token: config.stakeToken,
                    base_stake: config.baseStake,
                    chain_id: config.chainId,
                    chain_config: config.chainConfig,
                    wasm_module_root: config.wasmModuleRoot,
                    confirm_period_blocks: config.confirmPeriodBlocks,
                    batch_poster: call._batchPoster,
                    validators: call._validators,
                    max_data_size: None,
                    native_token: None,
                    deploy_factories_to_l2: None,
                    max_fee_per_gas_for_retryables: None,
                })
            }
        }
    }
}

/// The subset of the child chain configuration the audit relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// The child chain id.
    #[serde(default)]
    pub chain_id: Option<u64>,
    /// Arbitrum specific parameters.
    #[serde(default)]
    pub arbitrum: ArbitrumChainParams,
}

impl ChainConfig {
    /// Returns `true` if the chain posts data to a data availability committee.
    pub const fn uses_data_availability_committee(&self) -> bool {
        self.arbitrum.data_availability_committee
    }
}

/// The `arbitrum` section of a [`ChainConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ArbitrumChainParams {
    /// AnyTrust mode.
    #[serde(default)]
    pub data_availability_committee: bool,
    /// The chain owner installed at genesis.
    #[serde(default, rename = "InitialChainOwner")]
    pub initial_chain_owner: Option<Address>,
    /// The ArbOS version at genesis.
    #[serde(default, rename = "InitialArbOSVersion")]
    pub initial_arbos_version: Option<u64>,
    /// Whether ArbOS is enabled.
    #[serde(default, rename = "EnableArbOS")]
    pub enable_arbos: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{LogData, U256};

    fn log(data: LogData) -> Log {
        Log { address: Address::repeat_byte(0xfa), data }
    }

    fn canonical_event() -> RollupCreatorCanonical::RollupCreated {
        RollupCreatorCanonical::RollupCreated {
            rollupAddress: Address::repeat_byte(0x01),
            nativeToken: Address::repeat_byte(0x0a),
            inboxAddress: Address::repeat_byte(0x03),
            outbox: Address::repeat_byte(0x05),
            rollupEventInbox: Address::repeat_byte(0x0b),
            challengeManager: Address::repeat_byte(0x0c),
            adminProxy: Address::repeat_byte(0x06),
            sequencerInbox: Address::repeat_byte(0x04),
            bridge: Address::repeat_byte(0x02),
            upgradeExecutor: Address::repeat_byte(0x07),
            validatorUtils: Address::repeat_byte(0x0d),
            validatorWalletCreator: Address::repeat_byte(0x0e),
        }
    }

    #[test]
    fn test_canonical_rollup_created_fields() {
        let record = RollupCreatedSchema::Canonical
            .decode(&log(canonical_event().encode_log_data()))
            .unwrap();

        assert_eq!(record.rollup, Address::repeat_byte(0x01));
        assert_eq!(record.bridge, Address::repeat_byte(0x02));
        assert_eq!(record.proxy_admin, Address::repeat_byte(0x06));
        assert_eq!(record.native_token, Some(Address::repeat_byte(0x0a)));
        assert_eq!(record.upgrade_executor, Some(Address::repeat_byte(0x07)));
        assert_eq!(record.binding().get(ContractRole::UpgradeExecutor), record.upgrade_executor);
    }

    #[test]
    fn test_legacy_rollup_created_has_no_token_or_executor() {
        let event = RollupCreatorLegacy::RollupCreated {
            rollupAddress: Address::repeat_byte(0x01),
            inboxAddress: Address::repeat_byte(0x03),
            outbox: Address::repeat_byte(0x05),
            rollupEventInbox: Address::repeat_byte(0x0b),
            challengeManager: Address::repeat_byte(0x0c),
            adminProxy: Address::repeat_byte(0x06),
            sequencerInbox: Address::repeat_byte(0x04),
            bridge: Address::repeat_byte(0x02),
            validatorUtils: Address::repeat_byte(0x0d),
            validatorWalletCreator: Address::repeat_byte(0x0e),
        };
        let record = RollupCreatedSchema::Legacy.decode(&log(event.encode_log_data())).unwrap();

        assert_eq!(record.sequencer_inbox, Address::repeat_byte(0x04));
        assert_eq!(record.native_token, None);
        assert_eq!(record.upgrade_executor, None);
        assert!(!record.binding().contains(ContractRole::UpgradeExecutor));
    }

    #[test]
    fn test_legacy_decoder_rejects_canonical_log() {
        assert!(RollupCreatedSchema::Legacy.decode(&log(canonical_event().encode_log_data())).is_err());
    }

    #[test]
    fn test_legacy_create_rollup_call() {
        let call = RollupCreatorLegacy::createRollupCall {
            config: RollupCreatorLegacy::Config {
                confirmPeriodBlocks: 45_818,
                extraChallengeTimeBlocks: 0,
                stakeToken: Address::repeat_byte(0x33),
                baseStake: U256::from(100),
                wasmModuleRoot: B256::repeat_byte(0x44),
                owner: Address::repeat_byte(0x55),
                loserStakeEscrow: Address::ZERO,
                chainId: U256::from(412_346),
                chainConfig: "{}".to_string(),
                genesisBlockNum: 0,
                sequencerInboxMaxTimeVariation: RollupCreatorLegacy::MaxTimeVariation {
                    delayBlocks: U256::from(5_760),
                    futureBlocks: U256::from(12),
                    delaySeconds: U256::from(86_400),
                    futureSeconds: U256::from(3_600),
                },
            },
            _batchPoster: Address::repeat_byte(0x66),
            _validators: vec![Address::repeat_byte(0x77)],
        };

        assert!(CreateRollupSchema::Canonical.decode(&call.abi_encode()).is_err());
        let params = CreateRollupSchema::Legacy.decode(&call.abi_encode()).unwrap();
        assert_eq!(params.owner, Address::repeat_byte(0x55));
        assert_eq!(params.batch_poster, Address::repeat_byte(0x66));
        assert_eq!(params.validators, vec![Address::repeat_byte(0x77)]);
        assert_eq!(params.native_token, None);
        assert_eq!(params.max_data_size, None);
    }

    #[test]
    fn test_chain_config_parsing() {
        let config: ChainConfig = serde_json::from_str(
            r#"{
                "chainId": 412346,
                "homesteadBlock": 0,
                "arbitrum": {
                    "EnableArbOS": true,
                    "DataAvailabilityCommittee": true,
                    "InitialArbOSVersion": 20,
                    "InitialChainOwner": "0x5555555555555555555555555555555555555555",
                    "GenesisBlockNum": 0
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.chain_id, Some(412_346));
        assert!(config.uses_data_availability_committee());
        assert_eq!(config.arbitrum.initial_chain_owner, Some(Address::repeat_byte(0x55)));
        assert_eq!(config.arbitrum.initial_arbos_version, Some(20));
    }

    #[test]
    fn test_chain_config_defaults_to_rollup_mode() {
        let config: ChainConfig = serde_json::from_str(r#"{"chainId": 1}"#).unwrap();
        assert!(!config.uses_data_availability_committee());
        assert!(serde_json::from_str::<ChainConfig>("not json").is_err());
    }
}
