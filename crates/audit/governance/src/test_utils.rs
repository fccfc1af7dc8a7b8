//! In-memory chain fixtures for tests.

use crate::{ChainClient, ChainClientError, LogPosition, LogQuery, ReceiptLogs};
use alloy_primitives::{Address, B256, Bytes, LogData, U256};
use alloy_rpc_types_eth::Log;
use alloy_sol_types::{SolCall, SolEvent, SolValue};
use async_trait::async_trait;
use orbit_abi::{
    ADMIN_ROLE, EXECUTOR_ROLE, IAccessControl, IBridge, IOwnable, IRollupCore, ISequencerInbox,
    PROXY_ADMIN_SLOT, RollupCreatorCanonical, RollupCreatorLegacy,
};
use std::collections::{HashMap, HashSet};

/// Builds a mined RPC log.
pub fn rpc_log(address: Address, data: LogData, block: u64, index: u64, tx: B256) -> Log {
    Log {
        inner: alloy_primitives::Log { address, data },
        block_number: Some(block),
        log_index: Some(index),
        transaction_hash: Some(tx),
        ..Default::default()
    }
}

/// A [`ChainClient`] backed by in-memory state.
///
/// Unknown calls revert, unknown storage reads as zero and unknown accounts have no code.
#[derive(Debug, Clone, Default)]
pub struct MockChainClient {
    logs: Vec<Log>,
    receipts: HashMap<B256, ReceiptLogs>,
    inputs: HashMap<B256, Bytes>,
    storage: HashMap<(Address, B256), B256>,
    code: HashMap<Address, Bytes>,
    calls: HashMap<(Address, Bytes), Bytes>,
    failing: HashSet<Address>,
    failing_topics: HashSet<B256>,
    head: u64,
}

impl MockChainClient {
    /// Adds a log.
    pub fn with_log(mut self, log: Log) -> Self {
        self.logs.push(log);
        self
    }

    /// Adds an event emitted by `address` at `(block, index)`.
    pub fn with_event<E: SolEvent>(self, address: Address, event: &E, block: u64, index: u64) -> Self {
        let tx = B256::left_padding_from(&block.to_be_bytes());
        self.with_log(rpc_log(address, event.encode_log_data(), block, index, tx))
    }

    /// Sets the receipt of `tx`.
    pub fn with_receipt(mut self, tx: B256, to: Option<Address>, logs: Vec<Log>) -> Self {
        self.receipts.insert(tx, ReceiptLogs { to, logs });
        self
    }

    /// Drops the receipt of `tx`.
    pub fn without_receipt(mut self, tx: B256) -> Self {
        self.receipts.remove(&tx);
        self
    }

    /// Sets the calldata of `tx`.
    pub fn with_input(mut self, tx: B256, input: Bytes) -> Self {
        self.inputs.insert(tx, input);
        self
    }

    /// Writes the EIP-1967 admin slot of `contract`.
    pub fn with_admin(mut self, contract: Address, admin: Address) -> Self {
        self.storage.insert((contract, PROXY_ADMIN_SLOT), admin.into_word());
        self
    }

    /// Deploys placeholder bytecode at `address`.
    pub fn with_code(mut self, address: Address) -> Self {
        self.code.insert(address, Bytes::from_static(&[0x60, 0x80, 0x60, 0x40]));
        self
    }

    /// Removes the bytecode at `address`.
    pub fn without_code(mut self, address: Address) -> Self {
        self.code.remove(&address);
        self
    }

    /// Makes `call` on `to` return `output`.
    pub fn with_call<S: SolCall, R: SolValue>(mut self, to: Address, call: S, output: R) -> Self {
        self.calls.insert((to, call.abi_encode().into()), output.abi_encode().into());
        self
    }

    /// Makes `call` on `to` revert.
    pub fn without_call<S: SolCall>(mut self, to: Address, call: S) -> Self {
        self.calls.remove(&(to, Bytes::from(call.abi_encode())));
        self
    }

    /// Makes every read involving `address` fail.
    pub fn failing(mut self, address: Address) -> Self {
        self.failing.insert(address);
        self
    }

    /// Makes every log query for `topic` fail.
    pub fn failing_topic(mut self, topic: B256) -> Self {
        self.failing_topics.insert(topic);
        self
    }

    /// Sets the chain head.
    pub const fn with_head(mut self, head: u64) -> Self {
        self.head = head;
        self
    }

    fn check(&self, address: Address) -> Result<(), ChainClientError> {
        if self.failing.contains(&address) {
            return Err(ChainClientError::Transport(format!("{address} unreachable").into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, ChainClientError> {
        self.check(to)?;
        self.calls
            .get(&(to, input))
            .cloned()
            .ok_or_else(|| ChainClientError::Transport("execution reverted".into()))
    }

    async fn get_logs(&self, query: LogQuery) -> Result<Vec<Log>, ChainClientError> {
        if let Some(address) = query.address {
            self.check(address)?;
        }
        if self.failing_topics.contains(&query.topic0) {
            return Err(ChainClientError::Transport("query timed out".into()));
        }

        let mut logs: Vec<_> = self
            .logs
            .iter()
            .filter(|log| query.address.is_none_or(|address| log.inner.address == address))
            .filter(|log| log.inner.data.topics().first() == Some(&query.topic0))
            .filter(|log| log.block_number.is_some_and(|block| query.range.contains(block)))
            .cloned()
            .collect();
        logs.sort_by_key(LogPosition::of);
        Ok(logs)
    }

    async fn get_transaction_receipt(&self, hash: B256) -> Result<ReceiptLogs, ChainClientError> {
        self.receipts.get(&hash).cloned().ok_or(ChainClientError::MissingReceipt(hash))
    }

    async fn get_transaction_input(&self, hash: B256) -> Result<Bytes, ChainClientError> {
        self.inputs.get(&hash).cloned().ok_or(ChainClientError::MissingTransaction(hash))
    }

    async fn get_storage_at(
        &self,
        address: Address,
        slot: B256,
    ) -> Result<B256, ChainClientError> {
        self.check(address)?;
        Ok(self.storage.get(&(address, slot)).copied().unwrap_or_default())
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, ChainClientError> {
        self.check(address)?;
        Ok(self.code.get(&address).cloned().unwrap_or_default())
    }

    async fn block_number(&self) -> Result<u64, ChainClientError> {
        Ok(self.head)
    }
}

/// A complete rollup deployment, healthy unless modified.
///
/// The `UpgradeExecutor` owns the rollup and the `ProxyAdmin`, the `ProxyAdmin` administers
/// every satellite, and the chain owner holds `EXECUTOR_ROLE`.
#[derive(Debug, Clone)]
pub struct DeploymentFixture {
    /// The `RollupCreator` factory.
    pub factory: Address,
    /// The rollup proxy.
    pub rollup: Address,
    /// The bridge.
    pub bridge: Address,
    /// The delayed inbox.
    pub inbox: Address,
    /// The sequencer inbox.
    pub sequencer_inbox: Address,
    /// The outbox.
    pub outbox: Address,
    /// The proxy admin. Zero to announce none.
    pub proxy_admin: Address,
    /// The upgrade executor.
    pub upgrade_executor: Address,
    /// The chain owner, holder of `EXECUTOR_ROLE`.
    pub chain_owner: Address,
    /// The stake token.
    pub stake_token: Address,
    /// The gas token, zero for ether.
    pub native_token: Address,
    /// The batch poster.
    pub batch_poster: Address,
    /// The child chain id.
    pub chain_id: u64,
    /// Overrides the generated chain config JSON.
    pub chain_config: Option<String>,
    /// The deployment transaction.
    pub creation_tx: B256,
    /// The deployment block.
    pub creation_block: u64,
    /// Deploy through the legacy factory.
    pub legacy: bool,
    /// AnyTrust mode.
    pub data_availability_committee: bool,
    /// Emit the initial role grants of the upgrade executor.
    pub grant_roles: bool,
    /// Announced keysets and their live validity.
    pub keysets: Vec<(B256, bool)>,
    /// Blocks with a batch delivery on the sequencer inbox.
    pub batch_blocks: Vec<u64>,
    /// The chain head.
    pub head: u64,
}

impl Default for DeploymentFixture {
    fn default() -> Self {
        Self {
            factory: Address::repeat_byte(0xfa),
            rollup: Address::repeat_byte(0x01),
            bridge: Address::repeat_byte(0x02),
            inbox: Address::repeat_byte(0x03),
            sequencer_inbox: Address::repeat_byte(0x04),
            outbox: Address::repeat_byte(0x05),
            proxy_admin: Address::repeat_byte(0x06),
            upgrade_executor: Address::repeat_byte(0x07),
            chain_owner: Address::repeat_byte(0x08),
            stake_token: Address::repeat_byte(0x09),
            native_token: Address::ZERO,
            batch_poster: Address::repeat_byte(0x0b),
            chain_id: 412_346,
            chain_config: None,
            creation_tx: B256::repeat_byte(0xc1),
            creation_block: 100,
            legacy: false,
            data_availability_committee: false,
            grant_roles: true,
            keysets: Vec::new(),
            batch_blocks: vec![150],
            head: 200,
        }
    }
}

impl DeploymentFixture {
    /// A client holding only this deployment.
    pub fn client(&self) -> MockChainClient {
        self.install(MockChainClient::default())
    }

    /// Adds this deployment to `client`.
    pub fn install(&self, client: MockChainClient) -> MockChainClient {
        let block = self.creation_block;
        let tx = self.creation_tx;
        let owner = if self.legacy { self.chain_owner } else { self.upgrade_executor };

        let initialized = rpc_log(
            self.rollup,
            IRollupCore::RollupInitialized {
                machineHash: B256::repeat_byte(0x4d),
                chainId: U256::from(self.chain_id),
            }
            .encode_log_data(),
            block,
            1,
            tx,
        );
        let receipt_logs = vec![
            rpc_log(
                self.bridge,
                IBridge::SequencerInboxUpdated { newSequencerInbox: self.sequencer_inbox }
                    .encode_log_data(),
                block,
                0,
                tx,
            ),
            initialized.clone(),
            rpc_log(self.factory, self.rollup_created(), block, 5, tx),
        ];

        let mut client = client
            .with_head(self.head)
            .with_log(initialized)
            .with_receipt(tx, Some(self.factory), receipt_logs)
            .with_input(tx, self.create_rollup_input())
            .with_call(self.rollup, IRollupCore::bridgeCall {}, self.bridge)
            .with_call(self.rollup, IRollupCore::inboxCall {}, self.inbox)
            .with_call(self.rollup, IRollupCore::sequencerInboxCall {}, self.sequencer_inbox)
            .with_call(self.rollup, IRollupCore::outboxCall {}, self.outbox)
            .with_call(self.rollup, IRollupCore::stakeTokenCall {}, self.stake_token)
            .with_call(self.rollup, IOwnable::ownerCall {}, owner)
            .with_admin(self.rollup, owner)
            .with_code(self.stake_token);

        if !self.proxy_admin.is_zero() {
            client = client.with_call(self.proxy_admin, IOwnable::ownerCall {}, owner);
        }
        for satellite in [self.bridge, self.inbox, self.sequencer_inbox, self.outbox] {
            client = client.with_admin(satellite, self.proxy_admin).with_code(satellite);
        }
        if !self.native_token.is_zero() {
            client = client.with_code(self.native_token);
        }

        if !self.legacy && self.grant_roles {
            let grants = [(*ADMIN_ROLE, self.upgrade_executor), (*EXECUTOR_ROLE, self.chain_owner)];
            for (index, (role, account)) in grants.into_iter().enumerate() {
                let event = IAccessControl::RoleGranted { role, account, sender: self.factory };
                client = client.with_log(rpc_log(
                    self.upgrade_executor,
                    event.encode_log_data(),
                    block,
                    2 + index as u64,
                    tx,
                ));
            }
        }

        for (offset, (hash, valid)) in self.keysets.iter().enumerate() {
            let event = ISequencerInbox::SetValidKeyset {
                keysetHash: *hash,
                keysetBytes: Bytes::copy_from_slice(hash.as_slice()),
            };
            client = client
                .with_event(self.sequencer_inbox, &event, block + 10 + offset as u64, 0)
                .with_call(
                    self.sequencer_inbox,
                    ISequencerInbox::isValidKeysetHashCall { ksHash: *hash },
                    *valid,
                );
        }

        for (sequence, batch_block) in self.batch_blocks.iter().enumerate() {
            let event = ISequencerInbox::SequencerBatchDelivered {
                batchSequenceNumber: U256::from(sequence),
                beforeAcc: B256::ZERO,
                afterAcc: B256::repeat_byte(0xac),
                delayedAcc: B256::ZERO,
                afterDelayedMessagesRead: U256::from(1),
                timeBounds: ISequencerInbox::TimeBounds {
                    minTimestamp: 0,
                    maxTimestamp: u64::MAX,
                    minBlockNumber: 0,
                    maxBlockNumber: u64::MAX,
                },
                dataLocation: ISequencerInbox::BatchDataLocation::TxInput,
            };
            client = client.with_event(self.sequencer_inbox, &event, *batch_block, 1);
        }

        client
    }

    fn chain_config_json(&self) -> String {
        self.chain_config.clone().unwrap_or_else(|| {
            format!(
                r#"{{"chainId":{},"homesteadBlock":0,"arbitrum":{{"EnableArbOS":true,"AllowDebugPrecompiles":false,"DataAvailabilityCommittee":{},"InitialArbOSVersion":20,"InitialChainOwner":"{}","GenesisBlockNum":0}}}}"#,
                self.chain_id, self.data_availability_committee, self.chain_owner
            )
        })
    }

    fn rollup_created(&self) -> LogData {
        if self.legacy {
            RollupCreatorLegacy::RollupCreated {
                rollupAddress: self.rollup,
                inboxAddress: self.inbox,
                outbox: self.outbox,
                rollupEventInbox: Address::repeat_byte(0x0c),
                challengeManager: Address::repeat_byte(0x0d),
                adminProxy: self.proxy_admin,
                sequencerInbox: self.sequencer_inbox,
                bridge: self.bridge,
                validatorUtils: Address::repeat_byte(0x0e),
                validatorWalletCreator: Address::repeat_byte(0x0f),
            }
            .encode_log_data()
        } else {
            RollupCreatorCanonical::RollupCreated {
                rollupAddress: self.rollup,
                nativeToken: self.native_token,
                inboxAddress: self.inbox,
                outbox: self.outbox,
                rollupEventInbox: Address::repeat_byte(0x0c),
                challengeManager: Address::repeat_byte(0x0d),
                adminProxy: self.proxy_admin,
                sequencerInbox: self.sequencer_inbox,
                bridge: self.bridge,
                upgradeExecutor: self.upgrade_executor,
                validatorUtils: Address::repeat_byte(0x0e),
                validatorWalletCreator: Address::repeat_byte(0x0f),
            }
            .encode_log_data()
        }
    }

    fn create_rollup_input(&self) -> Bytes {
        if self.legacy {
            RollupCreatorLegacy::createRollupCall {
                config: RollupCreatorLegacy::Config {
                    confirmPeriodBlocks: 45_818,
                    extraChallengeTimeBlocks: 0,
                    stakeToken: self.stake_token,
                    baseStake: U256::from(10).pow(U256::from(17)),
                    wasmModuleRoot: B256::repeat_byte(0x3c),
                    owner: self.chain_owner,
                    loserStakeEscrow: Address::ZERO,
                    chainId: U256::from(self.chain_id),
                    chainConfig: self.chain_config_json(),
                    genesisBlockNum: 0,
                    sequencerInboxMaxTimeVariation: RollupCreatorLegacy::MaxTimeVariation {
                        delayBlocks: U256::from(5_760),
                        futureBlocks: U256::from(12),
                        delaySeconds: U256::from(86_400),
                        futureSeconds: U256::from(3_600),
                    },
                },
                _batchPoster: self.batch_poster,
                _validators: vec![self.chain_owner],
            }
            .abi_encode()
            .into()
        } else {
            RollupCreatorCanonical::createRollupCall {
                deployParams: RollupCreatorCanonical::RollupDeploymentParams {
                    config: RollupCreatorCanonical::Config {
                        confirmPeriodBlocks: 45_818,
                        extraChallengeTimeBlocks: 0,
                        stakeToken: self.stake_token,
                        baseStake: U256::from(10).pow(U256::from(17)),
                        wasmModuleRoot: B256::repeat_byte(0x3c),
                        owner: self.chain_owner,
                        loserStakeEscrow: Address::ZERO,
                        chainId: U256::from(self.chain_id),
                        chainConfig: self.chain_config_json(),
                        genesisBlockNum: 0,
                        sequencerInboxMaxTimeVariation: RollupCreatorCanonical::MaxTimeVariation {
                            delayBlocks: U256::from(5_760),
                            futureBlocks: U256::from(12),
                            delaySeconds: U256::from(86_400),
                            futureSeconds: U256::from(3_600),
                        },
                    },
                    batchPoster: self.batch_poster,
                    validators: vec![self.chain_owner],
                    maxDataSize: U256::from(117_964),
                    nativeToken: self.native_token,
                    deployFactoriesToL2: true,
                    maxFeePerGasForRetryables: U256::from(100_000_000u64),
                },
            }
            .abi_encode()
            .into()
        }
    }
}
