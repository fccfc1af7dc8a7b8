//! Assembles the [`GovernanceGraph`] of a rollup.

use super::{DeploymentProvenance, RoleGrants, admin_of, role_grants_of};
use crate::{
    AddressBinding, AuditConfig, AuditError, AuditResult, ChainClient, ChainConfig, ContractRole,
    RollupCreatedRecord, read_contract,
};
use alloy_primitives::Address;
use alloy_sol_types::SolCall;
use derive_more::Constructor;
use futures::{StreamExt, stream};
use orbit_abi::{IOwnable, IRollupCore};
use std::collections::BTreeMap;

/// Whether an address carries bytecode.
#[derive(Debug)]
pub enum CodePresence {
    /// The address is zero, no code is expected.
    NotApplicable,
    /// The address has code.
    Present,
    /// The address has no code.
    Missing,
    /// The code could not be read.
    Unknown(AuditError),
}

/// A token address and whether it is a deployed contract.
#[derive(Debug)]
pub struct TokenStatus {
    /// The token.
    pub address: Address,
    /// Bytecode presence at [`Self::address`].
    pub code: CodePresence,
}

/// The admin and ownership graph of a rollup deployment.
///
/// Every live read is stored as its own result, so a single failure only affects the checks
/// that depend on it.
#[derive(Debug)]
pub struct GovernanceGraph {
    /// The audited rollup.
    pub rollup: Address,
    /// The deployment provenance.
    pub provenance: AuditResult<DeploymentProvenance>,
    /// The resolved contract addresses.
    pub binding: AddressBinding,
    /// The EIP-1967 admin of each bound proxy contract.
    pub admins: BTreeMap<ContractRole, AuditResult<Option<Address>>>,
    /// `owner()` of the rollup.
    pub rollup_owner: AuditResult<Address>,
    /// `owner()` of the `ProxyAdmin`, when one is bound.
    pub proxy_admin_owner: Option<AuditResult<Address>>,
    /// The role holders of the `UpgradeExecutor`, when one is bound.
    pub upgrade_executor_roles: Option<AuditResult<RoleGrants>>,
    /// The gas token announced at creation, when the creation event carries one.
    pub native_token: Option<TokenStatus>,
    /// `stakeToken()` of the rollup.
    pub stake_token: AuditResult<TokenStatus>,
}

impl GovernanceGraph {
    /// The decoded `RollupCreated` event.
    pub fn created(&self) -> Option<&RollupCreatedRecord> {
        self.provenance.as_ref().ok().and_then(DeploymentProvenance::record)
    }

    /// The chain configuration embedded in the deployment.
    pub fn chain_config(&self) -> Option<&ChainConfig> {
        self.provenance.as_ref().ok().and_then(DeploymentProvenance::chain_config)
    }

    /// The admin read for `role`, if the role is bound.
    pub fn admin(&self, role: ContractRole) -> Option<&AuditResult<Option<Address>>> {
        self.admins.get(&role)
    }
}

/// A read of the second build phase.
#[derive(Debug, Clone, Copy)]
enum LiveRead {
    Admin(ContractRole, Address),
    RollupOwner(Address),
    ProxyAdminOwner(Address),
    ExecutorRoles(Address),
    NativeToken(Address),
    StakeToken(Address),
}

#[derive(Debug)]
enum ReadOutcome {
    Admin(ContractRole, AuditResult<Option<Address>>),
    RollupOwner(AuditResult<Address>),
    ProxyAdminOwner(AuditResult<Address>),
    ExecutorRoles(AuditResult<RoleGrants>),
    NativeToken(TokenStatus),
    StakeToken(AuditResult<TokenStatus>),
}

/// Builds the [`GovernanceGraph`] of a rollup from chain reads.
#[derive(Debug, Constructor)]
pub struct GovernanceGraphBuilder<'a, C> {
    client: &'a C,
    config: &'a AuditConfig,
}

impl<C: ChainClient> GovernanceGraphBuilder<'_, C> {
    /// Reads the governance graph of `rollup`.
    pub async fn build(&self, rollup: Address) -> GovernanceGraph {
        let provenance = self.resolve_deployment_provenance(rollup).await;
        if let Err(err) = &provenance {
            warn!(target: "graph", %rollup, %err, "Deployment provenance unavailable");
        }

        let mut binding = provenance
            .as_ref()
            .ok()
            .and_then(DeploymentProvenance::binding)
            .unwrap_or_default();
        binding.insert(ContractRole::Rollup, rollup);
        self.bind_live_satellites(rollup, &mut binding).await;

        let native_token = provenance
            .as_ref()
            .ok()
            .and_then(DeploymentProvenance::record)
            .and_then(|record| record.native_token);

        let reads = Self::live_reads(rollup, &binding, native_token);
        let outcomes: Vec<_> = stream::iter(reads)
            .map(|read| self.perform(read))
            .buffered(self.config.concurrency())
            .collect()
            .await;

        let mut admins = BTreeMap::new();
        let mut rollup_owner = None;
        let mut proxy_admin_owner = None;
        let mut upgrade_executor_roles = None;
        let mut native_token = None;
        let mut stake_token = None;
        for outcome in outcomes {
            match outcome {
                ReadOutcome::Admin(role, admin) => {
                    admins.insert(role, admin);
                }
                ReadOutcome::RollupOwner(owner) => rollup_owner = Some(owner),
                ReadOutcome::ProxyAdminOwner(owner) => proxy_admin_owner = Some(owner),
                ReadOutcome::ExecutorRoles(grants) => upgrade_executor_roles = Some(grants),
                ReadOutcome::NativeToken(status) => native_token = Some(status),
                ReadOutcome::StakeToken(status) => stake_token = Some(status),
            }
        }

        GovernanceGraph {
            rollup,
            provenance,
            binding,
            admins,
            rollup_owner: rollup_owner
                .unwrap_or_else(|| Err(AuditError::not_found(format!("owner() of {rollup}")))),
            proxy_admin_owner,
            upgrade_executor_roles,
            native_token,
            stake_token: stake_token
                .unwrap_or_else(|| Err(AuditError::not_found(format!("stakeToken() of {rollup}")))),
        }
    }

    /// Resolves how `rollup` was deployed.
    pub async fn resolve_deployment_provenance(
        &self,
        rollup: Address,
    ) -> AuditResult<DeploymentProvenance> {
        DeploymentProvenance::resolve(self.client, rollup, self.config.block_range()).await
    }

    /// Overrides satellite addresses with what the rollup currently reports.
    ///
    /// A failing read keeps the address announced at creation. A zero address unbinds the role.
    async fn bind_live_satellites(&self, rollup: Address, binding: &mut AddressBinding) {
        let live: Vec<_> = stream::iter(ContractRole::SATELLITES)
            .map(|role| async move { (role, self.read_satellite(rollup, role).await) })
            .buffered(self.config.concurrency())
            .collect()
            .await;

        for (role, read) in live {
            match read {
                Ok(address) if address.is_zero() => {
                    if let Some(announced) = binding.remove(role) {
                        warn!(
                            target: "graph",
                            %role,
                            %announced,
                            "Rollup reports a zero address, unbinding creation address"
                        );
                    }
                }
                Ok(address) => {
                    let announced = binding.get(role);
                    if announced.is_some_and(|announced| announced != address) {
                        info!(
                            target: "graph",
                            %role,
                            %address,
                            "Satellite was replaced after creation"
                        );
                    }
                    binding.insert(role, address);
                }
                Err(err) => {
                    warn!(
                        target: "graph",
                        %role,
                        %err,
                        "Live satellite read failed, using creation address"
                    );
                }
            }
        }
    }

    async fn read_satellite(&self, rollup: Address, role: ContractRole) -> AuditResult<Address> {
        match role {
            ContractRole::Bridge => self.read_address(rollup, IRollupCore::bridgeCall {}).await,
            ContractRole::Inbox => self.read_address(rollup, IRollupCore::inboxCall {}).await,
            ContractRole::SequencerInbox => {
                self.read_address(rollup, IRollupCore::sequencerInboxCall {}).await
            }
            ContractRole::Outbox => self.read_address(rollup, IRollupCore::outboxCall {}).await,
            other => Err(AuditError::not_found(format!("live getter for {other}"))),
        }
    }

    /// The reads of the second phase, in a fixed order.
    fn live_reads(
        rollup: Address,
        binding: &AddressBinding,
        native_token: Option<Address>,
    ) -> Vec<LiveRead> {
        let mut reads: Vec<_> = ContractRole::PROXIES
            .into_iter()
            .filter_map(|role| binding.get(role).map(|address| LiveRead::Admin(role, address)))
            .collect();
        reads.push(LiveRead::RollupOwner(rollup));
        reads.extend(binding.get(ContractRole::ProxyAdmin).map(LiveRead::ProxyAdminOwner));
        reads.extend(binding.get(ContractRole::UpgradeExecutor).map(LiveRead::ExecutorRoles));
        reads.extend(native_token.map(LiveRead::NativeToken));
        reads.push(LiveRead::StakeToken(rollup));
        reads
    }

    async fn perform(&self, read: LiveRead) -> ReadOutcome {
        match read {
            LiveRead::Admin(role, address) => {
                ReadOutcome::Admin(role, admin_of(self.client, address).await)
            }
            LiveRead::RollupOwner(rollup) => ReadOutcome::RollupOwner(self.owner_of(rollup).await),
            LiveRead::ProxyAdminOwner(proxy_admin) => {
                ReadOutcome::ProxyAdminOwner(self.owner_of(proxy_admin).await)
            }
            LiveRead::ExecutorRoles(executor) => ReadOutcome::ExecutorRoles(
                role_grants_of(self.client, executor, self.config.block_range()).await,
            ),
            LiveRead::NativeToken(token) => ReadOutcome::NativeToken(self.token_status(token).await),
            LiveRead::StakeToken(rollup) => ReadOutcome::StakeToken(self.stake_token(rollup).await),
        }
    }

    async fn read_address<S>(&self, to: Address, call: S) -> AuditResult<Address>
    where
        S: SolCall<Return = Address>,
    {
        read_contract(self.client, to, call)
            .await
            .map_err(|err| AuditError::call(format!("{} on {to}", S::SIGNATURE), err))
    }

    async fn owner_of(&self, contract: Address) -> AuditResult<Address> {
        self.read_address(contract, IOwnable::ownerCall {}).await
    }

    async fn stake_token(&self, rollup: Address) -> AuditResult<TokenStatus> {
        let token = self.read_address(rollup, IRollupCore::stakeTokenCall {}).await?;
        Ok(self.token_status(token).await)
    }

    async fn token_status(&self, address: Address) -> TokenStatus {
        if address.is_zero() {
            return TokenStatus { address, code: CodePresence::NotApplicable };
        }

        let code = match self.client.get_code(address).await {
            Ok(code) if code.is_empty() => CodePresence::Missing,
            Ok(_) => CodePresence::Present,
            Err(err) => CodePresence::Unknown(AuditError::call(format!("code of {address}"), err)),
        };
        TokenStatus { address, code }
    }
}
