//! Contract roles and the address binding of a deployment.

use alloy_primitives::Address;
use derive_more::Display;
use serde::Serialize;
use std::collections::BTreeMap;

/// A contract in the governance topology of a rollup.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ContractRole {
    /// The rollup core contract.
    Rollup,
    /// The bridge holding deposited funds.
    Bridge,
    /// The delayed inbox.
    Inbox,
    /// The sequencer inbox receiving batches.
    SequencerInbox,
    /// The outbox executing withdrawals.
    Outbox,
    /// The proxy admin of the satellite contracts.
    ProxyAdmin,
    /// The access-controlled owner of the deployment.
    UpgradeExecutor,
}

impl ContractRole {
    /// Contracts whose admin must be the [`ProxyAdmin`](Self::ProxyAdmin).
    pub const SATELLITES: [Self; 4] = [Self::Bridge, Self::Inbox, Self::SequencerInbox, Self::Outbox];

    /// Contracts deployed behind an upgradeable proxy.
    pub const PROXIES: [Self; 5] =
        [Self::Rollup, Self::Bridge, Self::Inbox, Self::SequencerInbox, Self::Outbox];
}

/// The resolved address of each contract role.
///
/// The binding is partial: a role the matched schema version does not expose stays absent
/// instead of being bound to the zero address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AddressBinding(BTreeMap<ContractRole, Address>);

impl AddressBinding {
    /// Binds `role` to `address`. The zero address is never bound.
    pub fn insert(&mut self, role: ContractRole, address: Address) -> Option<Address> {
        if address.is_zero() {
            return None;
        }
        self.0.insert(role, address)
    }

    /// Unbinds `role`, returning its previous address.
    pub fn remove(&mut self, role: ContractRole) -> Option<Address> {
        self.0.remove(&role)
    }

    /// Returns the address bound to `role`.
    pub fn get(&self, role: ContractRole) -> Option<Address> {
        self.0.get(&role).copied()
    }

    /// Returns `true` if `role` is bound.
    pub fn contains(&self, role: ContractRole) -> bool {
        self.0.contains_key(&role)
    }

    /// Iterates the bound roles in [`ContractRole`] order.
    pub fn iter(&self) -> impl Iterator<Item = (ContractRole, Address)> + '_ {
        self.0.iter().map(|(role, address)| (*role, *address))
    }

    /// The number of bound roles.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
