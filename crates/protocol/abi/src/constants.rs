//! Well-known slots, role identifiers and keysets.

use alloy_primitives::{B256, b256, keccak256};
use std::collections::HashMap;

/// The EIP-1967 admin slot of a transparent upgradeable proxy.
/// Computed as: `bytes32(uint256(keccak256("eip1967.proxy.admin")) - 1)`
pub const PROXY_ADMIN_SLOT: B256 =
    b256!("0xb53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103");

/// The `AccessControl` default admin role.
pub const DEFAULT_ADMIN_ROLE: B256 = B256::ZERO;

lazy_static::lazy_static! {
    /// `keccak256("ADMIN_ROLE")`, the role allowed to manage `UpgradeExecutor` roles.
    pub static ref ADMIN_ROLE: B256 = keccak256("ADMIN_ROLE");

    /// `keccak256("EXECUTOR_ROLE")`, the role allowed to execute upgrades.
    pub static ref EXECUTOR_ROLE: B256 = keccak256("EXECUTOR_ROLE");

    /// Human readable names of the roles an `UpgradeExecutor` is known to use.
    pub static ref ROLE_NAMES: HashMap<B256, &'static str> = {
        let mut names = HashMap::new();
        names.insert(DEFAULT_ADMIN_ROLE, "DEFAULT_ADMIN_ROLE");
        names.insert(*ADMIN_ROLE, "ADMIN_ROLE");
        names.insert(*EXECUTOR_ROLE, "EXECUTOR_ROLE");
        names
    };

    /// The placeholder keyset shipped with the Orbit deployment tooling: one assumed-honest
    /// member holding an all-zero BLS public key. Anyone can sign for it.
    pub static ref NULL_KEYSET: Vec<u8> = {
        let mut keyset = Vec::with_capacity(307);
        keyset.extend_from_slice(&1u64.to_be_bytes());
        keyset.extend_from_slice(&1u64.to_be_bytes());
        keyset.extend_from_slice(&0x0121u16.to_be_bytes());
        keyset.push(0x60);
        keyset.resize(307, 0);
        keyset
    };

    /// Hash of [`struct@NULL_KEYSET`] as registered on the sequencer inbox.
    pub static ref NULL_KEYSET_HASH: B256 = keyset_hash(&NULL_KEYSET);
}

/// Returns the name of a well-known role.
pub fn role_name(role: &B256) -> Option<&'static str> {
    ROLE_NAMES.get(role).copied()
}

/// Computes the hash the sequencer inbox assigns to a keyset:
/// `keccak256(0xfe ++ keccak256(keyset)) ^ (1 << 255)`.
pub fn keyset_hash(keyset: &[u8]) -> B256 {
    let inner = keccak256(keyset);
    let mut preimage = [0u8; 33];
    preimage[0] = 0xfe;
    preimage[1..].copy_from_slice(inner.as_slice());

    let mut hash = keccak256(preimage);
    hash.0[0] ^= 0x80;
    hash
}
