//! Audit configuration.

use crate::BlockRange;
use alloy_primitives::B256;
use orbit_abi::NULL_KEYSET_HASH;
use serde::{Deserialize, Serialize};

/// Default number of reads issued concurrently within one phase.
pub const DEFAULT_MAX_CONCURRENT_READS: usize = 4;

/// Roughly 24 hours of Ethereum blocks at 12.5 seconds per block.
pub const DEFAULT_ACTIVITY_WINDOW_BLOCKS: u64 = 6_912;

/// Tunables of a single audit run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    /// Upper bound on reads in flight within one phase.
    pub max_concurrent_reads: usize,
    /// First block scanned for historical events.
    pub from_block: u64,
    /// Last block scanned for historical events, the chain head when unset.
    pub to_block: Option<u64>,
    /// Keyset hashes treated as publicly known, on top of the built-in null keyset.
    pub null_keyset_hashes: Vec<B256>,
    /// Rollup discovery settings.
    pub discovery: DiscoveryConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_concurrent_reads: DEFAULT_MAX_CONCURRENT_READS,
            from_block: 0,
            to_block: None,
            null_keyset_hashes: Vec::new(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl AuditConfig {
    /// The block range scanned for historical events.
    pub const fn block_range(&self) -> BlockRange {
        BlockRange { from: self.from_block, to: self.to_block }
    }

    /// The fan-out of a read phase, never zero.
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_reads.max(1)
    }

    /// Returns `true` if `hash` identifies a keyset whose signing keys are public.
    pub fn is_null_keyset(&self, hash: &B256) -> bool {
        *hash == *NULL_KEYSET_HASH || self.null_keyset_hashes.contains(hash)
    }
}

/// Settings of [`RollupDiscovery`](crate::RollupDiscovery).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// How many recent blocks are searched for batch deliveries.
    pub activity_window_blocks: u64,
    /// Report rollups without recent batches too.
    pub include_inactive: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self { activity_window_blocks: DEFAULT_ACTIVITY_WINDOW_BLOCKS, include_inactive: false }
    }
}
