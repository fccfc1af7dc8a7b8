//! Solidity bindings and well-known constants for the contracts that make up an Arbitrum Orbit
//! rollup deployment.
//!
//! Factory bindings exist in more than one historical shape. Each shape lives in its own
//! interface module so that both can be decoded side by side:
//!
//! - [`RollupCreatorCanonical`]: current factory, emits the native token and upgrade executor.
//! - [`RollupCreatorLegacy`]: original factory, neither field exists.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod rollup_creator;
pub use rollup_creator::{RollupCreatorCanonical, RollupCreatorLegacy};

mod rollup;
pub use rollup::{IOwnable, IRollupCore};

mod access_control;
pub use access_control::IAccessControl;

mod sequencer_inbox;
pub use sequencer_inbox::{IBridge, ISequencerInbox};

mod constants;
pub use constants::{
    ADMIN_ROLE, DEFAULT_ADMIN_ROLE, EXECUTOR_ROLE, NULL_KEYSET, NULL_KEYSET_HASH,
    PROXY_ADMIN_SLOT, ROLE_NAMES, keyset_hash, role_name,
};
