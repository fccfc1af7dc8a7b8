//! Governance topology verification for Arbitrum Orbit rollups.
//!
//! Given a rollup address this crate reconstructs how the chain was deployed, which contracts
//! hold ownership and upgrade power over it, and whether that power structure matches the
//! expected pattern:
//!
//! - [`GovernanceGraphBuilder`]: resolves deployment provenance and reads the admin/owner graph.
//! - [`InvariantVerifier`]: walks the graph and emits [`Finding`]s.
//! - [`DataAvailabilityValidator`]: validates committee keysets of AnyTrust chains.
//! - [`RollupDiscovery`]: enumerates the rollups deployed on a parent chain.
//!
//! All chain access goes through the [`ChainClient`] trait. Nothing in this crate retries,
//! times out, or aborts on a single failed read: failures degrade the dependent check into a
//! skipped [`Finding`].
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

mod errors;
pub use errors::{AuditError, AuditResult, ChainClientError};

mod traits;
pub use traits::{BlockRange, ChainClient, LogQuery, ReceiptLogs, read_contract};

mod config;
pub use config::{AuditConfig, DiscoveryConfig};

mod types;
pub use types::{AddressBinding, ContractRole};

pub mod resolver;
pub use resolver::{
    ArbitrumChainParams, CallSchema, ChainConfig, CreateRollupSchema, CreationParams, Decoded,
    EventSchema, LogPosition, Resolution, RollupCreatedRecord, RollupCreatedSchema,
};

pub mod graph;
pub use graph::{
    CodePresence, DeploymentProvenance, GovernanceGraph, GovernanceGraphBuilder, RoleEvent,
    RoleEventKind, RoleGrants, RollupInitialization, TokenStatus,
};

mod finding;
pub use finding::{Finding, FindingCategory, Severity};

mod verifier;
pub use verifier::InvariantVerifier;

mod das;
pub use das::{DataAvailabilityValidator, KeysetAnnouncements, KeysetStatus, KeysetValidity};

mod discovery;
pub use discovery::{DiscoveredRollup, RollupDiscovery, discover_rollups};

mod audit;
pub use audit::{GovernanceReport, ReportSummary, verify_rollup_governance};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
