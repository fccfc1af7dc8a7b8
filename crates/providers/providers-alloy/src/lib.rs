//! An [`alloy_provider::RootProvider`] backed [`ChainClient`](orbit_governance::ChainClient).
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

mod retry;
pub use retry::RetryConfig;

mod chain_client;
pub use chain_client::{AlloyChainClient, log_filter};
