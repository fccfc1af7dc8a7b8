//! Error types for the governance audit.

use alloy_primitives::B256;
use core::error;
use thiserror::Error;

/// Failures reported by a [`ChainClient`](crate::ChainClient).
#[derive(Debug, Error)]
pub enum ChainClientError {
    /// The transport failed or the node rejected the request.
    #[error("transport error: {0}")]
    Transport(Box<dyn error::Error + Send + Sync>),
    /// The returned data does not match the expected ABI.
    #[error("abi error: {0}")]
    Abi(#[from] alloy_sol_types::Error),
    /// The node does not know the transaction.
    #[error("transaction {0} not found")]
    MissingTransaction(B256),
    /// The node has no receipt for the transaction.
    #[error("receipt for transaction {0} not found")]
    MissingReceipt(B256),
}

impl ChainClientError {
    /// Returns a new instance of the [`Transport`](Self::Transport) variant.
    pub fn transport(err: impl error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(err))
    }
}

/// A fact about the deployment that could not be established.
///
/// None of these are fatal. Each one is attached to the part of the
/// [`GovernanceGraph`](crate::GovernanceGraph) it prevented from resolving.
#[derive(Debug, Error)]
pub enum AuditError {
    /// An event or transaction that should exist was never observed.
    #[error("{0} not found")]
    NotFound(String),
    /// Data matched a known topic or selector but no schema variant could decode it.
    #[error("{what} could not be decoded: {}", .failures.join("; "))]
    Decode {
        /// What was being decoded.
        what: String,
        /// One entry per attempted schema variant.
        failures: Vec<String>,
    },
    /// A live read failed or reverted.
    #[error("{what} failed: {source}")]
    Call {
        /// The read that failed.
        what: String,
        /// The underlying client error.
        source: ChainClientError,
    },
}

impl AuditError {
    /// Returns a new instance of the [`NotFound`](Self::NotFound) variant.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Returns a new instance of the [`Decode`](Self::Decode) variant.
    pub fn decode(what: impl Into<String>, failures: Vec<String>) -> Self {
        Self::Decode { what: what.into(), failures }
    }

    /// Returns a new instance of the [`Call`](Self::Call) variant.
    pub fn call(what: impl Into<String>, source: ChainClientError) -> Self {
        Self::Call { what: what.into(), source }
    }
}

/// Type alias for audit results.
pub type AuditResult<T> = Result<T, AuditError>;
