//! The chain access surface the audit depends on.

use crate::ChainClientError;
use alloy_primitives::{Address, B256, Bytes};
use alloy_rpc_types_eth::Log;
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use core::fmt::Debug;

/// An inclusive block range. An open upper bound means "latest".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockRange {
    /// First block to scan.
    pub from: u64,
    /// Last block to scan, `None` for the chain head.
    pub to: Option<u64>,
}

impl BlockRange {
    /// The whole chain history.
    pub const FULL: Self = Self { from: 0, to: None };

    /// Returns `true` if the block falls inside the range.
    pub fn contains(&self, block: u64) -> bool {
        block >= self.from && self.to.is_none_or(|to| block <= to)
    }
}

/// A log query for a single event topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    /// Emitting contract, `None` to match any address.
    pub address: Option<Address>,
    /// The event signature hash.
    pub topic0: B256,
    /// Blocks to scan.
    pub range: BlockRange,
}

impl LogQuery {
    /// Creates a query for `topic0` across every address and the whole history.
    pub const fn new(topic0: B256) -> Self {
        Self { address: None, topic0, range: BlockRange::FULL }
    }

    /// Restricts the query to logs emitted by `address`.
    pub const fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Restricts the query to `range`.
    pub const fn range(mut self, range: BlockRange) -> Self {
        self.range = range;
        self
    }
}

/// The parts of a transaction receipt the audit looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiptLogs {
    /// The called contract, `None` for contract creations.
    pub to: Option<Address>,
    /// Every log emitted by the transaction, in order.
    pub logs: Vec<Log>,
}

/// Read-only access to the parent chain of a rollup.
///
/// Implementations own transport concerns such as retries and rate limiting. Every method may
/// fail; callers degrade the dependent check instead of aborting.
#[async_trait]
pub trait ChainClient: Debug + Send + Sync {
    /// Executes an `eth_call` against `to` at the latest block.
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, ChainClientError>;

    /// Returns the logs matching `query`, ordered by block number then log index.
    async fn get_logs(&self, query: LogQuery) -> Result<Vec<Log>, ChainClientError>;

    /// Returns the receipt of a mined transaction.
    async fn get_transaction_receipt(&self, hash: B256) -> Result<ReceiptLogs, ChainClientError>;

    /// Returns the calldata of a transaction.
    async fn get_transaction_input(&self, hash: B256) -> Result<Bytes, ChainClientError>;

    /// Reads a raw storage word.
    async fn get_storage_at(&self, address: Address, slot: B256)
    -> Result<B256, ChainClientError>;

    /// Returns the deployed bytecode at `address`, empty for accounts without code.
    async fn get_code(&self, address: Address) -> Result<Bytes, ChainClientError>;

    /// Returns the current block number.
    async fn block_number(&self) -> Result<u64, ChainClientError>;
}

/// Calls a view function and decodes its return value.
pub async fn read_contract<C, S>(client: &C, to: Address, call: S) -> Result<S::Return, ChainClientError>
where
    C: ChainClient + ?Sized,
    S: SolCall,
{
    let output = client.call(to, call.abi_encode().into()).await?;
    Ok(S::abi_decode_returns(&output)?)
}
