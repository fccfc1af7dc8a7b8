//! Contains the [`AlloyChainClient`].

use crate::RetryConfig;
use alloy_consensus::Transaction;
use alloy_eips::BlockNumberOrTag;
use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types_eth::{Filter, Log, TransactionRequest};
use alloy_transport::{RpcError, TransportError, TransportResult};
use async_trait::async_trait;
use backon::Retryable;
use orbit_governance::{ChainClient, ChainClientError, LogQuery, ReceiptLogs};
use std::future::{Future, IntoFuture};
use url::Url;

/// Builds the `eth_getLogs` filter for a [`LogQuery`].
pub fn log_filter(query: &LogQuery) -> Filter {
    let to_block = query.range.to.map_or(BlockNumberOrTag::Latest, BlockNumberOrTag::Number);
    let filter = Filter::new()
        .event_signature(query.topic0)
        .from_block(BlockNumberOrTag::Number(query.range.from))
        .to_block(to_block);
    match query.address {
        Some(address) => filter.address(address),
        None => filter,
    }
}

/// A [`ChainClient`] over an alloy [`RootProvider`], retrying transport failures.
#[derive(Debug, Clone)]
pub struct AlloyChainClient {
    /// The parent chain provider.
    provider: RootProvider,
    /// The retry policy.
    retry: RetryConfig,
}

impl AlloyChainClient {
    /// Creates a client over an existing provider.
    pub const fn new(provider: RootProvider, retry: RetryConfig) -> Self {
        Self { provider, retry }
    }

    /// Creates a client speaking HTTP JSON-RPC to `url`.
    pub fn new_http(url: Url, retry: RetryConfig) -> Self {
        Self::new(RootProvider::new_http(url), retry)
    }

    /// Returns the inner provider.
    pub const fn provider(&self) -> &RootProvider {
        &self.provider
    }

    async fn request<T, F, Fut>(&self, method: &'static str, request: F) -> TransportResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        request
            .retry(self.retry.backoff())
            .when(|err: &TransportError| matches!(err, RpcError::Transport(_)))
            .notify(|err, delay| {
                warn!(target: "provider", method, %err, ?delay, "Retrying RPC request");
            })
            .await
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, ChainClientError> {
        let request = TransactionRequest::default().with_to(to).with_input(input);
        self.request("eth_call", || self.provider.call(request.clone()).into_future())
            .await
            .map_err(ChainClientError::transport)
    }

    async fn get_logs(&self, query: LogQuery) -> Result<Vec<Log>, ChainClientError> {
        let filter = log_filter(&query);
        let logs = self
            .request("eth_getLogs", || self.provider.get_logs(&filter))
            .await
            .map_err(ChainClientError::transport)?;
        debug!(
            target: "provider",
            topic0 = %query.topic0,
            address = ?query.address,
            logs = logs.len(),
            "Fetched logs"
        );
        Ok(logs)
    }

    async fn get_transaction_receipt(&self, hash: B256) -> Result<ReceiptLogs, ChainClientError> {
        let receipt = self
            .request("eth_getTransactionReceipt", || self.provider.get_transaction_receipt(hash))
            .await
            .map_err(ChainClientError::transport)?
            .ok_or(ChainClientError::MissingReceipt(hash))?;
        Ok(ReceiptLogs { to: receipt.to, logs: receipt.inner.logs().to_vec() })
    }

    async fn get_transaction_input(&self, hash: B256) -> Result<Bytes, ChainClientError> {
        let transaction = self
            .request("eth_getTransactionByHash", || self.provider.get_transaction_by_hash(hash))
            .await
            .map_err(ChainClientError::transport)?
            .ok_or(ChainClientError::MissingTransaction(hash))?;
        Ok(transaction.input().clone())
    }

    async fn get_storage_at(
        &self,
        address: Address,
        slot: B256,
    ) -> Result<B256, ChainClientError> {
        let slot = U256::from_be_bytes(slot.0);
        let word = self
            .request("eth_getStorageAt", || {
                self.provider.get_storage_at(address, slot).into_future()
            })
            .await
            .map_err(ChainClientError::transport)?;
        Ok(B256::from(word))
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, ChainClientError> {
        self.request("eth_getCode", || self.provider.get_code_at(address).into_future())
            .await
            .map_err(ChainClientError::transport)
    }

    async fn block_number(&self) -> Result<u64, ChainClientError> {
        self.request("eth_blockNumber", || self.provider.get_block_number().into_future())
            .await
            .map_err(ChainClientError::transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbit_governance::BlockRange;
    use rstest::rstest;

    #[rstest]
    #[case::open_range(BlockRange { from: 0, to: None }, BlockNumberOrTag::Latest)]
    #[case::bounded_range(BlockRange { from: 10, to: Some(20) }, BlockNumberOrTag::Number(20))]
    fn test_log_filter_range(#[case] range: BlockRange, #[case] to: BlockNumberOrTag) {
        let filter = log_filter(&LogQuery::new(B256::repeat_byte(0x01)).range(range));
        assert_eq!(filter.get_from_block(), Some(range.from));
        assert_eq!(filter.block_option.get_to_block(), Some(&to));
    }

    #[test]
    fn test_log_filter_address_and_topic() {
        let address = Address::repeat_byte(0x02);
        let topic = B256::repeat_byte(0x01);
        let filter = log_filter(&LogQuery::new(topic).address(address));

        assert!(filter.address.matches(&address));
        assert!(!filter.address.matches(&Address::repeat_byte(0x03)));
        assert!(filter.topics[0].matches(&topic));
    }

    #[test]
    fn test_any_address_filter() {
        let filter = log_filter(&LogQuery::new(B256::repeat_byte(0x01)));
        assert!(filter.address.is_empty());
    }
}
