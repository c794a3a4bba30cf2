//! Ethereum node access
//!
//! The workflow only needs a handful of node calls; they are expressed as the
//! [`NodeClient`] trait so the drivers can run against an in-memory node in tests.

use alloy_network::{ReceiptResponse, TransactionBuilder};
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types::TransactionRequest;
use alloy_transport::TransportError;
use alloy_transport_http::Http;
use serde_json::Value;
use thiserror::Error;

use crate::network::chain::NetworkError;

/// Node RPC errors
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Transport error: {0}")]
    TransportError(#[from] TransportError),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("Contract call decoding failed: {0}")]
    DecodeError(String),
}

/// Receipt of a mined transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    /// `false` when the transaction reverted
    pub status: bool,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status
    }
}

impl From<alloy_rpc_types::TransactionReceipt> for TransactionReceipt {
    fn from(receipt: alloy_rpc_types::TransactionReceipt) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            status: receipt.status(),
        }
    }
}

/// Node operations consumed by the workflow
#[allow(async_fn_in_trait)]
pub trait NodeClient {
    /// `eth_chainId`
    async fn chain_id(&self) -> Result<u64, RpcError>;

    /// `eth_call` against the latest block
    async fn call(&self, to: Address, data: &Bytes) -> Result<Bytes, RpcError>;

    /// `eth_gasPrice`, returned raw so the caller can validate it
    async fn gas_price(&self) -> Result<Option<String>, RpcError>;

    /// `eth_estimateGas`
    async fn estimate_gas(&self, from: Address, to: Address, data: &Bytes)
        -> Result<u64, RpcError>;

    /// `eth_getTransactionCount` at the pending block
    async fn transaction_count(&self, address: Address) -> Result<u64, RpcError>;

    /// `eth_sendRawTransaction`
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, RpcError>;

    /// `eth_getTransactionReceipt`; `None` until the transaction is mined
    async fn transaction_receipt(&self, hash: B256)
        -> Result<Option<TransactionReceipt>, RpcError>;
}

/// Node client over an alloy HTTP provider
pub struct HttpNodeClient {
    url: String,
    provider: RootProvider<Http<reqwest::Client>>,
}

impl HttpNodeClient {
    /// Create a client for the given endpoint; nothing is sent until the first call
    pub fn new(url: impl Into<String>) -> Result<Self, NetworkError> {
        let url: String = url.into();
        let parsed = url
            .parse::<reqwest::Url>()
            .map_err(|e| NetworkError::InvalidUrl(format!("{}: {}", url, e)))?;
        Ok(Self {
            url,
            provider: RootProvider::new_http(parsed),
        })
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

fn call_request(to: Address, data: &Bytes) -> TransactionRequest {
    TransactionRequest::default()
        .with_to(to)
        .with_input(data.clone())
}

impl NodeClient for HttpNodeClient {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn call(&self, to: Address, data: &Bytes) -> Result<Bytes, RpcError> {
        let request = call_request(to, data);
        Ok(self.provider.call(&request).await?)
    }

    async fn gas_price(&self) -> Result<Option<String>, RpcError> {
        let value: Value = self
            .provider
            .raw_request("eth_gasPrice".into(), ())
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn estimate_gas(
        &self,
        from: Address,
        to: Address,
        data: &Bytes,
    ) -> Result<u64, RpcError> {
        let request = call_request(to, data)
            .with_from(from)
            .with_value(U256::ZERO);
        Ok(self.provider.estimate_gas(&request).await?)
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, RpcError> {
        Ok(self.provider.get_transaction_count(address).pending().await?)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, RpcError> {
        let pending = self.provider.send_raw_transaction(raw).await?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, RpcError> {
        let receipt = self.provider.get_transaction_receipt(hash).await?;
        Ok(receipt.map(TransactionReceipt::from))
    }
}

/// Parse a hex (`0x`-prefixed) or decimal quantity
pub fn parse_quantity(s: &str) -> Option<U256> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some("") => None,
        Some(digits) => U256::from_str_radix(digits, 16).ok(),
        None if s.is_empty() => None,
        None => U256::from_str_radix(s, 10).ok(),
    }
}
