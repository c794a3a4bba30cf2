//! Network/session bootstrap
//!
//! Resolves a network identifier into a node connection and a signing
//! identity. Bootstrap performs no I/O; an unsupported identifier fails
//! before any connection is attempted.

use alloy_primitives::{Address, Bytes, B256, U256};
use thiserror::Error;

use crate::config::AdminConfig;
use crate::crypto::{KeyError, KeyPair};
use crate::network::chain::{Network, NetworkError};
use crate::network::rpc::{HttpNodeClient, NodeClient, RpcError};
use crate::network::transaction::{LegacyTransaction, TransactionError};

/// Errors while broadcasting from the session account
#[derive(Error, Debug)]
pub enum SendError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
    #[error("Signing error: {0}")]
    Key(#[from] KeyError),
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),
    #[error("Node is connected to chain {actual}, expected {expected}")]
    ChainMismatch { expected: u64, actual: u64 },
}

/// A network handle plus the identity that signs on it
pub struct Session<C = HttpNodeClient> {
    network: Network,
    signer: KeyPair,
    node: C,
}

impl Session<HttpNodeClient> {
    /// Resolve `network_id` (name or chain id) against the configured provider
    pub fn bootstrap(network_id: &str, config: &AdminConfig) -> Result<Self, NetworkError> {
        let network: Network = network_id.parse()?;
        let node = HttpNodeClient::new(network.node_url(&config.node_api_key))?;
        log::info!("Using {} as {}", network, config.signer.address());
        Ok(Self::with_client(network, config.signer.clone(), node))
    }
}

impl<C: NodeClient> Session<C> {
    /// Build a session from parts
    pub fn with_client(network: Network, signer: KeyPair, node: C) -> Self {
        Self {
            network,
            signer,
            node,
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn signer(&self) -> &KeyPair {
        &self.signer
    }

    /// Address of the signing identity
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn node(&self) -> &C {
        &self.node
    }

    /// Fail if the node serves a different chain than the session network
    pub async fn ensure_chain(&self) -> Result<(), SendError> {
        let actual = self.node.chain_id().await?;
        let expected = self.network.chain_id();
        if actual != expected {
            return Err(SendError::ChainMismatch { expected, actual });
        }
        Ok(())
    }

    /// Sign and broadcast a zero-value call from the session account
    ///
    /// Gas limit comes from `eth_estimateGas`, the nonce from the pending
    /// transaction count. Returns the transaction hash.
    pub async fn send_call(
        &self,
        to: Address,
        data: Bytes,
        gas_price: U256,
    ) -> Result<B256, SendError> {
        let from = self.address();
        let gas_limit = self.node.estimate_gas(from, to, &data).await?;
        let nonce = self.node.transaction_count(from).await?;

        let tx = LegacyTransaction {
            nonce,
            gas_price,
            gas_limit,
            to,
            value: U256::ZERO,
            data,
            chain_id: self.network.chain_id(),
        };
        log::debug!("Signing {:?}", tx);

        let signed = tx.sign(&self.signer.local_signer()?)?;
        let hash = self.node.send_raw_transaction(&signed.raw).await?;
        if hash != signed.hash {
            log::warn!("Node reported hash {} for local hash {}", hash, signed.hash);
        }
        log::info!("Broadcast transaction {} (nonce {}, gas {})", hash, nonce, gas_limit);

        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigSource;

    fn config() -> AdminConfig {
        AdminConfig::validate(ConfigSource {
            private_key: Some(
                "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string(),
            ),
            alchemy_key: Some("key".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_bootstrap_supported_network() {
        let session = Session::bootstrap("rinkeby", &config()).unwrap();
        assert_eq!(session.network(), Network::Rinkeby);
        assert_eq!(
            session.node().url(),
            "https://eth-rinkeby.alchemyapi.io/v2/key"
        );
        assert_eq!(session.address(), config().signer.address());
    }

    #[test]
    fn test_bootstrap_rejects_unknown_network() {
        let result = Session::bootstrap("137", &config());
        assert!(matches!(result, Err(NetworkError::Unsupported(id)) if id == "137"));
    }
}
