//! Deployment record and Safe address book
//!
//! Reads the contract addresses exported by hardhat-deploy and the per-network
//! Safe addresses kept alongside them.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufReader};
use std::path::Path;
use thiserror::Error;

/// Name the administered contract is deployed under
pub const CRYPTOART_CONTRACT: &str = "CryptoArt";

/// Deployment lookup errors
#[derive(Error, Debug)]
pub enum DeploymentError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("No deployment for chain {0}")]
    ChainNotFound(u64),
    #[error("Contract {name} not deployed on chain {chain_id}")]
    ContractNotFound { chain_id: u64, name: String },
    #[error("No Safe configured for network {0}")]
    SafeNotFound(String),
}

/// A deployed contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractDeployment {
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<Value>,
}

/// Contracts deployed on one named network
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDeployment {
    pub name: String,
    pub chain_id: String,
    #[serde(default)]
    pub contracts: BTreeMap<String, ContractDeployment>,
}

/// Resolved contract location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    pub network_name: String,
    pub address: Address,
}

/// `deployments.json`, keyed by chain id then network name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeploymentRecord {
    chains: BTreeMap<String, BTreeMap<String, NetworkDeployment>>,
}

impl DeploymentRecord {
    /// Load the record from disk
    pub fn load(path: &Path) -> Result<Self, DeploymentError> {
        let file = fs::File::open(path)?;
        let record = serde_json::from_reader(BufReader::new(file))?;
        Ok(record)
    }

    /// Locate `name` on `chain_id`
    ///
    /// When several network entries share a chain id the first one (by name)
    /// is used.
    pub fn contract(&self, chain_id: u64, name: &str) -> Result<DeployedContract, DeploymentError> {
        let networks = self
            .chains
            .get(&chain_id.to_string())
            .ok_or(DeploymentError::ChainNotFound(chain_id))?;
        let (network_name, deployment) = networks
            .iter()
            .next()
            .ok_or(DeploymentError::ChainNotFound(chain_id))?;

        let contract = deployment
            .contracts
            .get(name)
            .ok_or_else(|| DeploymentError::ContractNotFound {
                chain_id,
                name: name.to_string(),
            })?;

        Ok(DeployedContract {
            network_name: network_name.clone(),
            address: contract.address,
        })
    }
}

/// `config.json`: the Safe that administers the contract on each network
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeConfig {
    #[serde(default)]
    pub gnosis_safe_address: BTreeMap<String, Address>,
}

impl SafeConfig {
    pub fn load(path: &Path) -> Result<Self, DeploymentError> {
        let file = fs::File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn safe_address(&self, network_name: &str) -> Result<Address, DeploymentError> {
        self.gnosis_safe_address
            .get(network_name)
            .copied()
            .ok_or_else(|| DeploymentError::SafeNotFound(network_name.to_string()))
    }
}
