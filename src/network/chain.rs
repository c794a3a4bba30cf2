//! Supported networks
//!
//! Maps a network identifier (name or chain id) onto the node provider and
//! Safe transaction service endpoints for that network.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Network resolution errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Unsupported network: {0}")]
    Unsupported(String),
    #[error("Invalid node URL {0}")]
    InvalidUrl(String),
}

/// A network the toolkit can administer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Rinkeby,
}

impl Network {
    /// All supported networks
    pub const ALL: [Network; 2] = [Network::Mainnet, Network::Rinkeby];

    /// Resolve a network from its chain id
    pub fn from_chain_id(chain_id: u64) -> Result<Self, NetworkError> {
        Self::ALL
            .into_iter()
            .find(|n| n.chain_id() == chain_id)
            .ok_or_else(|| NetworkError::Unsupported(chain_id.to_string()))
    }

    /// EIP-155 chain id
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Rinkeby => 4,
        }
    }

    /// Network name as used in deployment records
    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Rinkeby => "rinkeby",
        }
    }

    /// Node provider endpoint for this network
    pub fn node_url(&self, api_key: &str) -> String {
        format!("https://eth-{}.alchemyapi.io/v2/{}", self.name(), api_key)
    }

    /// Safe transaction service base URL
    pub fn safe_service_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://safe-transaction.gnosis.io/",
            Network::Rinkeby => "https://safe-transaction.rinkeby.gnosis.io/",
        }
    }
}

impl FromStr for Network {
    type Err = NetworkError;

    /// Accepts a network name (case-insensitive) or a decimal chain id
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(chain_id) = s.parse::<u64>() {
            return Self::from_chain_id(chain_id);
        }

        Self::ALL
            .into_iter()
            .find(|n| n.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| NetworkError::Unsupported(s.to_string()))
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.chain_id())
    }
}
