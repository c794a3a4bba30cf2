//! Runtime configuration
//!
//! Secrets and endpoints are collected once at process entry, validated, and
//! passed explicitly into every workflow call.

use crate::crypto::{key_pair_from_mnemonic, KeyError, KeyPair, DEFAULT_DERIVATION_PATH};
use crate::workflow::PollPolicy;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default delay between remote status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Please set your {0}")]
    Missing(&'static str),
    #[error("Invalid signing key: {0}")]
    InvalidSigner(#[from] KeyError),
}

/// Raw, unvalidated values as read from flags or the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    pub private_key: Option<String>,
    pub mnemonic: Option<String>,
    pub alchemy_key: Option<String>,
    pub deployments_path: Option<PathBuf>,
    pub safe_config_path: Option<PathBuf>,
    pub poll_interval: Option<Duration>,
    pub max_polls: Option<u32>,
    pub allow_nonce_reuse: bool,
}

/// Validated configuration
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Signing identity
    pub signer: KeyPair,
    /// Node provider API key
    pub node_api_key: String,
    /// hardhat-deploy export of deployed contracts
    pub deployments_path: PathBuf,
    /// Safe address book
    pub safe_config_path: PathBuf,
    pub poll_interval: Duration,
    /// `None` waits forever
    pub max_polls: Option<u32>,
    /// Continue when another pending proposal already uses the Safe nonce
    pub allow_nonce_reuse: bool,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AdminConfig {
    /// Validate raw values, failing on the first missing requirement
    ///
    /// A private key takes precedence over a mnemonic when both are set.
    pub fn validate(source: ConfigSource) -> Result<Self, ConfigError> {
        let signer = match (non_empty(source.private_key), non_empty(source.mnemonic)) {
            (Some(key), _) => KeyPair::from_private_key_hex(&key)?,
            (None, Some(phrase)) => key_pair_from_mnemonic(&phrase, DEFAULT_DERIVATION_PATH)?,
            (None, None) => return Err(ConfigError::Missing("PRIVATE_KEY or MNEMONIC")),
        };

        let node_api_key =
            non_empty(source.alchemy_key).ok_or(ConfigError::Missing("ALCHEMY_KEY"))?;

        Ok(Self {
            signer,
            node_api_key,
            deployments_path: source
                .deployments_path
                .unwrap_or_else(|| PathBuf::from("deployments.json")),
            safe_config_path: source
                .safe_config_path
                .unwrap_or_else(|| PathBuf::from("config.json")),
            poll_interval: source.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            max_polls: source.max_polls,
            allow_nonce_reuse: source.allow_nonce_reuse,
        })
    }

    /// Poll policy for the confirmation and execution waits
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(self.poll_interval).with_max_attempts(self.max_polls)
    }
}
