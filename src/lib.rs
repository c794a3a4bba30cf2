//! CryptoArt admin: administration toolkit for the CryptoArt contract
//!
//! This crate provides:
//! - Signer resolution from a private key or mnemonic
//! - A JSON-RPC node client with EIP-155 transaction signing
//! - Safe transaction hashing, signature packing and `execTransaction` encoding
//! - A client for the Safe transaction service
//! - Propose, confirm and execute workflows with bounded polling
//!
//! # Example
//!
//! ```ignore
//! use cryptoart_admin::config::{AdminConfig, ConfigSource};
//! use cryptoart_admin::network::Session;
//! use cryptoart_admin::safe::{encode_transfer_ownership, HttpSafeService};
//! use cryptoart_admin::workflow::MultisigWorkflow;
//!
//! let config = AdminConfig::validate(source)?;
//! let session = Session::bootstrap("rinkeby", &config)?;
//! let service = HttpSafeService::new(session.network().safe_service_url());
//!
//! let data = encode_transfer_ownership(session.address());
//! let outcome = MultisigWorkflow::new(&session, &service, config.poll_policy())
//!     .run(safe, contract, data)
//!     .await?;
//! println!("Executed: {:?}", outcome.execution);
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod deployment;
pub mod network;
pub mod safe;
pub mod workflow;

// Re-export commonly used types
pub use config::{AdminConfig, ConfigError, ConfigSource};
pub use crypto::KeyPair;
pub use deployment::{DeploymentRecord, SafeConfig};
pub use network::{Network, Session};
pub use safe::{HttpSafeService, SafeSignature, SafeTransaction};
pub use workflow::{MultisigWorkflow, WorkflowError, WorkflowOutcome};
