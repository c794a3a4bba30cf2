//! Ethereum network access
//!
//! Provides the pieces needed to talk to a node on a supported network.
//!
//! # Features
//! - Supported network resolution (name or chain id)
//! - Node client over an alloy HTTP provider
//! - EIP-155 legacy transaction signing
//! - Session bootstrap from validated configuration

pub mod chain;
pub mod rpc;
pub mod session;
pub mod transaction;

pub use chain::{Network, NetworkError};
pub use rpc::{parse_quantity, HttpNodeClient, NodeClient, RpcError, TransactionReceipt};
pub use session::{SendError, Session};
pub use transaction::{LegacyTransaction, SignedTransaction, TransactionError};
