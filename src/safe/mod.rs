//! Safe multi-signature wallet support
//!
//! A Safe is an on-chain account that executes a transaction only once M of
//! its N owners have signed the transaction hash. Signatures are collected
//! off chain by the Safe transaction service.
//!
//! # Example
//!
//! ```ignore
//! use cryptoart_admin::safe::{SafeSignature, SafeTransaction, SafeTransactionData};
//!
//! let data = SafeTransactionData::call(safe, target, call_data, safe_tx_gas, nonce);
//! let mut tx = SafeTransaction::new(safe, chain_id, data, threshold);
//!
//! let local = SafeSignature::sign(&key_pair, &tx.safe_tx_hash())?;
//! tx.add_signature(local, &owners)?;
//!
//! // ... attach remote confirmations, then
//! let exec_call_data = tx.finalize()?;
//! ```

pub mod contract;
pub mod service;
pub mod signature;
pub mod transaction;

pub use contract::{
    contract_owner, encode_transfer_ownership, safe_nonce, safe_owners, safe_threshold, IOwnable,
    ISafe, SafeTx, SAFE_TX_TYPEHASH,
};
pub use service::{
    hex_prefixed, Confirmation, ConfirmationList, EstimateRequest, EstimateResponse,
    HttpSafeService, MultisigTransaction, Page, ProposeRequest, SafeService, ServiceError,
};
pub use signature::{SafeSignature, SignatureKind, SIGNATURE_LENGTH};
pub use transaction::{
    ProposalStatus, SafeError, SafeTransaction, SafeTransactionData, DEFAULT_BASE_GAS,
    OPERATION_CALL,
};
