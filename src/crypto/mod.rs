//! Cryptographic utilities for Ethereum accounts
//!
//! This module provides:
//! - ECDSA key management (secp256k1)
//! - Ethereum address derivation
//! - Mnemonic-based key derivation

pub mod keys;
pub mod mnemonic;

pub use keys::{
    public_key_to_address, recover_address, sign_hash, KeyError, KeyPair, RecoverableSig,
};
pub use mnemonic::{key_pair_from_mnemonic, DEFAULT_DERIVATION_PATH};
