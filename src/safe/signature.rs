//! Owner signatures attached to a Safe transaction
//!
//! `SafeSignature` is an adapter around a signer address and the raw bytes
//! the transaction service returns. It exposes the two views the Safe's
//! `execTransaction` packing needs: a 65-byte static part and a dynamic part
//! (empty for externally owned accounts).

use alloy_primitives::{keccak256, Address, Bytes, B256};
use serde::{Deserialize, Serialize};

use crate::crypto::{recover_address, KeyError, KeyPair};

/// Length of the static part of a signature
pub const SIGNATURE_LENGTH: usize = 65;

/// A single owner signature
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeSignature {
    /// Owner that produced the signature
    pub signer: Address,
    /// `r || s || v`
    pub data: Bytes,
}

/// How the `v` byte tells the Safe to validate the signature
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureKind {
    /// `v = 0`
    Contract,
    /// `v = 1`
    ApprovedHash,
    /// `v = 27/28`, signed over the Safe transaction hash directly
    Ecdsa,
    /// `v = 31/32`, signed over the personal-message prefixed hash
    EthSign,
}

impl SafeSignature {
    /// Create a new signature
    pub fn new(signer: Address, data: Bytes) -> Self {
        Self { signer, data }
    }

    /// Sign a Safe transaction hash with a local key
    pub fn sign(key_pair: &KeyPair, safe_tx_hash: &B256) -> Result<Self, KeyError> {
        let sig = key_pair.sign_hash(safe_tx_hash)?;
        Ok(Self::new(key_pair.address(), Bytes::from(sig.to_rsv_bytes())))
    }

    /// Bytes placed in the fixed-size section of the packed signatures
    pub fn static_part(&self) -> &[u8] {
        &self.data
    }

    /// Bytes appended after all static parts
    pub fn dynamic_part(&self) -> &[u8] {
        &[]
    }

    /// Classify by the `v` byte
    pub fn kind(&self) -> Option<SignatureKind> {
        if self.data.len() != SIGNATURE_LENGTH {
            return None;
        }
        match self.data[SIGNATURE_LENGTH - 1] {
            0 => Some(SignatureKind::Contract),
            1 => Some(SignatureKind::ApprovedHash),
            27 | 28 => Some(SignatureKind::Ecdsa),
            31 | 32 => Some(SignatureKind::EthSign),
            _ => None,
        }
    }

    /// Recover the ECDSA signer, `None` for contract and approved-hash signatures
    pub fn recover(&self, safe_tx_hash: &B256) -> Result<Option<Address>, KeyError> {
        match self.kind() {
            Some(SignatureKind::Ecdsa) => Ok(Some(recover_address(safe_tx_hash, &self.data)?)),
            Some(SignatureKind::EthSign) => {
                let mut prefixed = b"\x19Ethereum Signed Message:\n32".to_vec();
                prefixed.extend_from_slice(safe_tx_hash.as_slice());
                let digest = keccak256(&prefixed);

                let mut adjusted = self.data.to_vec();
                adjusted[SIGNATURE_LENGTH - 1] -= 4;
                Ok(Some(recover_address(&digest, &adjusted)?))
            }
            Some(SignatureKind::Contract) | Some(SignatureKind::ApprovedHash) => Ok(None),
            None => Err(KeyError::InvalidSignature),
        }
    }
}
