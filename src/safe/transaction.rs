//! Safe transaction proposals
//!
//! A proposal is built once, hashed once, and only ever gains signatures
//! afterwards. The payload fields are private so nothing can change them
//! after the hash has been handed out to approvers.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{Eip712Domain, SolCall, SolStruct};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::crypto::KeyError;
use crate::safe::contract::{ISafe, SafeTx};
use crate::safe::signature::SafeSignature;

/// `operation` value for a plain call
pub const OPERATION_CALL: u8 = 0;

/// Base gas charged on top of `safeTxGas`
pub const DEFAULT_BASE_GAS: u64 = 21_000;

/// Errors related to Safe transactions
#[derive(Error, Debug)]
pub enum SafeError {
    #[error("Signer is not a Safe owner: {0}")]
    UnauthorizedSigner(Address),
    #[error("Already signed by {0}")]
    AlreadySigned(Address),
    #[error("Signature does not match signer {0}")]
    InvalidSignature(Address),
    #[error("Insufficient signatures: have {have}, need {need}")]
    InsufficientSignatures { have: usize, need: usize },
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
}

/// The fields covered by the Safe transaction hash
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeTransactionData {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub operation: u8,
    pub safe_tx_gas: U256,
    pub base_gas: U256,
    /// Gas price used for the refund calculation
    pub gas_price: U256,
    pub gas_token: Address,
    pub refund_receiver: Address,
    pub nonce: U256,
}

impl SafeTransactionData {
    /// A zero-value call paid in ether with refunds going to the Safe itself
    pub fn call(safe: Address, to: Address, data: Bytes, safe_tx_gas: U256, nonce: U256) -> Self {
        Self {
            to,
            value: U256::ZERO,
            data,
            operation: OPERATION_CALL,
            safe_tx_gas,
            base_gas: U256::from(DEFAULT_BASE_GAS),
            gas_price: U256::ZERO,
            gas_token: Address::ZERO,
            refund_receiver: safe,
            nonce,
        }
    }

    fn typed(&self) -> SafeTx {
        SafeTx {
            to: self.to,
            value: self.value,
            data: self.data.clone(),
            operation: self.operation,
            safeTxGas: self.safe_tx_gas,
            baseGas: self.base_gas,
            gasPrice: self.gas_price,
            gasToken: self.gas_token,
            refundReceiver: self.refund_receiver,
            nonce: self.nonce,
        }
    }

    /// EIP-712 hash under the domain `{chainId, verifyingContract: safe}`
    pub fn safe_tx_hash(&self, chain_id: u64, safe: Address) -> B256 {
        let domain = Eip712Domain::new(None, None, Some(U256::from(chain_id)), Some(safe), None);
        self.typed().eip712_signing_hash(&domain)
    }
}

/// Signature collection state
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProposalStatus {
    /// Waiting for more signatures
    AwaitingSignatures,
    /// Has enough signatures, ready to execute
    Ready,
    /// `execTransaction` has been broadcast
    Broadcast,
}

/// A Safe transaction with its collected owner signatures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SafeTransaction {
    safe: Address,
    chain_id: u64,
    data: SafeTransactionData,
    safe_tx_hash: B256,
    /// Keyed by signer, which also gives the ascending order `execTransaction` expects
    signatures: BTreeMap<Address, SafeSignature>,
    threshold: usize,
    status: ProposalStatus,
}

impl SafeTransaction {
    /// Create a proposal and compute its hash
    pub fn new(safe: Address, chain_id: u64, data: SafeTransactionData, threshold: usize) -> Self {
        let safe_tx_hash = data.safe_tx_hash(chain_id, safe);
        Self {
            safe,
            chain_id,
            data,
            safe_tx_hash,
            signatures: BTreeMap::new(),
            threshold,
            status: ProposalStatus::AwaitingSignatures,
        }
    }

    pub fn safe(&self) -> Address {
        self.safe
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn data(&self) -> &SafeTransactionData {
        &self.data
    }

    pub fn safe_tx_hash(&self) -> B256 {
        self.safe_tx_hash
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn status(&self) -> &ProposalStatus {
        &self.status
    }

    /// Add a signature from an owner
    ///
    /// `owners` may be empty when the owner set is unknown, in which case
    /// only the signature itself is checked.
    pub fn add_signature(
        &mut self,
        signature: SafeSignature,
        owners: &[Address],
    ) -> Result<(), SafeError> {
        if !owners.is_empty() && !owners.contains(&signature.signer) {
            return Err(SafeError::UnauthorizedSigner(signature.signer));
        }

        if self.signatures.contains_key(&signature.signer) {
            return Err(SafeError::AlreadySigned(signature.signer));
        }

        if let Some(recovered) = signature.recover(&self.safe_tx_hash)? {
            if recovered != signature.signer {
                return Err(SafeError::InvalidSignature(signature.signer));
            }
        }

        self.signatures.insert(signature.signer, signature);

        if self.signatures.len() >= self.threshold {
            self.status = ProposalStatus::Ready;
        }

        Ok(())
    }

    /// Whether `signer` has already signed
    pub fn has_signature(&self, signer: &Address) -> bool {
        self.signatures.contains_key(signer)
    }

    /// Get number of signatures collected
    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    /// Check if transaction has enough signatures
    pub fn is_ready(&self) -> bool {
        self.signatures.len() >= self.threshold
    }

    /// Signers in ascending address order
    pub fn signed_by(&self) -> Vec<Address> {
        self.signatures.keys().copied().collect()
    }

    /// Packed signatures: every static part in signer order, then every dynamic part
    pub fn encoded_signatures(&self) -> Bytes {
        let mut static_parts = Vec::new();
        let mut dynamic_parts = Vec::new();
        for signature in self.signatures.values() {
            static_parts.extend_from_slice(signature.static_part());
            dynamic_parts.extend_from_slice(signature.dynamic_part());
        }
        static_parts.extend_from_slice(&dynamic_parts);
        Bytes::from(static_parts)
    }

    /// Build the `execTransaction` call data
    pub fn finalize(&self) -> Result<Bytes, SafeError> {
        if !self.is_ready() {
            return Err(SafeError::InsufficientSignatures {
                have: self.signatures.len(),
                need: self.threshold,
            });
        }

        let call = ISafe::execTransactionCall {
            to: self.data.to,
            value: self.data.value,
            data: self.data.data.clone(),
            operation: self.data.operation,
            safeTxGas: self.data.safe_tx_gas,
            baseGas: self.data.base_gas,
            gasPrice: self.data.gas_price,
            gasToken: self.data.gas_token,
            refundReceiver: self.data.refund_receiver,
            signatures: self.encoded_signatures(),
        };

        Ok(Bytes::from(call.abi_encode()))
    }

    /// Mark as broadcast
    pub fn mark_broadcast(&mut self) {
        self.status = ProposalStatus::Broadcast;
    }
}
