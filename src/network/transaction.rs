//! Legacy (EIP-155) transaction signing
//!
//! Used to broadcast calls from the configured signer account: the Safe
//! `execTransaction` call and the direct ownership transfer.

use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_network::TxSignerSync;
use alloy_primitives::{Address, Bytes, TxKind, B256, U256};
use alloy_signer_local::PrivateKeySigner;
use thiserror::Error;

/// Transaction signing errors
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Gas price {0} does not fit a legacy transaction")]
    GasPriceOverflow(U256),
    #[error("Signer error: {0}")]
    SignerError(#[from] alloy_signer::Error),
}

/// An unsigned legacy transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub chain_id: u64,
}

/// A signed, broadcast-ready transaction
#[derive(Clone, Debug)]
pub struct SignedTransaction {
    /// Network encoding passed to `eth_sendRawTransaction`
    pub raw: Vec<u8>,
    pub hash: B256,
}

impl LegacyTransaction {
    fn to_consensus(&self) -> Result<TxLegacy, TransactionError> {
        let gas_price = u128::try_from(self.gas_price)
            .map_err(|_| TransactionError::GasPriceOverflow(self.gas_price))?;
        Ok(TxLegacy {
            chain_id: Some(self.chain_id),
            nonce: self.nonce,
            gas_price,
            gas_limit: self.gas_limit,
            to: TxKind::Call(self.to),
            value: self.value,
            input: self.data.clone(),
        })
    }

    /// Hash signed over: `rlp([nonce, gasPrice, gas, to, value, data, chainId, 0, 0])`
    pub fn signing_hash(&self) -> Result<B256, TransactionError> {
        Ok(self.to_consensus()?.signature_hash())
    }

    /// Sign with `signer`, producing `rlp([..., v, r, s])`
    pub fn sign(&self, signer: &PrivateKeySigner) -> Result<SignedTransaction, TransactionError> {
        let mut tx = self.to_consensus()?;
        let signature = signer.sign_transaction_sync(&mut tx)?;
        let envelope = TxEnvelope::Legacy(tx.into_signed(signature));

        Ok(SignedTransaction {
            raw: envelope.encoded_2718(),
            hash: *envelope.tx_hash(),
        })
    }
}
