//! ECDSA key management for Ethereum accounts
//!
//! Provides key pair loading, Ethereum address derivation and recoverable
//! signing using the secp256k1 elliptic curve.

use alloy_primitives::{keccak256, Address, B256};
use alloy_signer_local::PrivateKeySigner;
use rand::rngs::OsRng;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid mnemonic phrase")]
    InvalidMnemonic,
    #[error("Key derivation failed for path {0}")]
    DerivationFailed(String),
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A recoverable ECDSA signature split into its Ethereum components
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoverableSig {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// Recovery id, 0 or 1
    pub recovery_id: u8,
}

impl RecoverableSig {
    /// 65-byte `r || s || v` encoding with `v = 27 + recovery_id`
    pub fn to_rsv_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(65);
        out.extend_from_slice(&self.r);
        out.extend_from_slice(&self.s);
        out.push(27 + self.recovery_id);
        out
    }
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key, with or without `0x`
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let trimmed = hex_key.trim();
        let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(stripped).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Ethereum address: last 20 bytes of keccak256 over the uncompressed key
    pub fn address(&self) -> Address {
        public_key_to_address(&self.public_key)
    }

    /// Sign a 32-byte digest
    pub fn sign_hash(&self, digest: &B256) -> Result<RecoverableSig, KeyError> {
        sign_hash(&self.secret_key, digest)
    }

    /// The same key as an alloy transaction signer
    pub fn local_signer(&self) -> Result<PrivateKeySigner, KeyError> {
        PrivateKeySigner::from_bytes(&B256::from(self.secret_key.secret_bytes()))
            .map_err(|_| KeyError::InvalidPrivateKey)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Convert a public key to an Ethereum address
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    Address::from_slice(&hash[12..])
}

/// Sign a 32-byte digest with a secret key
pub fn sign_hash(secret_key: &SecretKey, digest: &B256) -> Result<RecoverableSig, KeyError> {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest.as_slice())?;
    let signature = secp.sign_ecdsa_recoverable(&message, secret_key);
    let (recovery_id, compact) = signature.serialize_compact();

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&compact[..32]);
    s.copy_from_slice(&compact[32..]);

    Ok(RecoverableSig {
        r,
        s,
        recovery_id: recovery_id.to_i32() as u8,
    })
}

/// Recover the signer address from a 65-byte `r || s || v` signature
pub fn recover_address(digest: &B256, signature: &[u8]) -> Result<Address, KeyError> {
    if signature.len() != 65 {
        return Err(KeyError::InvalidSignature);
    }

    // Accept both raw (0/1) and Ethereum-style (27/28) recovery bytes
    let v = signature[64];
    let recovery_id = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        _ => return Err(KeyError::InvalidSignature),
    };

    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest.as_slice())?;
    let recovery_id = RecoveryId::from_i32(recovery_id as i32)?;
    let sig = RecoverableSignature::from_compact(&signature[..64], recovery_id)?;
    let public_key = secp.recover_ecdsa(&message, &sig)?;

    Ok(public_key_to_address(&public_key))
}
