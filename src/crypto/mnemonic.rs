//! BIP-39 mnemonic to signing key derivation

use bip39::{Language, Mnemonic, Seed};
use secp256k1::SecretKey;
use tiny_hderive::bip32::ExtendedPrivKey;

use super::keys::{KeyError, KeyPair};

/// m / purpose' / coin_type' / account' / change / address_index
/// Account 0 is the `deployer` named account.
pub const DEFAULT_DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

/// Derive the key pair at `path` from a mnemonic phrase (empty passphrase)
pub fn key_pair_from_mnemonic(phrase: &str, path: &str) -> Result<KeyPair, KeyError> {
    let mnemonic = Mnemonic::from_phrase(phrase.trim(), Language::English)
        .map_err(|_| KeyError::InvalidMnemonic)?;
    let seed = Seed::new(&mnemonic, "");

    let extended = ExtendedPrivKey::derive(seed.as_bytes(), path)
        .map_err(|_| KeyError::DerivationFailed(path.to_string()))?;
    let secret_key =
        SecretKey::from_slice(&extended.secret()).map_err(|_| KeyError::InvalidPrivateKey)?;

    Ok(KeyPair::from_secret_key(secret_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    const DEV_MNEMONIC: &str = "test test test test test test test test test test test junk";

    #[test]
    fn test_default_path_matches_known_account() {
        let kp = key_pair_from_mnemonic(DEV_MNEMONIC, DEFAULT_DERIVATION_PATH).unwrap();
        let expected: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
            .parse()
            .unwrap();
        assert_eq!(kp.address(), expected);
    }

    #[test]
    fn test_second_account_differs() {
        let first = key_pair_from_mnemonic(DEV_MNEMONIC, DEFAULT_DERIVATION_PATH).unwrap();
        let second = key_pair_from_mnemonic(DEV_MNEMONIC, "m/44'/60'/0'/0/1").unwrap();
        assert_ne!(first.address(), second.address());
    }

    #[test]
    fn test_invalid_phrase() {
        let result = key_pair_from_mnemonic("not a real phrase", DEFAULT_DERIVATION_PATH);
        assert!(matches!(result, Err(KeyError::InvalidMnemonic)));
    }
}
