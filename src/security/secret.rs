//! Signing key wrapper that keeps key material out of logs and zeroizes it on drop.
use std::fmt;

use ethers::types::Address;
use secrecy::{ExposeSecret, Secret};
use zeroize::Zeroizing;

use crate::core::errors::{Result, TxError};
use crate::crypto::signature_utils;

/// Private secp256k1 key (32 bytes) held in a `secrecy::Secret`.
pub struct TxSigningKey(Secret<[u8; 32]>);

impl TxSigningKey {
    pub fn new(key: [u8; 32]) -> Self {
        Self(Secret::new(key))
    }

    /// Try to construct a key from a byte slice (must be 32 bytes and a valid scalar).
    pub fn try_from_slice(slice: &[u8]) -> Result<Self> {
        if slice.len() != 32 {
            return Err(TxError::invalid(format!(
                "private key must be 32 bytes, got {}",
                slice.len()
            )));
        }
        // Rejects zero and values >= the curve order.
        secp256k1::SecretKey::from_slice(slice)?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(slice);
        let key = Self::new(arr);
        zeroize::Zeroize::zeroize(&mut arr);
        Ok(key)
    }

    /// Parse a hex key, with or without `0x`.
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let trimmed = hex_key.trim();
        let raw = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = Zeroizing::new(hex::decode(raw)?);
        Self::try_from_slice(&bytes)
    }

    /// Scoped access to the key bytes for the duration of `f`.
    pub fn with_secret<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[u8; 32]) -> R,
    {
        f(self.0.expose_secret())
    }

    /// Ethereum address controlled by this key.
    pub fn address(&self) -> Result<Address> {
        self.with_secret(|bytes| signature_utils::address_from_secret(bytes))
    }
}

impl fmt::Debug for TxSigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TxSigningKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Hardhat/anvil account #0, test-only.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_from_hex_derives_known_address() {
        let key = TxSigningKey::from_hex(DEV_KEY).unwrap();
        let expected: Address = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap();
        assert_eq!(key.address().unwrap(), expected);
    }

    #[test]
    fn test_from_hex_without_prefix() {
        let a = TxSigningKey::from_hex(DEV_KEY).unwrap();
        let b = TxSigningKey::from_hex(&DEV_KEY[2..]).unwrap();
        assert_eq!(a.address().unwrap(), b.address().unwrap());
    }

    #[test]
    fn test_rejects_wrong_length() {
        let err = TxSigningKey::try_from_slice(&[1u8; 31]).unwrap_err();
        assert!(matches!(err, TxError::InvalidInput(_)));
    }

    #[test]
    fn test_rejects_zero_key_via_secp256k1() {
        let err = TxSigningKey::try_from_slice(&[0u8; 32]).unwrap_err();
        assert!(matches!(err, TxError::Signing(_)));
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = TxSigningKey::new([1u8; 32]);
        let printed = format!("{:?}", key);
        assert_eq!(printed, "TxSigningKey(<redacted>)");
        assert!(!printed.contains("0101"));
    }
}
