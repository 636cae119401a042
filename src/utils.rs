// src/utils.rs
//! Hex helpers for the presentation boundary. The core works on bytes only.
use ethers::types::{Address, H256};

use crate::core::errors::{Result, TxError};

/// Convert a hex string to bytes. The `0x` prefix is optional and `"0x"` alone is empty.
pub fn hex_to_bytes(hex_string: &str) -> Result<Vec<u8>> {
    let trimmed = hex_string.trim();
    if trimmed.is_empty() {
        return Err(TxError::invalid("hex string cannot be empty"));
    }
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    Ok(hex::decode(digits)?)
}

/// Lower-case hex with a `0x` prefix.
pub fn to_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn parse_address(input: &str) -> Result<Address> {
    let bytes = hex_to_bytes(input)?;
    if bytes.len() != 20 {
        return Err(TxError::invalid(format!("address must be 20 bytes, got {}", bytes.len())));
    }
    Ok(Address::from_slice(&bytes))
}

pub fn parse_h256(input: &str) -> Result<H256> {
    let bytes = hex_to_bytes(input)?;
    if bytes.len() != 32 {
        return Err(TxError::invalid(format!("hash must be 32 bytes, got {}", bytes.len())));
    }
    Ok(H256::from_slice(&bytes))
}
