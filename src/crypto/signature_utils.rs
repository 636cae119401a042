use ethers::types::{Address, H256, U256};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use sha3::{Digest, Keccak256};

use crate::core::errors::{Result, TxError};
use crate::security::secret::TxSigningKey;

/// EIP-155 offset added to `chain_id * 2` in a legacy `v`.
pub const EIP155_V_OFFSET: u64 = 35;
/// Pre-EIP-155 `v` base (27 / 28).
pub const LEGACY_V_BASE: u64 = 27;

/// secp256k1 group order `n`.
pub const SECP256K1_N: U256 = U256([
    0xbfd2_5e8c_d036_4141,
    0xbaae_dce6_af48_a03b,
    0xffff_ffff_ffff_fffe,
    0xffff_ffff_ffff_ffff,
]);
/// `n / 2`, the largest `s` accepted since EIP-2.
pub const SECP256K1_HALF_N: U256 = U256([
    0xdfe9_2f46_681b_20a0,
    0x5d57_6e73_57a4_501d,
    0xffff_ffff_ffff_ffff,
    0x7fff_ffff_ffff_ffff,
]);

pub fn keccak256(data: &[u8]) -> H256 {
    H256::from_slice(&Keccak256::digest(data))
}

/// Components of a recoverable ECDSA signature over a 32-byte digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSignature {
    pub r: U256,
    pub s: U256,
    pub recovery_id: u8,
}

/// Sign a prehashed message. libsecp256k1 signs deterministically (RFC 6979) and
/// always emits low-S signatures.
pub fn sign_hash(key: &TxSigningKey, hash: H256) -> Result<RawSignature> {
    let secp = Secp256k1::signing_only();
    let message = Message::from_slice(hash.as_bytes())?;
    let signature = key.with_secret(|bytes| -> Result<RecoverableSignature> {
        let secret_key = SecretKey::from_slice(bytes)?;
        Ok(secp.sign_ecdsa_recoverable(&message, &secret_key))
    })?;
    let (recovery_id, compact) = signature.serialize_compact();
    Ok(RawSignature {
        r: U256::from_big_endian(&compact[..32]),
        s: U256::from_big_endian(&compact[32..]),
        recovery_id: recovery_id.to_i32() as u8,
    })
}

/// Recover the signer address of `hash` from (r, s, recovery id).
pub fn recover_address(hash: H256, r: U256, s: U256, recovery_id: u8) -> Result<Address> {
    let mut compact = [0u8; 64];
    r.to_big_endian(&mut compact[..32]);
    s.to_big_endian(&mut compact[32..]);
    let recovery_id = RecoveryId::from_i32(recovery_id as i32)?;
    let signature = RecoverableSignature::from_compact(&compact, recovery_id)?;
    let message = Message::from_slice(hash.as_bytes())?;
    let public_key = Secp256k1::verification_only().recover_ecdsa(&message, &signature)?;
    Ok(public_key_to_address(&public_key))
}

/// Ethereum address = keccak256(uncompressed pubkey without prefix)[12..]
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = Keccak256::digest(&uncompressed[1..]);
    Address::from_slice(&hash[12..])
}

pub fn address_from_secret(secret: &[u8; 32]) -> Result<Address> {
    let secp = Secp256k1::signing_only();
    let secret_key = SecretKey::from_slice(secret)?;
    Ok(public_key_to_address(&PublicKey::from_secret_key(&secp, &secret_key)))
}

/// Range check for wire signature components: `1 <= r < n`, `1 <= s <= n/2`.
pub fn check_signature_components(r: U256, s: U256) -> Result<()> {
    if r.is_zero() || r >= SECP256K1_N {
        return Err(TxError::malformed(format!("signature r out of range: {:#x}", r)));
    }
    if s.is_zero() || s >= SECP256K1_N {
        return Err(TxError::malformed(format!("signature s out of range: {:#x}", s)));
    }
    if s > SECP256K1_HALF_N {
        return Err(TxError::malformed(format!("signature s is not low-S: {:#x}", s)));
    }
    Ok(())
}

/// `v = chain_id * 2 + 35 + recovery_id`
pub fn legacy_v(chain_id: u64, recovery_id: u8) -> Result<u64> {
    if recovery_id > 1 {
        return Err(TxError::malformed(format!("recovery id {} out of range", recovery_id)));
    }
    chain_id
        .checked_mul(2)
        .and_then(|v| v.checked_add(EIP155_V_OFFSET + recovery_id as u64))
        .ok_or_else(|| TxError::invalid(format!("chain id {} too large for EIP-155", chain_id)))
}

/// Split a legacy `v` into (recovery id, chain id). 27/28 carry no chain id.
pub fn split_legacy_v(v: u64) -> Result<(u8, Option<u64>)> {
    match v {
        27 | 28 => Ok(((v - LEGACY_V_BASE) as u8, None)),
        v if v >= EIP155_V_OFFSET => {
            let offset = v - EIP155_V_OFFSET;
            Ok(((offset % 2) as u8, Some(offset / 2)))
        }
        _ => Err(TxError::malformed(format!("invalid legacy signature v {}", v))),
    }
}
