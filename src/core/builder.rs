//! Transaction builder/signer.
//!
//! ## Pipeline
//! ```text
//! TransactionRequest
//!    ↓  fill unset fees from FeeDefaults
//! unsigned fields (per-type field order; legacy adds [chainId, "", ""])
//!    ↓  RLP, type prefix
//! signing hash = keccak256(prefix ∥ rlp)
//!    ↓  ECDSA secp256k1 (or an externally supplied signature)
//! signed fields = unsigned fields ∥ [v | yParity, r, s]
//!    ↓  RLP, type prefix
//! raw bytes, raw hash = keccak256(raw bytes)
//! ```
//!
//! Every step is a pure function of the request, the fee configuration and the
//! signature; the builder keeps no state between calls.

use ethers::types::{Address, H256};
use serde::Serialize;
use tracing::{debug, info};

use super::config::FeeDefaults;
use super::errors::{Result, TxError};
use super::rlp::RlpItem;
use super::transaction::{envelope, TransactionRequest, TransactionType, TxSignature};
use crate::crypto::signature_utils::{self, keccak256};
use crate::security::secret::TxSigningKey;
use crate::utils::to_hex_prefixed;

/// A fully assembled signed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    /// Wire bytes, type prefix included.
    #[serde(serialize_with = "serialize_hex")]
    pub raw: Vec<u8>,
    /// keccak256 of `raw`, the transaction id.
    pub hash: H256,
    /// keccak256 of the unsigned payload that was signed.
    pub signing_hash: H256,
    pub signature: TxSignature,
}

impl SignedTransaction {
    /// `0x`-prefixed lower-case hex of the wire bytes, as passed to `eth_sendRawTransaction`.
    pub fn raw_hex(&self) -> String {
        to_hex_prefixed(&self.raw)
    }

    pub fn hash_hex(&self) -> String {
        to_hex_prefixed(self.hash.as_bytes())
    }

    pub fn signing_hash_hex(&self) -> String {
        to_hex_prefixed(self.signing_hash.as_bytes())
    }
}

fn serialize_hex<S: serde::Serializer>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_hex_prefixed(bytes))
}

/// Builds and signs transactions using a fee policy.
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    fees: FeeDefaults,
}

impl TransactionBuilder {
    pub fn new(fees: FeeDefaults) -> Self {
        Self { fees }
    }

    pub fn fees(&self) -> &FeeDefaults {
        &self.fees
    }

    /// The request as it will be encoded: type checked and fee defaults filled in.
    pub fn resolve(&self, request: &TransactionRequest) -> Result<TransactionRequest> {
        let mut resolved = request.clone();
        self.fees.apply(&mut resolved)?;
        Ok(resolved)
    }

    /// `prefix ∥ rlp(unsigned fields)`
    pub fn unsigned_payload(&self, request: &TransactionRequest) -> Result<Vec<u8>> {
        let resolved = self.resolve(request)?;
        Ok(envelope(resolved.tx_type, &unsigned_items(&resolved, Some(resolved.chain_id))?))
    }

    /// Hash a remote key holder must sign for `request`.
    pub fn signing_hash(&self, request: &TransactionRequest) -> Result<H256> {
        Ok(keccak256(&self.unsigned_payload(request)?))
    }

    /// Sign `request` with `key` and assemble the wire transaction.
    pub fn build(&self, request: &TransactionRequest, key: &TxSigningKey) -> Result<SignedTransaction> {
        let resolved = self.resolve(request)?;
        if let Some(expected) = resolved.from {
            let signer = key.address()?;
            if signer != expected {
                return Err(TxError::invalid(format!(
                    "from {:?} does not match signing key address {:?}",
                    expected, signer
                )));
            }
        }

        let signing_hash = keccak256(&envelope(
            resolved.tx_type,
            &unsigned_items(&resolved, Some(resolved.chain_id))?,
        ));
        let raw = signature_utils::sign_hash(key, signing_hash)?;
        let v = match resolved.tx_type {
            TransactionType::Legacy => signature_utils::legacy_v(resolved.chain_id, raw.recovery_id)?,
            _ => raw.recovery_id as u64,
        };
        let signature = TxSignature::new(raw.r, raw.s, v);

        self.assemble(&resolved, signing_hash, signature)
    }

    /// Assemble the wire transaction from an externally produced signature.
    pub fn build_with_signature(
        &self,
        request: &TransactionRequest,
        signature: TxSignature,
    ) -> Result<SignedTransaction> {
        let resolved = self.resolve(request)?;
        signature.check_components()?;
        let replay_chain_id = check_recovery_indicator(&resolved, signature.v)?;
        let signing_hash =
            keccak256(&envelope(resolved.tx_type, &unsigned_items(&resolved, replay_chain_id)?));
        self.assemble(&resolved, signing_hash, signature)
    }

    fn assemble(
        &self,
        resolved: &TransactionRequest,
        signing_hash: H256,
        signature: TxSignature,
    ) -> Result<SignedTransaction> {
        debug!(
            tx_type = %resolved.tx_type,
            chain_id = resolved.chain_id,
            nonce = resolved.nonce,
            gas_limit = resolved.gas_limit,
            to = ?resolved.to,
            data_len = resolved.data.len(),
            access_list_len = resolved.access_list.len(),
            "assembling transaction"
        );

        let mut items = resolved.payload_items()?;
        items.extend(signature.rlp_items());
        let raw = envelope(resolved.tx_type, &items);
        let hash = keccak256(&raw);

        info!(
            tx_type = %resolved.tx_type,
            hash = %to_hex_prefixed(hash.as_bytes()),
            size = raw.len(),
            "transaction signed"
        );

        Ok(SignedTransaction { tx_type: resolved.tx_type, raw, hash, signing_hash, signature })
    }

    /// Address that signed `signed`, recovered from its signing hash.
    pub fn recover_signer(signed: &SignedTransaction) -> Result<Address> {
        let recovery_id = match signed.tx_type {
            TransactionType::Legacy => {
                let (recovery_id, _) = signature_utils::split_legacy_v(signed.signature.v)?;
                recovery_id
            }
            _ => y_parity(signed.signature.v)?,
        };
        signature_utils::recover_address(
            signed.signing_hash,
            signed.signature.r,
            signed.signature.s,
            recovery_id,
        )
    }
}

/// Unsigned fields; a legacy payload with a chain id carries the EIP-155 tail.
pub(crate) fn unsigned_items(request: &TransactionRequest, chain_id: Option<u64>) -> Result<Vec<RlpItem>> {
    let mut items = request.payload_items()?;
    if let (TransactionType::Legacy, Some(chain_id)) = (request.tx_type, chain_id) {
        items.extend([RlpItem::uint(chain_id), RlpItem::empty(), RlpItem::empty()]);
    }
    Ok(items)
}

pub(crate) fn y_parity(v: u64) -> Result<u8> {
    match v {
        0 | 1 => Ok(v as u8),
        other => Err(TxError::malformed(format!("yParity must be 0 or 1, got {}", other))),
    }
}

/// Validates `v` against the request. Returns the chain id the signing payload commits
/// to: `None` only for a pre-EIP-155 legacy `v` of 27/28, which requires chain id 0.
fn check_recovery_indicator(request: &TransactionRequest, v: u64) -> Result<Option<u64>> {
    match request.tx_type {
        TransactionType::Legacy => match signature_utils::split_legacy_v(v)? {
            (_, None) if request.chain_id == 0 => Ok(None),
            (_, None) => Err(TxError::malformed(format!(
                "legacy v {} carries no chain id but the request targets chain {}",
                v, request.chain_id
            ))),
            (_, Some(chain_id)) if chain_id == request.chain_id => Ok(Some(chain_id)),
            (_, Some(_)) => Err(TxError::malformed(format!(
                "legacy v {} does not encode chain id {}",
                v, request.chain_id
            ))),
        },
        _ => y_parity(v).map(|_| Some(request.chain_id)),
    }
}
