//! Parser/validator for signed transactions.
//!
//! The first byte selects the envelope: `0x01` and `0x02` are typed envelopes, anything
//! from `0xc0` up is a bare legacy RLP list, and everything else (including blob
//! transactions, `0x03`) is rejected. Field decoding is driven by the same field-order
//! descriptors the builder encodes with.

use ethers::types::{Address, Bytes, H256, U256};
use serde::Serialize;
use tracing::debug;

use super::builder::{unsigned_items, y_parity};
use super::errors::{Result, TxError};
use super::rlp::{self, RlpItem};
use super::transaction::{envelope, AccessListItem, FeeInputs, TransactionRequest, TransactionType, TxSignature};
use crate::crypto::signature_utils::{self, keccak256};
use crate::utils::{hex_to_bytes, parse_h256, to_hex_prefixed};

/// Signature slots appended after the unsigned fields.
const SIGNATURE_FIELDS: usize = 3;

/// A decoded signed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTransaction {
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    /// `None` for a pre-EIP-155 legacy transaction (`v` of 27/28).
    pub chain_id: Option<u64>,
    pub nonce: u64,
    #[serde(flatten)]
    pub fees: FeeInputs,
    pub gas_limit: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub access_list: Vec<AccessListItem>,
    pub signature: TxSignature,
    /// keccak256 of the raw input.
    pub hash: H256,
    /// keccak256 of the unsigned payload the signature covers.
    pub signing_hash: H256,
}

impl ParsedTransaction {
    pub fn recovery_id(&self) -> Result<u8> {
        match self.tx_type {
            TransactionType::Legacy => Ok(signature_utils::split_legacy_v(self.signature.v)?.0),
            _ => y_parity(self.signature.v),
        }
    }

    /// Address that produced the signature.
    pub fn recover_sender(&self) -> Result<Address> {
        signature_utils::recover_address(
            self.signing_hash,
            self.signature.r,
            self.signature.s,
            self.recovery_id()?,
        )
    }

    /// The request this payload encodes, with `from` set to the recovered sender.
    pub fn to_request(&self) -> Result<TransactionRequest> {
        Ok(TransactionRequest {
            tx_type: self.tx_type,
            chain_id: self.chain_id.unwrap_or_default(),
            nonce: self.nonce,
            fees: self.fees.clone(),
            gas_limit: self.gas_limit,
            from: Some(self.recover_sender()?),
            to: self.to,
            value: self.value,
            data: self.data.clone(),
            access_list: self.access_list.clone(),
        })
    }

    pub fn hash_hex(&self) -> String {
        to_hex_prefixed(self.hash.as_bytes())
    }
}

/// Decode a signed transaction and compute its raw and signing hashes.
pub fn parse_signed_transaction(raw: &[u8]) -> Result<ParsedTransaction> {
    let (tx_type, body) = route(raw)?;
    let order = tx_type.field_order()?;

    let decoded = rlp::decode(body)?;
    let items = decoded.as_list()?;
    if items.len() != order.len() + SIGNATURE_FIELDS {
        return Err(TxError::malformed(format!(
            "{} expects {} fields, got {}",
            tx_type.name(),
            order.len() + SIGNATURE_FIELDS,
            items.len()
        )));
    }
    let (payload, sig_items) = items.split_at(order.len());

    let mut fields = TransactionRequest::new(tx_type, 0);
    for (field, item) in order.iter().zip(payload) {
        fields.set_field(*field, item)?;
    }
    let signature = decode_signature(sig_items)?;

    let chain_id = match tx_type {
        TransactionType::Legacy => signature_utils::split_legacy_v(signature.v)?.1,
        _ => {
            y_parity(signature.v)?;
            Some(fields.chain_id)
        }
    };
    fields.chain_id = chain_id.unwrap_or_default();

    let unsigned = unsigned_items(&fields, chain_id)?;
    let signing_hash = keccak256(&envelope(tx_type, &unsigned));
    let hash = keccak256(raw);

    debug!(
        tx_type = %tx_type,
        chain_id = ?chain_id,
        nonce = fields.nonce,
        hash = %to_hex_prefixed(hash.as_bytes()),
        "parsed signed transaction"
    );

    Ok(ParsedTransaction {
        tx_type,
        chain_id,
        nonce: fields.nonce,
        fees: fields.fees,
        gas_limit: fields.gas_limit,
        to: fields.to,
        value: fields.value,
        data: fields.data,
        access_list: fields.access_list,
        signature,
        hash,
        signing_hash,
    })
}

/// Parse `raw` and check its hash against `expected`.
pub fn verify_signed_transaction(raw: &[u8], expected: H256) -> Result<ParsedTransaction> {
    let parsed = parse_signed_transaction(raw)?;
    if parsed.hash != expected {
        return Err(TxError::HashMismatch {
            expected: to_hex_prefixed(expected.as_bytes()),
            actual: parsed.hash_hex(),
        });
    }
    Ok(parsed)
}

/// [`parse_signed_transaction`] for `0x`-prefixed or bare hex.
pub fn parse_signed_transaction_hex(raw_hex: &str) -> Result<ParsedTransaction> {
    parse_signed_transaction(&hex_to_bytes(raw_hex)?)
}

pub fn verify_signed_transaction_hex(raw_hex: &str, expected_hash: &str) -> Result<ParsedTransaction> {
    verify_signed_transaction(&hex_to_bytes(raw_hex)?, parse_h256(expected_hash)?)
}

fn route(raw: &[u8]) -> Result<(TransactionType, &[u8])> {
    let first = *raw.first().ok_or_else(|| TxError::malformed("empty transaction payload"))?;
    match first {
        0x01 => Ok((TransactionType::Eip2930, &raw[1..])),
        0x02 => Ok((TransactionType::Eip1559, &raw[1..])),
        b if b >= rlp::LIST_OFFSET => Ok((TransactionType::Legacy, raw)),
        0x03 => Err(TxError::unsupported(format!(
            "{} is not implemented",
            TransactionType::Eip4844.name()
        ))),
        other => Err(TxError::unsupported(format!("unknown type byte 0x{:02x}", other))),
    }
}

fn decode_signature(items: &[RlpItem]) -> Result<TxSignature> {
    match items {
        [v, r, s] => {
            let signature = TxSignature::new(r.as_u256()?, s.as_u256()?, v.as_u64()?);
            signature.check_components()?;
            Ok(signature)
        }
        _ => Err(TxError::malformed("missing signature fields")),
    }
}
