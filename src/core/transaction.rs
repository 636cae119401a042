//! Transaction data model: the type enumeration, caller-facing request, signature
//! components and the per-type field-order descriptors that drive encoding and decoding.

use std::fmt;

use ethers::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};

use super::errors::{Result, TxError};
use super::rlp::{self, RlpItem};
use crate::crypto::signature_utils;

/// EIP-2718 transaction types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TransactionType {
    #[default]
    Legacy,
    Eip2930,
    Eip1559,
    /// Blob transactions are recognised but not built or parsed.
    Eip4844,
}

impl TransactionType {
    pub const ALL: [TransactionType; 4] = [
        TransactionType::Legacy,
        TransactionType::Eip2930,
        TransactionType::Eip1559,
        TransactionType::Eip4844,
    ];

    pub fn type_byte(&self) -> u8 {
        match self {
            TransactionType::Legacy => 0x00,
            TransactionType::Eip2930 => 0x01,
            TransactionType::Eip1559 => 0x02,
            TransactionType::Eip4844 => 0x03,
        }
    }

    /// Envelope prefix byte; legacy payloads are bare RLP lists.
    pub fn prefix(&self) -> Option<u8> {
        match self {
            TransactionType::Legacy => None,
            other => Some(other.type_byte()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransactionType::Legacy => "Legacy Transaction",
            TransactionType::Eip2930 => "EIP-2930 Transaction",
            TransactionType::Eip1559 => "EIP-1559 Transaction",
            TransactionType::Eip4844 => "EIP-4844 Transaction",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, TransactionType::Eip4844)
    }

    /// Unsigned payload fields in wire order. Errors for types that cannot be built.
    pub fn field_order(&self) -> Result<&'static [TxField]> {
        match self {
            TransactionType::Legacy => Ok(&LEGACY_FIELDS),
            TransactionType::Eip2930 => Ok(&EIP2930_FIELDS),
            TransactionType::Eip1559 => Ok(&EIP1559_FIELDS),
            TransactionType::Eip4844 => Err(TxError::unsupported(format!(
                "{} is not implemented",
                self.name()
            ))),
        }
    }
}

impl TryFrom<u8> for TransactionType {
    type Error = TxError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(TransactionType::Legacy),
            0x01 => Ok(TransactionType::Eip2930),
            0x02 => Ok(TransactionType::Eip1559),
            0x03 => Ok(TransactionType::Eip4844),
            other => Err(TxError::unsupported(format!("unknown type 0x{:02x}", other))),
        }
    }
}

impl From<TransactionType> for u8 {
    fn from(value: TransactionType) -> Self {
        value.type_byte()
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Legacy => write!(f, "Legacy"),
            TransactionType::Eip2930 => write!(f, "EIP2930"),
            TransactionType::Eip1559 => write!(f, "EIP1559"),
            TransactionType::Eip4844 => write!(f, "EIP4844"),
        }
    }
}

/// Named slot of an unsigned payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxField {
    ChainId,
    Nonce,
    GasPrice,
    MaxPriorityFeePerGas,
    MaxFeePerGas,
    GasLimit,
    To,
    Value,
    Data,
    AccessList,
}

const LEGACY_FIELDS: [TxField; 6] = [
    TxField::Nonce,
    TxField::GasPrice,
    TxField::GasLimit,
    TxField::To,
    TxField::Value,
    TxField::Data,
];

const EIP2930_FIELDS: [TxField; 8] = [
    TxField::ChainId,
    TxField::Nonce,
    TxField::GasPrice,
    TxField::GasLimit,
    TxField::To,
    TxField::Value,
    TxField::Data,
    TxField::AccessList,
];

const EIP1559_FIELDS: [TxField; 9] = [
    TxField::ChainId,
    TxField::Nonce,
    TxField::MaxPriorityFeePerGas,
    TxField::MaxFeePerGas,
    TxField::GasLimit,
    TxField::To,
    TxField::Value,
    TxField::Data,
    TxField::AccessList,
];

/// One access list entry: an address and the storage slots it will touch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListItem {
    pub address: Address,
    #[serde(default)]
    pub storage_keys: Vec<H256>,
}

impl AccessListItem {
    pub fn new(address: Address, storage_keys: Vec<H256>) -> Self {
        Self { address, storage_keys }
    }

    fn to_rlp(&self) -> RlpItem {
        RlpItem::list(vec![
            RlpItem::from(self.address),
            RlpItem::list(self.storage_keys.iter().map(|key| RlpItem::from(*key)).collect()),
        ])
    }

    fn from_rlp(item: &RlpItem) -> Result<Self> {
        match item.as_list()? {
            [address, keys] => Ok(Self {
                address: address.as_address()?,
                storage_keys: keys.as_list()?.iter().map(RlpItem::as_h256).collect::<Result<_>>()?,
            }),
            other => Err(TxError::malformed(format!(
                "access list entry must have 2 elements, got {}",
                other.len()
            ))),
        }
    }
}

/// Caller-supplied fee fields. Unset values fall back to the configured defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeInputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
}

/// Parameters of one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(rename = "type", default)]
    pub tx_type: TransactionType,
    pub chain_id: u64,
    pub nonce: u64,
    #[serde(flatten)]
    pub fees: FeeInputs,
    pub gas_limit: u64,
    /// Expected signer; checked against the signing key when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// `None` creates a contract.
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub value: U256,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default)]
    pub access_list: Vec<AccessListItem>,
}

impl TransactionRequest {
    pub fn new(tx_type: TransactionType, chain_id: u64) -> Self {
        Self { tx_type, chain_id, ..Default::default() }
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn gas_price(mut self, gas_price: impl Into<U256>) -> Self {
        self.fees.gas_price = Some(gas_price.into());
        self
    }

    pub fn max_fee_per_gas(mut self, max_fee: impl Into<U256>) -> Self {
        self.fees.max_fee_per_gas = Some(max_fee.into());
        self
    }

    pub fn max_priority_fee_per_gas(mut self, priority_fee: impl Into<U256>) -> Self {
        self.fees.max_priority_fee_per_gas = Some(priority_fee.into());
        self
    }

    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    pub fn value(mut self, value: impl Into<U256>) -> Self {
        self.value = value.into();
        self
    }

    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    pub fn access_list(mut self, access_list: Vec<AccessListItem>) -> Self {
        self.access_list = access_list;
        self
    }

    /// RLP items of the unsigned payload, in the order of `tx_type.field_order()`.
    pub(crate) fn payload_items(&self) -> Result<Vec<RlpItem>> {
        Ok(self.tx_type.field_order()?.iter().map(|field| self.field_item(*field)).collect())
    }

    fn field_item(&self, field: TxField) -> RlpItem {
        match field {
            TxField::ChainId => RlpItem::uint(self.chain_id),
            TxField::Nonce => RlpItem::uint(self.nonce),
            TxField::GasPrice => RlpItem::u256(self.fees.gas_price.unwrap_or_default()),
            TxField::MaxPriorityFeePerGas => {
                RlpItem::u256(self.fees.max_priority_fee_per_gas.unwrap_or_default())
            }
            TxField::MaxFeePerGas => RlpItem::u256(self.fees.max_fee_per_gas.unwrap_or_default()),
            TxField::GasLimit => RlpItem::uint(self.gas_limit),
            TxField::To => self.to.map(RlpItem::from).unwrap_or_else(RlpItem::empty),
            TxField::Value => RlpItem::u256(self.value),
            TxField::Data => RlpItem::bytes(self.data.to_vec()),
            TxField::AccessList => {
                RlpItem::list(self.access_list.iter().map(AccessListItem::to_rlp).collect())
            }
        }
    }

    pub(crate) fn set_field(&mut self, field: TxField, item: &RlpItem) -> Result<()> {
        match field {
            TxField::ChainId => self.chain_id = item.as_u64()?,
            TxField::Nonce => self.nonce = item.as_u64()?,
            TxField::GasPrice => self.fees.gas_price = Some(item.as_u256()?),
            TxField::MaxPriorityFeePerGas => {
                self.fees.max_priority_fee_per_gas = Some(item.as_u256()?)
            }
            TxField::MaxFeePerGas => self.fees.max_fee_per_gas = Some(item.as_u256()?),
            TxField::GasLimit => self.gas_limit = item.as_u64()?,
            TxField::To => {
                self.to = match item.as_bytes()? {
                    [] => None,
                    _ => Some(item.as_address()?),
                }
            }
            TxField::Value => self.value = item.as_u256()?,
            TxField::Data => self.data = Bytes::from(item.as_bytes()?.to_vec()),
            TxField::AccessList => {
                self.access_list = item
                    .as_list()?
                    .iter()
                    .map(AccessListItem::from_rlp)
                    .collect::<Result<_>>()?
            }
        }
        Ok(())
    }
}

/// Signature as carried on the wire: `v` is the EIP-155 value for legacy transactions
/// and `yParity` for typed ones. `r` and `s` are integers, so padding never survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxSignature {
    pub r: U256,
    pub s: U256,
    pub v: u64,
}

impl TxSignature {
    pub fn new(r: U256, s: U256, v: u64) -> Self {
        Self { r, s, v }
    }

    /// Build from big-endian byte strings of any padding. More than 32 significant
    /// bytes, or a component outside the curve range, is malformed.
    pub fn from_parts(r: &[u8], s: &[u8], v: u64) -> Result<Self> {
        let signature = Self { r: normalize_component(r, "r")?, s: normalize_component(s, "s")?, v };
        signature.check_components()?;
        Ok(signature)
    }

    /// `1 <= r < n` and low-S `1 <= s <= n/2`.
    pub fn check_components(&self) -> Result<()> {
        signature_utils::check_signature_components(self.r, self.s)
    }

    /// Minimal big-endian bytes of `r`.
    pub fn r_bytes(&self) -> Vec<u8> {
        rlp::u256_to_minimal_be(self.r)
    }

    pub fn s_bytes(&self) -> Vec<u8> {
        rlp::u256_to_minimal_be(self.s)
    }

    pub(crate) fn rlp_items(&self) -> [RlpItem; 3] {
        [RlpItem::uint(self.v), RlpItem::u256(self.r), RlpItem::u256(self.s)]
    }
}

fn normalize_component(bytes: &[u8], name: &str) -> Result<U256> {
    let stripped = rlp::strip_leading_zeros(bytes);
    if stripped.len() > 32 {
        return Err(TxError::malformed(format!(
            "signature {} has {} significant bytes",
            name,
            stripped.len()
        )));
    }
    Ok(U256::from_big_endian(stripped))
}

/// `prefix ∥ rlp(items)`
pub(crate) fn envelope(tx_type: TransactionType, items: &[RlpItem]) -> Vec<u8> {
    let encoded = rlp::encode_list(items);
    match tx_type.prefix() {
        Some(prefix) => {
            let mut out = Vec::with_capacity(encoded.len() + 1);
            out.push(prefix);
            out.extend_from_slice(&encoded);
            out
        }
        None => encoded,
    }
}
