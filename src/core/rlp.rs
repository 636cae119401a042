//! Recursive-Length-Prefix codec.
//!
//! The value domain is deliberately small: a byte string or an ordered list of values.
//! Integers never enter the codec directly; they are converted to minimal big-endian
//! byte strings first (zero is the empty string) with the helpers at the bottom of this
//! module, and converted back with the typed accessors on [`RlpItem`].
//!
//! ```text
//! [0x00, 0x7f]   single byte, encodes as itself
//! [0x80, 0xb7]   string, 0-55 bytes long
//! [0xb8, 0xbf]   string, length-of-length follows
//! [0xc0, 0xf7]   list, 0-55 byte payload
//! [0xf8, 0xff]   list, length-of-length follows
//! ```

use ethers::types::{Address, H256, U256};

use super::errors::{Result, TxError};

pub const STRING_OFFSET: u8 = 0x80;
pub const LIST_OFFSET: u8 = 0xc0;
/// Longest payload that still uses the single-byte header form.
const SHORT_LIMIT: usize = 55;
/// Transactions nest three levels deep (envelope, access list, storage keys).
const MAX_DEPTH: usize = 32;

/// A decoded (or to-be-encoded) RLP value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    Bytes(Vec<u8>),
    List(Vec<RlpItem>),
}

impl RlpItem {
    /// The empty byte string (`0x80` on the wire).
    pub fn empty() -> Self {
        RlpItem::Bytes(Vec::new())
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        RlpItem::Bytes(bytes.into())
    }

    pub fn list(items: Vec<RlpItem>) -> Self {
        RlpItem::List(items)
    }

    pub fn uint(value: u64) -> Self {
        RlpItem::Bytes(u64_to_minimal_be(value))
    }

    pub fn u256(value: U256) -> Self {
        RlpItem::Bytes(u256_to_minimal_be(value))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, RlpItem::List(_))
    }

    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            RlpItem::Bytes(bytes) => Ok(bytes),
            RlpItem::List(_) => Err(TxError::malformed("expected a string, got a list")),
        }
    }

    pub fn as_list(&self) -> Result<&[RlpItem]> {
        match self {
            RlpItem::List(items) => Ok(items),
            RlpItem::Bytes(_) => Err(TxError::malformed("expected a list, got a string")),
        }
    }

    pub fn as_u64(&self) -> Result<u64> {
        minimal_be_to_u64(self.as_bytes()?)
    }

    pub fn as_u256(&self) -> Result<U256> {
        minimal_be_to_u256(self.as_bytes()?)
    }

    pub fn as_address(&self) -> Result<Address> {
        let bytes = self.as_bytes()?;
        if bytes.len() != 20 {
            return Err(TxError::malformed(format!(
                "address must be 20 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Address::from_slice(bytes))
    }

    pub fn as_h256(&self) -> Result<H256> {
        let bytes = self.as_bytes()?;
        if bytes.len() != 32 {
            return Err(TxError::malformed(format!(
                "storage key must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(H256::from_slice(bytes))
    }
}

impl From<Vec<u8>> for RlpItem {
    fn from(bytes: Vec<u8>) -> Self {
        RlpItem::Bytes(bytes)
    }
}

impl From<&[u8]> for RlpItem {
    fn from(bytes: &[u8]) -> Self {
        RlpItem::Bytes(bytes.to_vec())
    }
}

impl From<Vec<RlpItem>> for RlpItem {
    fn from(items: Vec<RlpItem>) -> Self {
        RlpItem::List(items)
    }
}

impl From<Address> for RlpItem {
    fn from(address: Address) -> Self {
        RlpItem::Bytes(address.as_bytes().to_vec())
    }
}

impl From<H256> for RlpItem {
    fn from(hash: H256) -> Self {
        RlpItem::Bytes(hash.as_bytes().to_vec())
    }
}

/// Encode a value tree into canonical RLP.
pub fn encode(item: &RlpItem) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(item, &mut out);
    out
}

/// Encode `items` as a single RLP list.
pub fn encode_list(items: &[RlpItem]) -> Vec<u8> {
    let mut payload = Vec::new();
    for item in items {
        encode_into(item, &mut payload);
    }
    let mut out = Vec::with_capacity(payload.len() + 9);
    encode_header(payload.len(), LIST_OFFSET, &mut out);
    out.extend_from_slice(&payload);
    out
}

fn encode_into(item: &RlpItem, out: &mut Vec<u8>) {
    match item {
        RlpItem::Bytes(bytes) if bytes.len() == 1 && bytes[0] < STRING_OFFSET => out.push(bytes[0]),
        RlpItem::Bytes(bytes) => {
            encode_header(bytes.len(), STRING_OFFSET, out);
            out.extend_from_slice(bytes);
        }
        RlpItem::List(items) => out.extend_from_slice(&encode_list(items)),
    }
}

fn encode_header(len: usize, offset: u8, out: &mut Vec<u8>) {
    if len <= SHORT_LIMIT {
        out.push(offset + len as u8);
    } else {
        let len_bytes = u64_to_minimal_be(len as u64);
        out.push(offset + SHORT_LIMIT as u8 + len_bytes.len() as u8);
        out.extend_from_slice(&len_bytes);
    }
}

/// Decode exactly one RLP value; trailing bytes are an error.
pub fn decode(input: &[u8]) -> Result<RlpItem> {
    let (item, rest) = decode_item(input)?;
    if !rest.is_empty() {
        return Err(TxError::malformed(format!(
            "{} trailing bytes after top-level item",
            rest.len()
        )));
    }
    Ok(item)
}

/// Decode one RLP value from the front of `input`, returning the remainder.
pub fn decode_item(input: &[u8]) -> Result<(RlpItem, &[u8])> {
    decode_at_depth(input, 0)
}

fn decode_at_depth(input: &[u8], depth: usize) -> Result<(RlpItem, &[u8])> {
    if depth > MAX_DEPTH {
        return Err(TxError::malformed("list nesting too deep"));
    }
    let first = *input.first().ok_or_else(|| TxError::malformed("unexpected end of input"))?;
    let body = &input[1..];
    match first {
        0x00..=0x7f => Ok((RlpItem::Bytes(vec![first]), body)),
        0x80..=0xb7 => {
            let len = (first - STRING_OFFSET) as usize;
            let (payload, rest) = split_payload(body, len)?;
            if len == 1 && payload[0] < STRING_OFFSET {
                return Err(TxError::malformed(format!(
                    "single byte 0x{:02x} must not carry a length prefix",
                    payload[0]
                )));
            }
            Ok((RlpItem::Bytes(payload.to_vec()), rest))
        }
        0xb8..=0xbf => {
            let (len, body) = read_long_length(body, (first - 0xb7) as usize)?;
            let (payload, rest) = split_payload(body, len)?;
            Ok((RlpItem::Bytes(payload.to_vec()), rest))
        }
        0xc0..=0xf7 => {
            let len = (first - LIST_OFFSET) as usize;
            let (payload, rest) = split_payload(body, len)?;
            Ok((RlpItem::List(decode_list_payload(payload, depth)?), rest))
        }
        0xf8..=0xff => {
            let (len, body) = read_long_length(body, (first - 0xf7) as usize)?;
            let (payload, rest) = split_payload(body, len)?;
            Ok((RlpItem::List(decode_list_payload(payload, depth)?), rest))
        }
    }
}

fn decode_list_payload(mut payload: &[u8], depth: usize) -> Result<Vec<RlpItem>> {
    let mut items = Vec::new();
    while !payload.is_empty() {
        let (item, rest) = decode_at_depth(payload, depth + 1)?;
        items.push(item);
        payload = rest;
    }
    Ok(items)
}

fn read_long_length(input: &[u8], len_of_len: usize) -> Result<(usize, &[u8])> {
    let (len_bytes, rest) = split_payload(input, len_of_len)?;
    if len_bytes[0] == 0 {
        return Err(TxError::malformed("length has leading zero bytes"));
    }
    let len = minimal_be_to_u64(len_bytes)?;
    let len = usize::try_from(len)
        .map_err(|_| TxError::malformed(format!("declared length {} does not fit in memory", len)))?;
    if len <= SHORT_LIMIT {
        return Err(TxError::malformed(format!(
            "length {} must use the short header form",
            len
        )));
    }
    Ok((len, rest))
}

fn split_payload(input: &[u8], len: usize) -> Result<(&[u8], &[u8])> {
    if input.len() < len {
        return Err(TxError::malformed(format!(
            "declared length {} exceeds remaining {} bytes",
            len,
            input.len()
        )));
    }
    Ok(input.split_at(len))
}

/// Strip leading zero bytes; an all-zero input yields the empty slice.
pub fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first_non_zero = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[first_non_zero..]
}

/// Minimal big-endian bytes for an unsigned integer (no leading zeros; zero -> empty).
pub fn u64_to_minimal_be(value: u64) -> Vec<u8> {
    strip_leading_zeros(&value.to_be_bytes()).to_vec()
}

pub fn u256_to_minimal_be(value: U256) -> Vec<u8> {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    strip_leading_zeros(&buf).to_vec()
}

pub fn minimal_be_to_u64(bytes: &[u8]) -> Result<u64> {
    check_canonical_integer(bytes, 8)?;
    Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
}

pub fn minimal_be_to_u256(bytes: &[u8]) -> Result<U256> {
    check_canonical_integer(bytes, 32)?;
    Ok(U256::from_big_endian(bytes))
}

fn check_canonical_integer(bytes: &[u8], max_len: usize) -> Result<()> {
    if bytes.len() > max_len {
        return Err(TxError::malformed(format!(
            "integer of {} bytes overflows {} bits",
            bytes.len(),
            max_len * 8
        )));
    }
    if bytes.first() == Some(&0) {
        return Err(TxError::malformed("integer has leading zero bytes"));
    }
    Ok(())
}
