// src/lib.rs
//! Raw Ethereum transactions: canonical RLP, a Legacy / EIP-2930 / EIP-1559 builder and
//! signer, and a parser that validates signed payloads.

pub mod core;
pub mod crypto;
pub mod security;
pub mod utils;

pub use crate::core::{
    parse_signed_transaction, parse_signed_transaction_hex, verify_signed_transaction,
    verify_signed_transaction_hex, AccessListItem, FeeDefaults, ParsedTransaction, Result,
    SignedTransaction, TransactionBuilder, TransactionRequest, TransactionType, TxError,
    TxSignature,
};
pub use crate::security::TxSigningKey;
