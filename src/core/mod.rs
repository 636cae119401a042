pub mod builder;
pub mod config;
pub mod errors;
pub mod parser;
pub mod rlp;
pub mod transaction;

pub use builder::{SignedTransaction, TransactionBuilder};
pub use config::FeeDefaults;
pub use errors::{Result, TxError};
pub use parser::{
    parse_signed_transaction, parse_signed_transaction_hex, verify_signed_transaction,
    verify_signed_transaction_hex, ParsedTransaction,
};
pub use transaction::{AccessListItem, FeeInputs, TransactionRequest, TransactionType, TxField, TxSignature};
