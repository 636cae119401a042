use thiserror::Error;

/// Error type for transaction encoding, signing and parsing.
#[derive(Debug, Error)]
pub enum TxError {
    /// Unknown transaction type, or a declared type this crate does not build (EIP-4844).
    #[error("Unsupported transaction type: {0}")]
    UnsupportedTransactionType(String),
    /// RLP decode failure or an internally inconsistent payload.
    #[error("Malformed encoding: {0}")]
    MalformedEncoding(String),
    /// The hash recomputed from a signed payload differs from the expected one.
    #[error("Hash mismatch: expected {expected}, computed {actual}")]
    HashMismatch { expected: String, actual: String },
    /// Raised by the secp256k1 primitive (bad key material, unrecoverable signature).
    #[error("Signing failed: {0}")]
    Signing(#[from] secp256k1::Error),
    /// Malformed caller input at the presentation boundary (hex, addresses, keys).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Fee configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TxError>;

impl TxError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        TxError::MalformedEncoding(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        TxError::UnsupportedTransactionType(message.into())
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        TxError::InvalidInput(message.into())
    }

    /// Errors that indicate the produced or received bytes cannot be trusted.
    pub fn is_encoding_regression(&self) -> bool {
        matches!(self, TxError::MalformedEncoding(_) | TxError::HashMismatch { .. })
    }
}

impl From<hex::FromHexError> for TxError {
    fn from(err: hex::FromHexError) -> Self {
        TxError::InvalidInput(format!("invalid hex: {}", err))
    }
}

impl From<toml::de::Error> for TxError {
    fn from(err: toml::de::Error) -> Self {
        TxError::Config(err.to_string())
    }
}

impl From<std::io::Error> for TxError {
    fn from(err: std::io::Error) -> Self {
        TxError::Config(err.to_string())
    }
}
