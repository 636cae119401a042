// src/security/mod.rs
//! Key handling. Private keys live in `secrecy` containers and are only exposed to a
//! closure for the duration of one signing call.

pub mod secret;

pub use secret::TxSigningKey;
