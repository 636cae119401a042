//! `rawtx`: build, sign and inspect raw Ethereum transactions from the command line.
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use evm_rawtx::core::parser::{parse_signed_transaction_hex, verify_signed_transaction_hex};
use evm_rawtx::utils::to_hex_prefixed;
use evm_rawtx::{FeeDefaults, TransactionBuilder, TransactionRequest, TxSigningKey};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Environment variable holding the hex private key.
const KEY_ENV: &str = "RAWTX_PRIVATE_KEY";

#[derive(Parser)]
#[command(name = "rawtx", about = "Raw Ethereum transaction builder and parser")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign a JSON transaction request with the key in RAWTX_PRIVATE_KEY
    Build {
        /// JSON file with the transaction request
        #[arg(long)]
        request: PathBuf,
        /// TOML file with default fees (wei or "<amount> <unit>")
        #[arg(long)]
        fees: Option<PathBuf>,
    },
    /// Decode a signed transaction
    Parse {
        /// Signed transaction hex, with or without 0x
        raw: String,
        /// Fail unless the transaction hash equals this value
        #[arg(long)]
        expect_hash: Option<String>,
    },
    /// Print the address of RAWTX_PRIVATE_KEY
    Address,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging()?;

    match args.command {
        Commands::Build { request, fees } => build(request, fees),
        Commands::Parse { raw, expect_hash } => parse(&raw, expect_hash.as_deref()),
        Commands::Address => {
            let key = load_key()?;
            println!("{}", to_hex_prefixed(key.address()?.as_bytes()));
            Ok(())
        }
    }
}

fn build(request_path: PathBuf, fees_path: Option<PathBuf>) -> Result<()> {
    let source = std::fs::read_to_string(&request_path)
        .with_context(|| format!("failed to read {}", request_path.display()))?;
    let request: TransactionRequest =
        serde_json::from_str(&source).context("invalid transaction request")?;

    let fees = match fees_path {
        Some(path) => FeeDefaults::load(path)?,
        None => FeeDefaults::default(),
    }
    .with_env_overrides()?;

    let key = load_key()?;
    let signed = TransactionBuilder::new(fees).build(&request, &key)?;
    info!(hash = %signed.hash_hex(), "built transaction");

    let output = serde_json::json!({
        "signedTx": signed.raw_hex(),
        "rawTxHash": signed.hash_hex(),
        "signingHash": signed.signing_hash_hex(),
        "from": to_hex_prefixed(key.address()?.as_bytes()),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn parse(raw: &str, expect_hash: Option<&str>) -> Result<()> {
    let parsed = match expect_hash {
        Some(expected) => verify_signed_transaction_hex(raw, expected)?,
        None => parse_signed_transaction_hex(raw)?,
    };
    let mut output = serde_json::to_value(&parsed)?;
    output["from"] = serde_json::Value::String(to_hex_prefixed(parsed.recover_sender()?.as_bytes()));
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_key() -> Result<TxSigningKey> {
    let raw = zeroize::Zeroizing::new(
        std::env::var(KEY_ENV).with_context(|| format!("{} is not set", KEY_ENV))?,
    );
    Ok(TxSigningKey::from_hex(&raw)?)
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout carries the JSON result
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
