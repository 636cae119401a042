use std::path::Path;

use ethers::types::U256;
use ethers::utils::parse_units;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::errors::{Result, TxError};
use super::transaction::{TransactionRequest, TransactionType};

pub const ENV_LEGACY_GAS_PRICE: &str = "RAWTX_LEGACY_GAS_PRICE";
pub const ENV_ACCESS_LIST_GAS_PRICE: &str = "RAWTX_ACCESS_LIST_GAS_PRICE";
pub const ENV_MAX_FEE_PER_GAS: &str = "RAWTX_MAX_FEE_PER_GAS";
pub const ENV_MAX_PRIORITY_FEE_PER_GAS: &str = "RAWTX_MAX_PRIORITY_FEE_PER_GAS";

/// Fallback fee values applied when a request leaves a fee field unset.
///
/// These are environment policy, not protocol constants. All values are in wei; in TOML
/// they may be written as integers (`300`), hex strings (`"0x12c"`) or amounts with a
/// unit (`"0.0000003 gwei"`, `"30 gwei"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeDefaults {
    /// Legacy `gasPrice` (wei)
    #[serde(default = "FeeDefaults::default_legacy_gas_price", with = "wei")]
    pub legacy_gas_price: U256,

    /// EIP-2930 `gasPrice` (wei)
    #[serde(default = "FeeDefaults::default_access_list_gas_price", with = "wei")]
    pub access_list_gas_price: U256,

    /// EIP-1559 `maxFeePerGas` (wei)
    #[serde(default = "FeeDefaults::default_max_fee_per_gas", with = "wei")]
    pub max_fee_per_gas: U256,

    /// EIP-1559 `maxPriorityFeePerGas` (wei)
    #[serde(default = "FeeDefaults::default_max_priority_fee_per_gas", with = "wei")]
    pub max_priority_fee_per_gas: U256,
}

impl FeeDefaults {
    // 0.0000003 gwei
    fn default_legacy_gas_price() -> U256 { U256::from(300u64) }
    // 30 gwei
    fn default_access_list_gas_price() -> U256 { U256::from(30_000_000_000u64) }
    // 0.0000003 gwei
    fn default_max_fee_per_gas() -> U256 { U256::from(300u64) }
    // 0.00000001 gwei
    fn default_max_priority_fee_per_gas() -> U256 { U256::from(10u64) }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| TxError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }

    /// Apply `RAWTX_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary lookup (environment, CLI flags, tests).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let slots: [(&str, &mut U256); 4] = [
            (ENV_LEGACY_GAS_PRICE, &mut self.legacy_gas_price),
            (ENV_ACCESS_LIST_GAS_PRICE, &mut self.access_list_gas_price),
            (ENV_MAX_FEE_PER_GAS, &mut self.max_fee_per_gas),
            (ENV_MAX_PRIORITY_FEE_PER_GAS, &mut self.max_priority_fee_per_gas),
        ];
        for (name, slot) in slots {
            if let Some(raw) = lookup(name) {
                *slot = parse_wei(&raw).map_err(|e| TxError::Config(format!("{}: {}", name, e)))?;
            }
        }
        Ok(self)
    }

    /// Fill unset fee fields of `request` for its type. Supplied values always win; a fee
    /// field the type does not carry is `InvalidInput`.
    pub fn apply(&self, request: &mut TransactionRequest) -> Result<()> {
        let fees = &mut request.fees;
        match request.tx_type {
            TransactionType::Legacy | TransactionType::Eip2930 => {
                if fees.max_fee_per_gas.is_some() || fees.max_priority_fee_per_gas.is_some() {
                    return Err(TxError::invalid(format!(
                        "{} takes gasPrice, not maxFeePerGas/maxPriorityFeePerGas",
                        request.tx_type.name()
                    )));
                }
                let default = match request.tx_type {
                    TransactionType::Legacy => self.legacy_gas_price,
                    _ => self.access_list_gas_price,
                };
                fees.gas_price.get_or_insert(default);
            }
            TransactionType::Eip1559 => {
                if fees.gas_price.is_some() {
                    return Err(TxError::invalid(format!(
                        "{} takes maxFeePerGas/maxPriorityFeePerGas, not gasPrice",
                        request.tx_type.name()
                    )));
                }
                fees.max_fee_per_gas.get_or_insert(self.max_fee_per_gas);
                fees.max_priority_fee_per_gas.get_or_insert(self.max_priority_fee_per_gas);
            }
            TransactionType::Eip4844 => {
                return Err(TxError::unsupported(format!(
                    "{} is not implemented",
                    request.tx_type.name()
                )))
            }
        }
        Ok(())
    }
}

impl Default for FeeDefaults {
    fn default() -> Self {
        Self {
            legacy_gas_price: Self::default_legacy_gas_price(),
            access_list_gas_price: Self::default_access_list_gas_price(),
            max_fee_per_gas: Self::default_max_fee_per_gas(),
            max_priority_fee_per_gas: Self::default_max_priority_fee_per_gas(),
        }
    }
}

/// Parse a wei amount: decimal, `0x` hex, or `"<amount> <unit>"`.
pub fn parse_wei(raw: &str) -> Result<U256> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TxError::invalid("empty fee amount"));
    }
    if let Some((amount, unit)) = raw.split_once(char::is_whitespace) {
        let parsed = parse_units(amount.trim(), unit.trim())
            .map_err(|e| TxError::invalid(format!("invalid amount '{}': {}", raw, e)))?;
        return Ok(parsed.into());
    }
    if let Some(hex_digits) = raw.strip_prefix("0x") {
        return U256::from_str_radix(hex_digits, 16)
            .map_err(|e| TxError::invalid(format!("invalid hex amount '{}': {:?}", raw, e)));
    }
    U256::from_dec_str(raw).map_err(|e| TxError::invalid(format!("invalid amount '{}': {:?}", raw, e)))
}

mod wei {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Int(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<U256, D::Error> {
        match RawAmount::deserialize(deserializer)? {
            RawAmount::Int(v) => Ok(U256::from(v)),
            RawAmount::Text(s) => parse_wei(&s).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_in_wei() {
        let fees = FeeDefaults::default();
        assert_eq!(fees.legacy_gas_price, U256::from(300u64));
        assert_eq!(fees.access_list_gas_price, U256::from(30_000_000_000u64));
        assert_eq!(fees.max_fee_per_gas, U256::from(300u64));
        assert_eq!(fees.max_priority_fee_per_gas, U256::from(10u64));
    }

    #[test]
    fn test_parse_wei_forms() {
        assert_eq!(parse_wei("300").unwrap(), U256::from(300u64));
        assert_eq!(parse_wei("0x12c").unwrap(), U256::from(300u64));
        assert_eq!(parse_wei("30 gwei").unwrap(), U256::from(30_000_000_000u64));
        assert_eq!(parse_wei("0.0000003 gwei").unwrap(), U256::from(300u64));
        assert_eq!(parse_wei("0.5 gwei").unwrap(), U256::from(500_000_000u64));
        assert!(parse_wei("").is_err());
        assert!(parse_wei("ten").is_err());
        assert!(parse_wei("1 parsec").is_err());
    }

    #[test]
    fn test_from_toml_partial() {
        let fees = FeeDefaults::from_toml_str(
            r#"
            max_fee_per_gas = "0.5 gwei"
            legacy_gas_price = 1000
            "#,
        )
        .unwrap();
        assert_eq!(fees.max_fee_per_gas, U256::from(500_000_000u64));
        assert_eq!(fees.legacy_gas_price, U256::from(1000u64));
        assert_eq!(fees.max_priority_fee_per_gas, U256::from(10u64));
    }

    #[test]
    fn test_from_toml_invalid_value() {
        let err = FeeDefaults::from_toml_str(r#"max_fee_per_gas = "lots""#).unwrap_err();
        assert!(matches!(err, TxError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fees.toml");
        std::fs::write(&path, "access_list_gas_price = \"1 gwei\"\n").unwrap();
        let fees = FeeDefaults::load(&path).unwrap();
        assert_eq!(fees.access_list_gas_price, U256::from(1_000_000_000u64));
        assert!(matches!(FeeDefaults::load(dir.path().join("missing.toml")), Err(TxError::Config(_))));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> =
            [(ENV_MAX_PRIORITY_FEE_PER_GAS, "2 gwei"), (ENV_LEGACY_GAS_PRICE, "0x01")].into();
        let fees = FeeDefaults::default()
            .with_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(fees.max_priority_fee_per_gas, U256::from(2_000_000_000u64));
        assert_eq!(fees.legacy_gas_price, U256::one());
        assert_eq!(fees.max_fee_per_gas, U256::from(300u64));

        let err = FeeDefaults::default()
            .with_overrides(|name| (name == ENV_MAX_FEE_PER_GAS).then(|| "nope".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_FEE_PER_GAS));
    }

    #[test]
    fn test_apply_keeps_supplied_values() {
        let fees = FeeDefaults::default();
        let mut legacy = TransactionRequest::new(TransactionType::Legacy, 1).gas_price(7u64);
        fees.apply(&mut legacy).unwrap();
        assert_eq!(legacy.fees.gas_price, Some(U256::from(7u64)));

        let mut eip1559 = TransactionRequest::new(TransactionType::Eip1559, 1).max_fee_per_gas(99u64);
        fees.apply(&mut eip1559).unwrap();
        assert_eq!(eip1559.fees.max_fee_per_gas, Some(U256::from(99u64)));
        assert_eq!(eip1559.fees.max_priority_fee_per_gas, Some(U256::from(10u64)));
        assert_eq!(eip1559.fees.gas_price, None);

        let mut eip2930 = TransactionRequest::new(TransactionType::Eip2930, 1);
        fees.apply(&mut eip2930).unwrap();
        assert_eq!(eip2930.fees.gas_price, Some(U256::from(30_000_000_000u64)));
    }

    #[test]
    fn test_apply_rejects_foreign_fee_fields() {
        let fees = FeeDefaults::default();
        let mut eip1559 = TransactionRequest::new(TransactionType::Eip1559, 1).gas_price(1u64);
        assert!(matches!(fees.apply(&mut eip1559), Err(TxError::InvalidInput(_))));

        let mut legacy = TransactionRequest::new(TransactionType::Legacy, 1).max_fee_per_gas(1u64);
        assert!(matches!(fees.apply(&mut legacy), Err(TxError::InvalidInput(_))));

        let mut eip2930 =
            TransactionRequest::new(TransactionType::Eip2930, 1).max_priority_fee_per_gas(1u64);
        assert!(matches!(fees.apply(&mut eip2930), Err(TxError::InvalidInput(_))));
    }

    #[test]
    fn test_apply_rejects_blob_transactions() {
        let mut request = TransactionRequest::new(TransactionType::Eip4844, 1);
        assert!(matches!(
            FeeDefaults::default().apply(&mut request),
            Err(TxError::UnsupportedTransactionType(_))
        ));
    }
}
