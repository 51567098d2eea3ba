//! Configuration for the settlement engine

use crate::types::SplitRates;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settlement engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Ledger data directory
    pub ledger_data_dir: PathBuf,

    /// Split rate table
    pub rates: SplitRates,

    /// Deadline for one atomic settlement unit (milliseconds)
    pub settlement_deadline_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "settlement-engine".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            ledger_data_dir: PathBuf::from("./data/wallet-ledger"),
            rates: SplitRates::default(),
            settlement_deadline_ms: 5_000,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;

        config.rates.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("SETTLEMENT_LEDGER_DATA_DIR") {
            config.ledger_data_dir = PathBuf::from(data_dir);
        }

        if let Ok(deadline) = std::env::var("SETTLEMENT_DEADLINE_MS") {
            config.settlement_deadline_ms = deadline.parse().map_err(|_| {
                crate::Error::Config(format!("Invalid SETTLEMENT_DEADLINE_MS: {}", deadline))
            })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "settlement-engine");
        assert_eq!(config.settlement_deadline_ms, 5_000);
        assert_eq!(config.rates.vendor_share, Decimal::new(80, 2));
    }

    #[test]
    fn test_from_file_rejects_bad_rates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settlement.toml");

        let mut config = Config::default();
        config.rates.vendor_share = Decimal::new(120, 2); // 1.20
        std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();

        assert!(matches!(
            Config::from_file(&path),
            Err(crate::Error::InvalidRates(_))
        ));
    }

    #[test]
    fn test_from_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settlement.toml");

        let config = Config::default();
        std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.rates.driver_share, config.rates.driver_share);
        assert_eq!(loaded.settlement_deadline_ms, config.settlement_deadline_ms);
    }
}
