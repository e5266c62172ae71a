//! Pack station configuration
//!
//! Loaded from a JSON file or assembled with [`PackingConfigBuilder`].

pub mod builder;

pub use builder::PackingConfigBuilder;

use crate::error::{PackingError, PackingResult};
use crate::logger::LogLevel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Carrier integration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierConfig {
    pub name: String,

    /// Upper bound on a single shipment request
    pub timeout_ms: u64,
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// Pack station configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingConfig {
    #[serde(default)]
    pub carrier: CarrierConfig,

    /// Age after which a cart lock may be taken over; locks never expire when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_lock_ttl_secs: Option<u64>,

    /// Directory for file-backed checkpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_dir: Option<PathBuf>,

    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            carrier: CarrierConfig::default(),
            cart_lock_ttl_secs: None,
            checkpoint_dir: None,
            log_level: LogLevel::Info,
        }
    }
}

impl PackingConfig {
    /// Start building a config from defaults
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::new()
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> PackingResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            PackingError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            PackingError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> PackingResult<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> PackingResult<()> {
        if self.carrier.name.trim().is_empty() {
            return Err(PackingError::ConfigError(
                "carrier name must not be empty".to_string(),
            ));
        }
        if self.carrier.timeout_ms == 0 {
            return Err(PackingError::ConfigError(
                "carrier timeout must be positive".to_string(),
            ));
        }
        if self.cart_lock_ttl_secs == Some(0) {
            return Err(PackingError::ConfigError(
                "cart lock TTL must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn carrier_timeout(&self) -> Duration {
        Duration::from_millis(self.carrier.timeout_ms)
    }

    pub fn cart_lock_ttl(&self) -> Option<Duration> {
        self.cart_lock_ttl_secs.map(Duration::from_secs)
    }

    /// Install the global log subscriber at the configured level
    pub fn init_logging(&self) -> PackingResult<()> {
        crate::logger::init_logging(self.log_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = PackingConfig::default();

        assert_eq!(config.carrier_timeout(), Duration::from_secs(30));
        assert_eq!(config.cart_lock_ttl(), None);
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("packing.json");
        fs::write(&path, r#"{"cartLockTtlSecs": 900, "logLevel": "debug"}"#).unwrap();

        let config = PackingConfig::load(&path).unwrap();

        assert_eq!(config.cart_lock_ttl(), Some(Duration::from_secs(900)));
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.carrier, CarrierConfig::default());
    }

    #[test]
    fn test_load_rejects_zero_timeout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("packing.json");
        fs::write(&path, r#"{"carrier": {"name": "ups", "timeoutMs": 0}}"#).unwrap();

        let result = PackingConfig::load(&path);
        assert!(matches!(result, Err(PackingError::ConfigError(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = PackingConfig::load(dir.path().join("absent.json"));
        assert!(matches!(result, Err(PackingError::ConfigError(_))));
    }

    #[test]
    fn test_init_logging_installs_once() {
        let config = PackingConfig::builder()
            .log_level(LogLevel::Warn)
            .build()
            .unwrap();

        let _ = config.init_logging();
        assert!(matches!(
            config.init_logging(),
            Err(PackingError::ConfigError(_))
        ));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("packing.json");
        let config = PackingConfig {
            checkpoint_dir: Some(dir.path().join("checkpoints")),
            ..PackingConfig::default()
        };

        config.save(&path).unwrap();
        assert_eq!(PackingConfig::load(&path).unwrap(), config);
    }
}
