use super::{CarrierConfig, PackingConfig};
use crate::error::{PackingError, PackingResult};
use crate::logger::LogLevel;
use std::path::PathBuf;

/// Builder for constructing PackingConfig instances with a fluent API
///
/// # Example
/// ```
/// use packstation_lib::config::PackingConfigBuilder;
/// use packstation_lib::logger::LogLevel;
///
/// let config = PackingConfigBuilder::new()
///     .carrier_name("ups")
///     .carrier_timeout_ms(5_000)
///     .cart_lock_ttl_secs(900)
///     .log_level(LogLevel::Debug)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Default)]
pub struct PackingConfigBuilder {
    carrier_name: Option<String>,
    carrier_timeout_ms: Option<u64>,
    cart_lock_ttl_secs: Option<u64>,
    checkpoint_dir: Option<PathBuf>,
    log_level: Option<LogLevel>,
}

impl PackingConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn carrier_name(mut self, name: impl Into<String>) -> Self {
        self.carrier_name = Some(name.into());
        self
    }

    pub fn carrier_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.carrier_timeout_ms = Some(timeout_ms);
        self
    }

    /// Let cart locks older than this many seconds be taken over
    pub fn cart_lock_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.cart_lock_ttl_secs = Some(ttl_secs);
        self
    }

    pub fn checkpoint_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = Some(dir.into());
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Build the PackingConfig instance
    ///
    /// # Errors
    /// Returns `PackingError::BuilderError` if a value is out of range
    pub fn build(self) -> PackingResult<PackingConfig> {
        let defaults = CarrierConfig::default();

        let carrier = CarrierConfig {
            name: self.carrier_name.unwrap_or(defaults.name),
            timeout_ms: self.carrier_timeout_ms.unwrap_or(defaults.timeout_ms),
        };

        if carrier.name.trim().is_empty() {
            return Err(PackingError::BuilderError(
                "carrier name must not be empty".to_string(),
            ));
        }
        if carrier.timeout_ms == 0 {
            return Err(PackingError::BuilderError(
                "carrier timeout must be positive".to_string(),
            ));
        }
        if self.cart_lock_ttl_secs == Some(0) {
            return Err(PackingError::BuilderError(
                "cart lock TTL must be positive".to_string(),
            ));
        }

        Ok(PackingConfig {
            carrier,
            cart_lock_ttl_secs: self.cart_lock_ttl_secs,
            checkpoint_dir: self.checkpoint_dir,
            log_level: self.log_level.unwrap_or_default(),
        })
    }
}
