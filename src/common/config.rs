//! Configuration loading with environment variable support
//!
//! Load order: TOML file (or defaults), then `REELVAULT_*` environment
//! overrides, then validation.

use crate::config::{ShortfallPolicy, SlotConfig, StorageBackend};
use crate::errors::{ConfigurationError, SlotResult};
use std::env;
use std::path::Path;
use std::str::FromStr;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> SlotResult<SlotConfig> {
        let mut config = match self.config_path {
            Some(ref path) => self.load_from_file(path)?,
            None => SlotConfig::default(),
        };

        self.apply_overrides(&mut config, |key| env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML file
    fn load_from_file(&self, path: &str) -> SlotResult<SlotConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)).into())
    }

    /// Apply overrides from a variable lookup (the process environment in `load`)
    pub fn apply_overrides<F>(&self, config: &mut SlotConfig, lookup: F) -> SlotResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Storage overrides
        if let Some(data_dir) = lookup("REELVAULT_DATA_DIR") {
            config.storage.data_dir = data_dir;
        }
        if let Some(backend) = lookup("REELVAULT_STORAGE_BACKEND") {
            config.storage.backend = match backend.to_ascii_lowercase().as_str() {
                "memory" => StorageBackend::Memory,
                "rocksdb" => StorageBackend::Rocksdb,
                _ => {
                    return Err(ConfigurationError::InvalidValue {
                        field: "REELVAULT_STORAGE_BACKEND".to_string(),
                        value: backend,
                        reason: "Expected 'memory' or 'rocksdb'".to_string(),
                    }
                    .into())
                }
            };
        }

        // API overrides
        if let Some(host) = lookup("REELVAULT_API_HOST") {
            config.api.host = host;
        }
        if let Some(port) = lookup("REELVAULT_API_PORT") {
            config.api.port = parse_var("REELVAULT_API_PORT", port, "Invalid port number")?;
        }

        // Oracle overrides
        if let Some(max) = lookup("REELVAULT_MAX_STALENESS_SECS") {
            config.oracle.max_staleness_secs =
                parse_var("REELVAULT_MAX_STALENESS_SECS", max, "Invalid number of seconds")?;
        }

        // Ledger overrides
        if let Some(policy) = lookup("REELVAULT_SHORTFALL_POLICY") {
            config.ledger.shortfall_policy = match policy.to_ascii_lowercase().as_str() {
                "clamp" => ShortfallPolicy::Clamp,
                "reject" => ShortfallPolicy::Reject,
                _ => {
                    return Err(ConfigurationError::InvalidValue {
                        field: "REELVAULT_SHORTFALL_POLICY".to_string(),
                        value: policy,
                        reason: "Expected 'clamp' or 'reject'".to_string(),
                    }
                    .into())
                }
            };
        }

        // Table overrides
        if let Some(path) = lookup("REELVAULT_TABLE_ARTEFACT") {
            config.tables.artefact_path = Some(path);
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, config: &SlotConfig, path: &str) -> SlotResult<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to write to {}: {}", path, e)).into())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_var<T: FromStr>(field: &str, value: String, reason: &str) -> SlotResult<T> {
    value.parse().map_err(|_| {
        ConfigurationError::InvalidValue {
            field: field.to_string(),
            value,
            reason: reason.to_string(),
        }
        .into()
    })
}

/// Generate a sample configuration file
pub fn generate_sample_config(path: &str) -> SlotResult<()> {
    ConfigLoader::new().save(&SlotConfig::default(), path)
}
