//! Configuration for the migration service
//!
//! Every section deserializes with defaults, so a config file only needs the
//! values it changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::warn;

use crate::services::client::region::ApiEndpoints;
use crate::services::client::retry::RetryPolicy;
use crate::services::errors::{MigrationError, MigrationResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub network: NetworkConfig,
    pub retry: RetryPolicy,
    pub concurrency: ConcurrencyConfig,
    pub migration: MigrationDefaults,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub user_agent: String,
    /// Platform domain the region hosts are derived from
    pub base_domain: String,
    /// Fixed endpoints used instead of the region table
    pub endpoint_override: Option<ApiEndpoints>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    /// Tenants processed at once within one batch (1 = strictly sequential)
    pub max_concurrent_tenants: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationDefaults {
    pub allow_cross_region: bool,
    pub tenant_type: String,
    /// Role forced onto the created tenant's administrator
    pub admin_role: String,
    /// Expiration = effective date + this many days when the source has none
    pub service_term_days: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Location of the saved account collection
    pub accounts_path: Option<PathBuf>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
            user_agent: "tenant-migration-service/1.0".to_string(),
            base_domain: "ruckus.cloud".to_string(),
            endpoint_override: None,
        }
    }
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tenants: 1,
        }
    }
}

impl Default for MigrationDefaults {
    fn default() -> Self {
        Self {
            allow_cross_region: false,
            tenant_type: "MSP_EC".to_string(),
            admin_role: "PRIME_ADMIN".to_string(),
            service_term_days: 365,
        }
    }
}

impl MigrationConfig {
    /// Load a JSON config file
    pub fn from_file(path: &Path) -> MigrationResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| MigrationError::Configuration {
            field: "path".to_string(),
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;

        let config: MigrationConfig =
            serde_json::from_str(&contents).map_err(|e| MigrationError::Configuration {
                field: "contents".to_string(),
                message: format!("Failed to parse {}: {}", path.display(), e),
            })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MigrationResult<()> {
        if self.concurrency.max_concurrent_tenants == 0 {
            return Err(invalid("concurrency.max_concurrent_tenants", "must be greater than 0"));
        }

        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts", "must be greater than 0"));
        }

        if self.network.request_timeout_ms == 0 {
            return Err(invalid("network.request_timeout_ms", "must be greater than 0"));
        }

        if self.network.base_domain.trim().is_empty() {
            return Err(invalid("network.base_domain", "must not be empty"));
        }

        if self.migration.admin_role.trim().is_empty() {
            return Err(invalid("migration.admin_role", "must not be empty"));
        }

        if self.migration.service_term_days == 0 {
            return Err(invalid("migration.service_term_days", "must be greater than 0"));
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> MigrationError {
    MigrationError::Configuration {
        field: field.to_string(),
        message: message.to_string(),
    }
}

static GLOBAL_CONFIG: OnceLock<MigrationConfig> = OnceLock::new();

/// Install the process-wide configuration; invalid configs fall back to defaults.
/// Returns false when a configuration was already installed.
pub fn init_global_config(config: MigrationConfig) -> bool {
    let config = match config.validate() {
        Ok(()) => config,
        Err(e) => {
            warn!("Invalid configuration: {} - using defaults", e);
            MigrationConfig::default()
        }
    };
    GLOBAL_CONFIG.set(config).is_ok()
}

/// Get the global configuration, initialized with defaults on first access
pub fn get_global_config() -> MigrationConfig {
    GLOBAL_CONFIG.get_or_init(MigrationConfig::default).clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::client::retry::BackoffStrategy;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = MigrationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.concurrency.max_concurrent_tenants, 1);
        assert!(!config.migration.allow_cross_region);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "retry": {{"max_attempts": 3, "backoff": {{"type": "constant", "delay_ms": 250}}}},
                "network": {{"endpoint_override": {{"auth_base": "http://localhost:8080", "api_base": "http://localhost:8081"}}}}
            }}"#
        )
        .unwrap();

        let config = MigrationConfig::from_file(file.path()).unwrap();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.backoff, BackoffStrategy::Constant { delay_ms: 250 });
        assert_eq!(config.network.request_timeout_ms, 30_000);
        assert_eq!(
            config.network.endpoint_override.unwrap().api_base,
            "http://localhost:8081"
        );
        assert_eq!(config.migration.admin_role, "PRIME_ADMIN");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = MigrationConfig::default();
        config.concurrency.max_concurrent_tenants = 0;
        assert!(matches!(
            config.validate(),
            Err(MigrationError::Configuration { ref field, .. }) if field == "concurrency.max_concurrent_tenants"
        ));

        let mut config = MigrationConfig::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = MigrationConfig::from_file(Path::new("/nonexistent/migrator.json")).unwrap_err();
        assert!(matches!(err, MigrationError::Configuration { .. }));
    }
}
