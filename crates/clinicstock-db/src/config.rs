//! Runtime configuration.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. It produces the [`DbConfig`] for the pool and the settings new
//! organizations are created with.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use clinicstock_core::validation::validate_warning_days;
use clinicstock_core::{
    InventorySettings, ThresholdPolicy, DEFAULT_EXPIRATION_WARNING_DAYS,
    DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_WASTE_WINDOW_DAYS,
};

use crate::pool::DbConfig;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file (`CLINICSTOCK_DB_PATH`)
    pub database_path: PathBuf,

    /// Pool size (`CLINICSTOCK_DB_MAX_CONNECTIONS`)
    pub max_connections: u32,

    /// Warning window for new organizations (`CLINICSTOCK_DEFAULT_WARNING_DAYS`)
    pub default_warning_days: i64,

    /// Low stock floor for new organizations (`CLINICSTOCK_DEFAULT_LOW_STOCK`)
    pub default_low_stock_threshold: i64,

    /// Threshold policy for new organizations (`CLINICSTOCK_THRESHOLD_POLICY`)
    pub default_threshold_policy: ThresholdPolicy,

    /// Waste report window when the caller gives none (`CLINICSTOCK_WASTE_WINDOW_DAYS`)
    pub waste_window_days: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: PathBuf::from("./clinicstock_dev.db"),
            max_connections: 5,
            default_warning_days: DEFAULT_EXPIRATION_WARNING_DAYS,
            default_low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            default_threshold_policy: ThresholdPolicy::Truthy,
            waste_window_days: DEFAULT_WASTE_WINDOW_DAYS,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let config = AppConfig {
            database_path: lookup("CLINICSTOCK_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            max_connections: parse_or(
                &lookup,
                "CLINICSTOCK_DB_MAX_CONNECTIONS",
                defaults.max_connections,
            )?,

            default_warning_days: parse_or(
                &lookup,
                "CLINICSTOCK_DEFAULT_WARNING_DAYS",
                defaults.default_warning_days,
            )?,

            default_low_stock_threshold: parse_or(
                &lookup,
                "CLINICSTOCK_DEFAULT_LOW_STOCK",
                defaults.default_low_stock_threshold,
            )?,

            default_threshold_policy: match lookup("CLINICSTOCK_THRESHOLD_POLICY") {
                None => defaults.default_threshold_policy,
                Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                    "truthy" => ThresholdPolicy::Truthy,
                    "explicit" => ThresholdPolicy::Explicit,
                    _ => {
                        return Err(ConfigError::InvalidValue(
                            "CLINICSTOCK_THRESHOLD_POLICY".to_string(),
                        ))
                    }
                },
            },

            waste_window_days: parse_or(
                &lookup,
                "CLINICSTOCK_WASTE_WINDOW_DAYS",
                defaults.waste_window_days,
            )?,
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "CLINICSTOCK_DB_MAX_CONNECTIONS".to_string(),
            ));
        }
        if validate_warning_days(config.default_warning_days).is_err() {
            return Err(ConfigError::InvalidValue(
                "CLINICSTOCK_DEFAULT_WARNING_DAYS".to_string(),
            ));
        }
        if config.default_low_stock_threshold < 0 {
            return Err(ConfigError::InvalidValue(
                "CLINICSTOCK_DEFAULT_LOW_STOCK".to_string(),
            ));
        }
        if config.waste_window_days < 0 {
            return Err(ConfigError::InvalidValue(
                "CLINICSTOCK_WASTE_WINDOW_DAYS".to_string(),
            ));
        }

        Ok(config)
    }

    /// Pool configuration for this environment.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.max_connections)
    }

    /// Settings row for a newly created organization.
    pub fn default_settings(&self, organization_id: impl Into<String>) -> InventorySettings {
        InventorySettings {
            organization_id: organization_id.into(),
            expiration_warning_days: Some(self.default_warning_days),
            low_stock_threshold: Some(self.default_low_stock_threshold),
            threshold_policy: self.default_threshold_policy,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
