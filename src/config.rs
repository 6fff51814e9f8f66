use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::chemical::{DEFAULT_EXPIRING_SOON_DAYS, DEFAULT_LOW_STOCK_THRESHOLD};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_DATABASE_URL: &str = "sqlite://chem_inventory.db?mode=rwc";
const CONFIG_DIR: &str = "config";

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL (any sea-orm backend)
    #[validate(length(min = 1))]
    pub database_url: String,

    /// Application environment
    #[validate(length(min = 1))]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    #[validate(range(min = 1))]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,

    /// Create missing tables on startup
    #[serde(default = "default_true_bool")]
    pub auto_create_schema: bool,

    /// Deadline for every call to the record store
    #[serde(default = "default_remote_timeout_ms")]
    #[validate(range(min = 1))]
    pub remote_timeout_ms: u64,

    /// Fraction of the initial stock below which a chemical is low
    #[serde(default = "default_low_stock_threshold")]
    #[validate(custom = "validate_low_stock_threshold")]
    pub low_stock_threshold: f64,

    #[serde(default = "default_expiring_soon_days")]
    #[validate(range(min = 0, max = 3650))]
    pub expiring_soon_days: i64,

    /// Event channel capacity
    #[serde(default = "default_event_channel_capacity")]
    #[validate(custom = "validate_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            environment: DEFAULT_ENV.to_string(),
            log_level: default_log_level(),
            log_json: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            auto_create_schema: default_true_bool(),
            remote_timeout_ms: default_remote_timeout_ms(),
            low_stock_threshold: default_low_stock_threshold(),
            expiring_soon_days: default_expiring_soon_days(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl AppConfig {
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.db_min_connections > self.db_max_connections {
            let mut err = ValidationError::new("db_min_connections");
            err.message = Some("db_min_connections must not exceed db_max_connections".into());
            errors.add("db_min_connections", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_db_max_connections() -> u32 {
    5
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_true_bool() -> bool {
    true
}

fn default_remote_timeout_ms() -> u64 {
    5_000
}

fn default_low_stock_threshold() -> f64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

fn default_expiring_soon_days() -> i64 {
    DEFAULT_EXPIRING_SOON_DAYS
}

fn default_event_channel_capacity() -> usize {
    256
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_low_stock_threshold(threshold: f64) -> Result<(), ValidationError> {
    if !threshold.is_finite() || threshold <= 0.0 || threshold > 1.0 {
        let mut err = ValidationError::new("low_stock_threshold");
        err.message = Some("low_stock_threshold must be greater than 0.0 and at most 1.0".into());
        return Err(err);
    }
    Ok(())
}

fn validate_event_channel_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity == 0 {
        let mut err = ValidationError::new("event_channel_capacity");
        err.message = Some("event_channel_capacity must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("chem_inventory={},sea_orm=warn", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Default config (config/default.toml)
/// 2. Environment-specific config (config/{env}.toml), picked by RUN_ENV or APP_ENV
/// 3. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    load_config_from(Path::new(CONFIG_DIR), &run_env)
}

/// Same layering as [`load_config`], reading files from `dir` for profile `run_env`.
pub fn load_config_from(dir: &Path, run_env: &str) -> Result<AppConfig, AppConfigError> {
    let default_file = dir.join("default");
    let profile_file = dir.join(run_env);

    let config = Config::builder()
        .set_default("database_url", DEFAULT_DATABASE_URL)?
        .set_default("environment", run_env)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&default_file.to_string_lossy()).required(false))
        .add_source(File::with_name(&profile_file.to_string_lossy()).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_dir(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(temp_dir.path().join(name), content).unwrap();
        }
        temp_dir
    }

    #[test]
    fn defaults_apply_without_files() {
        let dir = config_dir(&[]);
        let config = load_config_from(dir.path(), "test").unwrap();

        assert_eq!(config.environment, "test");
        assert_eq!(config.remote_timeout(), Duration::from_secs(5));
        assert_eq!(config.low_stock_threshold, 0.10);
        assert_eq!(config.expiring_soon_days, 30);
        assert!(config.auto_create_schema);
    }

    #[test]
    fn profile_file_overrides_default_file() {
        let dir = config_dir(&[
            (
                "default.toml",
                "database_url = \"sqlite::memory:\"\nremote_timeout_ms = 2500\n",
            ),
            ("staging.toml", "remote_timeout_ms = 750\nlog_json = true\n"),
        ]);
        let config = load_config_from(dir.path(), "staging").unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.remote_timeout_ms, 750);
        assert!(config.log_json);
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let dir = config_dir(&[(
            "default.toml",
            "low_stock_threshold = 1.5\nlog_level = \"loud\"\n",
        )]);
        let result = load_config_from(dir.path(), "test");

        assert!(matches!(result, Err(AppConfigError::Validation(_))));
        if let Err(AppConfigError::Validation(errors)) = result {
            assert!(errors.field_errors().contains_key("low_stock_threshold"));
            assert!(errors.field_errors().contains_key("log_level"));
        }
    }

    #[test]
    fn custom_validators_reject_zero_capacity_and_threshold() {
        let config = AppConfig {
            low_stock_threshold: 0.0,
            event_channel_capacity: 0,
            ..AppConfig::default()
        };
        let errors = config.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("low_stock_threshold"));
        assert!(errors.field_errors().contains_key("event_channel_capacity"));
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn pool_bounds_must_be_ordered() {
        let config = AppConfig {
            db_min_connections: 8,
            db_max_connections: 2,
            ..AppConfig::default()
        };
        assert!(config.validate().is_ok());
        assert!(config.validate_additional_constraints().is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = config_dir(&[("default.toml", "jwt_secret = \"nope\"\n")]);
        assert!(matches!(
            load_config_from(dir.path(), "test"),
            Err(AppConfigError::Load(_))
        ));
    }
}
