use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_STORE_BACKEND: &str = "in-memory";
const DEFAULT_TABLE_NAME: &str = "Inventory";
const DEFAULT_LOCATION_INDEX: &str = "LocationIndex";
const DEFAULT_STORE_PAGE_SIZE: usize = crate::store::memory::DEFAULT_PAGE_SIZE;

/// Which inventory table implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    DynamoDb,
}

impl StoreBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "in-memory" | "memory" => Some(Self::InMemory),
            "dynamodb" => Some(Self::DynamoDb),
            _ => None,
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Table backend: "in-memory" or "dynamodb"
    #[serde(default = "default_store_backend")]
    #[validate(custom = "validate_store_backend")]
    pub store_backend: String,

    /// Name of the inventory table
    #[serde(default = "default_table_name")]
    #[validate(length(min = 1))]
    pub table_name: String,

    /// Name of the secondary index keyed by `location_id`
    #[serde(default = "default_location_index")]
    #[validate(length(min = 1))]
    pub location_index_name: String,

    /// Records per page for the in-memory table
    #[serde(default = "default_store_page_size")]
    #[validate(range(min = 1, max = 1000))]
    pub store_page_size: usize,

    /// CORS: comma-separated list of allowed origins. Unset allows any origin.
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            store_backend: default_store_backend(),
            table_name: default_table_name(),
            location_index_name: default_location_index(),
            store_page_size: default_store_page_size(),
            cors_allowed_origins: None,
        }
    }
}

impl AppConfig {
    /// Returns true when running in development
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Parsed table backend. Falls back to in-memory for values that slipped
    /// past validation.
    pub fn store_backend(&self) -> StoreBackend {
        StoreBackend::parse(&self.store_backend).unwrap_or(StoreBackend::InMemory)
    }

    /// Allowed CORS origins, or `None` when any origin is allowed.
    pub fn cors_origins(&self) -> Option<Vec<String>> {
        let origins: Vec<String> = self
            .cors_allowed_origins
            .as_deref()?
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();
        if origins.is_empty() {
            None
        } else {
            Some(origins)
        }
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Default value functions
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_store_backend() -> String {
    DEFAULT_STORE_BACKEND.to_string()
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

fn default_location_index() -> String {
    DEFAULT_LOCATION_INDEX.to_string()
}

fn default_store_page_size() -> usize {
    DEFAULT_STORE_PAGE_SIZE
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

fn validate_store_backend(value: &str) -> Result<(), ValidationError> {
    match StoreBackend::parse(value) {
        Some(_) => Ok(()),
        None => {
            let mut err = ValidationError::new("store_backend");
            err.message = Some("Must be one of: in-memory, dynamodb".into());
            Err(err)
        }
    }
}

pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("inventory_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);
    let filter = EnvFilter::new(filter_directive);

    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml), env from RUN_ENV or APP_ENV
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
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

/// Loads configuration from `config_dir` for the `run_env` profile.
pub fn load_config_from(config_dir: &Path, run_env: &str) -> Result<AppConfig, AppConfigError> {
    let config = Config::builder()
        .set_default("host", DEFAULT_HOST)?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", run_env)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&config_dir.join("default").to_string_lossy()).required(false))
        .add_source(File::with_name(&config_dir.join(run_env).to_string_lossy()).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!(
        environment = %app_config.environment,
        store_backend = %app_config.store_backend,
        "Configuration loaded successfully"
    );
    Ok(app_config)
}
