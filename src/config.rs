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
const DEFAULT_PORT: u16 = 3000;
const CONFIG_DIR: &str = "config";
const DEFAULT_CURRENCY: &str = "INR";
const DEFAULT_CUSTOMER_EMAIL: &str = "user@example.com";
const DEFAULT_CUSTOMER_PHONE: &str = "9876543210";

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Payment gateway order-creation endpoint
    #[validate(length(min = 1))]
    pub payment_gateway_url: String,

    /// Client id sent to the payment gateway
    #[validate(length(min = 1))]
    pub payment_client_id: String,

    /// Client secret sent to the payment gateway
    #[validate(length(min = 1))]
    pub payment_client_secret: String,

    /// Shared secret for verifying inbound webhook signatures
    #[validate(length(min = 16))]
    pub payment_webhook_secret: String,

    /// ISO 4217 currency code submitted with payment orders
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3), custom = "validate_currency")]
    pub payment_currency: String,

    /// Customer contact metadata submitted with payment orders
    #[serde(default = "default_customer_email")]
    pub payment_customer_email: String,
    #[serde(default = "default_customer_phone")]
    pub payment_customer_phone: String,

    /// Outbound gateway request timeout (seconds)
    #[serde(default = "default_payment_request_timeout_secs")]
    pub payment_request_timeout_secs: u64,
}

impl AppConfig {
    /// Gets database URL reference
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Creates a new configuration with defaults for everything not passed in
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        database_url: String,
        host: String,
        port: u16,
        environment: String,
        payment_gateway_url: String,
        payment_client_id: String,
        payment_client_secret: String,
        payment_webhook_secret: String,
    ) -> Self {
        Self {
            database_url,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            payment_gateway_url,
            payment_client_id,
            payment_client_secret,
            payment_webhook_secret,
            payment_currency: default_currency(),
            payment_customer_email: default_customer_email(),
            payment_customer_phone: default_customer_phone(),
            payment_request_timeout_secs: default_payment_request_timeout_secs(),
        }
    }

    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Returns true if explicit CORS origins are configured
    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_ref()
            .map(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
            .unwrap_or(false)
    }

    /// Whether we should fall back to permissive CORS
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_max_connections() -> u32 {
    16
}
fn default_db_min_connections() -> u32 {
    2
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_customer_email() -> String {
    DEFAULT_CUSTOMER_EMAIL.to_string()
}

fn default_customer_phone() -> String {
    DEFAULT_CUSTOMER_PHONE.to_string()
}

fn default_payment_request_timeout_secs() -> u64 {
    10
}

fn validate_currency(currency: &str) -> Result<(), ValidationError> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("currency");
        err.message = Some("Currency must be a 3-letter ISO code".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("cartpay_api={},tower_http=debug", level);
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
/// 2. Environment-specific config (config/{env}.toml)
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

    // NOTE: the gateway credentials and the webhook secret have no defaults -
    // they MUST be provided via environment variables or a config file.
    let config = Config::builder()
        .set_default("database_url", "sqlite://cartpay.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    for key in [
        "payment_gateway_url",
        "payment_client_id",
        "payment_client_secret",
        "payment_webhook_secret",
    ] {
        if config.get_string(key).is_err() {
            error!(
                "{} is not configured. Set APP__{} or add it to a config file.",
                key,
                key.to_uppercase()
            );
            return Err(AppConfigError::Load(ConfigError::NotFound(format!(
                "{} is required but not configured",
                key
            ))));
        }
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            3000,
            "production".into(),
            "https://gateway.test/api/v1/order/create".into(),
            "client_id".into(),
            "client_secret".into(),
            "a_sufficiently_long_webhook_secret".into(),
        )
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn short_webhook_secret_fails_validation() {
        let mut cfg = base_config();
        cfg.payment_webhook_secret = "short".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn non_alphabetic_currency_fails_validation() {
        let mut cfg = base_config();
        cfg.payment_currency = "U5D".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn four_letter_currency_fails_validation() {
        let mut cfg = base_config();
        cfg.payment_currency = "EURO".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn production_without_origins_is_not_permissive() {
        let cfg = base_config();
        assert!(!cfg.should_allow_permissive_cors());
        assert!(!cfg.has_cors_allowed_origins());
    }

    #[test]
    fn development_is_permissive_by_default() {
        let mut cfg = base_config();
        cfg.environment = "development".into();
        assert!(cfg.should_allow_permissive_cors());
    }

    #[test]
    fn explicit_origins_are_detected() {
        let mut cfg = base_config();
        cfg.cors_allowed_origins = Some("https://shop.example.com".into());
        assert!(cfg.has_cors_allowed_origins());
    }

    #[test]
    fn blank_origin_list_is_ignored() {
        let mut cfg = base_config();
        cfg.cors_allowed_origins = Some(" , ".into());
        assert!(!cfg.has_cors_allowed_origins());
    }
}
