//! Application configuration structs
//!
//! Sources are layered in order: serde defaults, an optional TOML file, then
//! environment variables such as `RELAY_TELEGRAM__TOKEN`.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Config, Environment, File};
use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_VAR: &str = "RELAY_CONFIG";
/// File read when `RELAY_CONFIG` is unset; a missing file is not an error
pub const DEFAULT_CONFIG_PATH: &str = "config/relay.toml";
/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "RELAY";

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub telegram: TelegramConfig,
    #[validate(nested)]
    pub database: DatabaseConfig,
    #[serde(default)]
    #[validate(nested)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    #[validate(nested)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Bot API connection and staff group identity
#[derive(Clone, Deserialize, Validate)]
pub struct TelegramConfig {
    #[validate(length(min = 1))]
    pub token: String,
    /// Forum supergroup that hosts one topic per user
    pub staff_chat_id: i64,
    /// The only account allowed to run admin commands
    pub admin_id: i64,
    /// Lifetime of a verification code in seconds
    #[serde(default = "default_verify_ttl")]
    #[validate(range(min = 1))]
    pub verify_ttl: u64,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    /// Updates processed concurrently
    #[serde(default = "default_concurrency")]
    #[validate(range(min = 1))]
    pub concurrency: usize,
}

impl TelegramConfig {
    pub fn verify_ttl(&self) -> Duration {
        Duration::from_secs(self.verify_ttl)
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[redacted]")
            .field("staff_chat_id", &self.staff_chat_id)
            .field("admin_id", &self.admin_id)
            .field("verify_ttl", &self.verify_ttl)
            .field("api_base_url", &self.api_base_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DatabaseConfig {
    #[validate(length(min = 1))]
    pub url: String,
    #[serde(default = "default_max_connections")]
    #[validate(range(min = 1))]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// OpenAI-compatible moderation backend
#[derive(Clone, Deserialize, Validate)]
pub struct ClassifierConfig {
    #[serde(default = "default_classifier_base_url")]
    pub base_url: String,
    #[serde(default = "default_classifier_model")]
    pub model: String,
    /// Empty means unconfigured: every check uses the keyword list
    #[serde(default)]
    pub token: String,
    /// Ask the backend for `response_format = json_object`
    #[serde(default = "default_true")]
    pub json_mode: bool,
    /// Requests allowed per `period_secs`, shared by all users
    #[serde(default = "default_classifier_requests")]
    #[validate(range(min = 1))]
    pub requests: u32,
    #[serde(default = "default_classifier_period_secs")]
    #[validate(range(min = 1))]
    pub period_secs: u64,
    /// Replaces the built-in prohibited word list
    #[serde(default)]
    pub keywords_path: Option<PathBuf>,
}

impl ClassifierConfig {
    /// Whether enough is set to call the backend at all
    pub fn is_configured(&self) -> bool {
        !self.token.trim().is_empty()
            && !self.base_url.trim().is_empty()
            && !self.model.trim().is_empty()
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: default_classifier_base_url(),
            model: default_classifier_model(),
            token: String::new(),
            json_mode: true,
            requests: default_classifier_requests(),
            period_secs: default_classifier_period_secs(),
            keywords_path: None,
        }
    }
}

impl fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("token", &if self.token.is_empty() { "" } else { "[redacted]" })
            .field("json_mode", &self.json_mode)
            .field("requests", &self.requests)
            .field("period_secs", &self.period_secs)
            .field("keywords_path", &self.keywords_path)
            .finish()
    }
}

/// Relay engine tuning
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_flood_thresholds"))]
pub struct RelayConfig {
    #[serde(default = "default_flood_window_secs")]
    #[validate(range(min = 1))]
    pub flood_window_secs: u64,
    /// Messages in the window above which the user is warned
    #[serde(default = "default_flood_warn_threshold")]
    pub flood_warn_threshold: usize,
    /// Messages in the window above which the user is blocked
    #[serde(default = "default_flood_block_threshold")]
    pub flood_block_threshold: usize,
    /// Days a message mapping is kept
    #[serde(default = "default_retention_days")]
    #[validate(range(min = 1))]
    pub retention_days: u32,
    #[serde(default = "default_classify_timeout_secs")]
    #[validate(range(min = 1))]
    pub classify_timeout_secs: u64,
    #[serde(default = "default_typing_interval_ms")]
    #[validate(range(min = 100))]
    pub typing_interval_ms: u64,
}

impl RelayConfig {
    pub fn flood_window(&self) -> Duration {
        Duration::from_secs(self.flood_window_secs)
    }

    pub fn classify_timeout(&self) -> Duration {
        Duration::from_secs(self.classify_timeout_secs)
    }

    pub fn typing_interval(&self) -> Duration {
        Duration::from_millis(self.typing_interval_ms)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            flood_window_secs: default_flood_window_secs(),
            flood_warn_threshold: default_flood_warn_threshold(),
            flood_block_threshold: default_flood_block_threshold(),
            retention_days: default_retention_days(),
            classify_timeout_secs: default_classify_timeout_secs(),
            typing_interval_ms: default_typing_interval_ms(),
        }
    }
}

fn validate_flood_thresholds(relay: &RelayConfig) -> Result<(), ValidationError> {
    if relay.flood_warn_threshold >= relay.flood_block_threshold {
        return Err(ValidationError::new("flood_warn_threshold_not_below_block"));
    }
    Ok(())
}

/// Logging output
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value functions
fn default_verify_ttl() -> u64 {
    30
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_concurrency() -> usize {
    8
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_classifier_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_classifier_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_true() -> bool {
    true
}

fn default_classifier_requests() -> u32 {
    5
}

fn default_classifier_period_secs() -> u64 {
    30
}

fn default_flood_window_secs() -> u64 {
    4
}

fn default_flood_warn_threshold() -> usize {
    7
}

fn default_flood_block_threshold() -> usize {
    10
}

fn default_retention_days() -> u32 {
    2
}

fn default_classify_timeout_secs() -> u64 {
    40
}

fn default_typing_interval_ms() -> u64 {
    4500
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from `.env`, the config file and the environment
    ///
    /// # Errors
    /// Returns an error if a required key is missing or a value is invalid
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Load from an explicit file path plus environment overrides
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_settings(settings)
    }

    /// Deserialize and validate an already layered source
    pub fn from_settings(settings: Config) -> Result<Self, ConfigError> {
        let config: AppConfig = settings.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    /// Validate value ranges and identities
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.telegram.staff_chat_id == 0 {
            return Err(ConfigError::InvalidValue(
                "telegram.staff_chat_id",
                "must not be zero".to_string(),
            ));
        }
        if self.telegram.admin_id == 0 {
            return Err(ConfigError::InvalidValue(
                "telegram.admin_id",
                "must not be zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Source(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
