//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, ClassifierConfig, ConfigError, DatabaseConfig, LogConfig, RelayConfig,
    TelegramConfig, CONFIG_PATH_VAR, DEFAULT_CONFIG_PATH, ENV_PREFIX,
};
