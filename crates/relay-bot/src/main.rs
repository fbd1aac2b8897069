//! Relay bot entry point
//!
//! Run with:
//! ```bash
//! cargo run -p relay-bot
//! ```
//!
//! Configuration is read from `config/relay.toml` (or `RELAY_CONFIG`) and
//! `RELAY_*` environment variables.

use relay_common::{try_init_tracing, try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            if let Err(e) = try_init_tracing() {
                eprintln!("Warning: Failed to initialize tracing: {e}");
            }
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::from(&config.log)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        staff_chat_id = config.telegram.staff_chat_id,
        classifier = config.classifier.is_configured(),
        "Configuration loaded"
    );

    if let Err(e) = relay_bot::run(config).await {
        error!(error = %e, error_code = e.error_code(), "Relay bot stopped with an error");
        std::process::exit(1);
    }
}
