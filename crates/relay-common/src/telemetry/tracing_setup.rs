//! Tracing subscriber setup
//!
//! `RUST_LOG` overrides the configured level when it is set.

use std::str::FromStr;

use tracing::{Level, Subscriber};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::LogConfig;

/// Client crates that log every request at `info`/`debug`
const NOISY_TARGETS: &[&str] = &["hyper", "hyper_util", "h2", "reqwest", "rustls", "sqlx"];

/// Output options of the log subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Level used when `RUST_LOG` is unset
    pub level: Level,
    /// One JSON object per line instead of the human-readable format
    pub json: bool,
    /// Emit an event whenever a span opens and closes
    pub span_events: bool,
    /// Source location of every event
    pub file_line: bool,
    /// Cap HTTP and SQL client crates at `warn`
    pub quiet_dependencies: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json: false,
            span_events: false,
            file_line: true,
            quiet_dependencies: true,
        }
    }
}

impl TracingConfig {
    /// Filter directives applied when `RUST_LOG` is unset
    pub fn directives(&self) -> String {
        let mut directives = self.level.as_str().to_lowercase();
        if self.quiet_dependencies {
            for target in NOISY_TARGETS {
                directives.push(',');
                directives.push_str(target);
                directives.push_str("=warn");
            }
        }
        directives
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directives()))
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    fn layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let layer = fmt::layer()
            .with_file(self.file_line)
            .with_line_number(self.file_line)
            .with_span_events(self.span_events());
        if self.json {
            layer.json().boxed()
        } else {
            layer.boxed()
        }
    }
}

impl From<&LogConfig> for TracingConfig {
    /// JSON output drops source locations; they add little to shipped logs
    fn from(log: &LogConfig) -> Self {
        Self {
            level: Level::from_str(log.level.trim()).unwrap_or(Level::INFO),
            json: log.json,
            file_line: !log.json,
            ..Self::default()
        }
    }
}

/// Initialize tracing with the default configuration
pub fn try_init_tracing() -> Result<(), TracingError> {
    try_init_tracing_with_config(TracingConfig::default())
}

/// Install the global subscriber
///
/// Returns `TracingError::AlreadyInitialized` instead of panicking when a
/// global subscriber is already set.
pub fn try_init_tracing_with_config(config: TracingConfig) -> Result<(), TracingError> {
    tracing_subscriber::registry()
        .with(config.filter())
        .with(config.layer())
        .try_init()
        .map_err(|_| TracingError::AlreadyInitialized)
}

/// Tracing initialization errors
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Tracing subscriber already initialized")]
    AlreadyInitialized,
}
