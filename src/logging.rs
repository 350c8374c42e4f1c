//! Logging setup.
//!
//! Structured logging via `tracing`. The filter comes from the `GOMOD2NIX_LOG`
//! environment variable when set, otherwise from the CLI verbosity level. All
//! log output goes to stderr so stdout stays free for redirection.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV_VAR: &str = "GOMOD2NIX_LOG";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Initialize the global tracing subscriber. Call once, early.
pub fn init_logging(default_level: &str, format: LogFormat) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_level));
    let base = Registry::default().with(filter);

    match format {
        LogFormat::Json => base
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => base
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
    }
}
