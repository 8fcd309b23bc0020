//! Logging for the Medi authentication stack.
//!
//! Two concerns live here. [`init`] installs the global `tracing` subscriber
//! (pretty output in development, JSON elsewhere, `RUST_LOG` overriding the
//! configured filter). [`redact_email`] turns a login identifier into a short
//! correlation hash so that a failed login can be traced across log lines
//! without the address itself ever being written.
//!
//! ```rust
//! let masked = logger_redacted::redact_email("Alice@Example.com");
//! assert!(masked.starts_with("EMAIL["));
//! assert_eq!(masked, logger_redacted::redact_email("alice@example.com"));
//! ```

pub mod config;
pub mod redactor;

pub use config::*;
pub use redactor::*;

use thiserror::Error;
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("global subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Fails when the configured filter does not parse or when a subscriber has
/// already been installed for this process.
pub fn init(config: &LoggerConfig) -> Result<(), LoggerError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.default_filter)
            .map_err(|e| LoggerError::InvalidFilter(e.to_string()))?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match config.format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(config.with_ansi),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .json(),
            )
            .try_init(),
    };

    result.map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))
}
