// Logger configuration
use serde::{Deserialize, Serialize};

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-oriented, coloured when attached to a terminal.
    Pretty,
    /// One JSON object per event.
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub format: LogFormat,
    /// Used when `RUST_LOG` is unset.
    pub default_filter: String,
    pub with_ansi: bool,
}

impl LoggerConfig {
    /// Pretty output in development, JSON everywhere else.
    #[must_use]
    pub fn for_environment(environment: &str, verbose: bool) -> Self {
        let level = if verbose { "debug" } else { "info" };
        let development = environment.eq_ignore_ascii_case("development");

        Self {
            format: if development { LogFormat::Pretty } else { LogFormat::Json },
            default_filter: format!("medi_server={level},auth_tokens={level},auth_identity={level},auth_gateway={level},tower_http=info,sqlx=warn"),
            with_ansi: development,
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::for_environment("development", false)
    }
}
