use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Lifetimes and issuer for minted tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_access_ttl_minutes")]
    pub access_ttl_minutes: i64,
    #[serde(default = "default_refresh_ttl_hours")]
    pub refresh_ttl_hours: i64,
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_ttl_minutes: default_access_ttl_minutes(),
            refresh_ttl_hours: default_refresh_ttl_hours(),
            issuer: default_issuer(),
        }
    }
}

impl TokenConfig {
    #[must_use]
    pub fn access_ttl(&self) -> Duration {
        Duration::minutes(self.access_ttl_minutes)
    }

    #[must_use]
    pub fn refresh_ttl(&self) -> Duration {
        Duration::hours(self.refresh_ttl_hours)
    }
}

fn default_access_ttl_minutes() -> i64 {
    15
}

fn default_refresh_ttl_hours() -> i64 {
    168
}

fn default_issuer() -> String {
    "medi".to_string()
}
