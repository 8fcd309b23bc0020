// Start-up settings for the authentication server
use auth_gateway::RoleSet;
use auth_identity::config::PasswordHashConfig;
use auth_tokens::{ReusePolicy, SigningKey, TokenConfig, DEFAULT_REUSE_GRACE_SECONDS};
use chrono::Duration;
use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

/// Below this, an HS256 secret is brute-forceable offline.
const MIN_SECRET_BYTES: usize = 32;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),

    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Flat view of every recognised key, as read from file and environment.
#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default = "default_environment")]
    app_env: String,
    database_url: Option<SecretString>,
    jwt_secret: Option<SecretString>,
    jwt_refresh_secret: Option<SecretString>,
    #[serde(default = "default_access_ttl_minutes")]
    jwt_expiration_minutes: i64,
    #[serde(default = "default_refresh_ttl_hours")]
    jwt_refresh_expiration_hours: i64,
    #[serde(default = "default_issuer")]
    jwt_issuer: String,
    password_hash_memory_kib: Option<u32>,
    password_hash_iterations: Option<u32>,
    password_hash_parallelism: Option<u32>,
    #[serde(default = "default_reuse_policy")]
    refresh_reuse_policy: String,
    #[serde(default = "default_reuse_grace_seconds")]
    refresh_reuse_grace_seconds: i64,
    #[serde(default = "default_self_registration_roles")]
    self_registration_roles: String,
    #[serde(default = "default_origin")]
    origin: String,
}

/// Validated settings the server is built from.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub environment: String,
    pub database_url: Option<SecretString>,
    pub access_secret: SecretString,
    pub refresh_secret: SecretString,
    pub tokens: TokenConfig,
    pub password: PasswordHashConfig,
    pub reuse_policy: ReusePolicy,
    /// Window after an exchange in which the exchanged token is rejected
    /// without ending the identity's other sessions.
    pub reuse_grace: Duration,
    pub self_registration_roles: RoleSet,
    /// Browser origin allowed to call the API with credentials.
    pub cors_origin: String,
}

impl AuthSettings {
    /// Reads `path` (if given and present) and then the process environment,
    /// which wins on conflicts.
    ///
    /// # Errors
    ///
    /// [`SettingsError`] when a source cannot be read or a value fails validation.
    pub fn load(path: Option<&str>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }
        let config = builder.add_source(Environment::default()).build()?;

        Self::from_config(config)
    }

    /// # Errors
    ///
    /// See [`AuthSettings::load`].
    pub fn from_config(config: Config) -> Result<Self, SettingsError> {
        config.try_deserialize::<RawSettings>()?.validate()
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Refresh cookies carry `Secure` everywhere but development.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        !self.is_development()
    }

    #[must_use]
    pub fn access_key(&self) -> SigningKey {
        SigningKey::from_secret(self.access_secret.expose_secret().as_bytes())
    }

    #[must_use]
    pub fn refresh_key(&self) -> SigningKey {
        SigningKey::from_secret(self.refresh_secret.expose_secret().as_bytes())
    }
}

impl RawSettings {
    fn validate(self) -> Result<AuthSettings, SettingsError> {
        let development = self.app_env.eq_ignore_ascii_case("development");

        let access_secret = self.jwt_secret.ok_or(SettingsError::Missing("JWT_SECRET"))?;
        let refresh_secret = self
            .jwt_refresh_secret
            .ok_or(SettingsError::Missing("JWT_REFRESH_SECRET"))?;
        check_secret("JWT_SECRET", &access_secret, development)?;
        check_secret("JWT_REFRESH_SECRET", &refresh_secret, development)?;
        if access_secret.expose_secret() == refresh_secret.expose_secret() {
            return Err(SettingsError::Invalid {
                key: "JWT_REFRESH_SECRET",
                reason: "must differ from JWT_SECRET".to_string(),
            });
        }

        if self.jwt_expiration_minutes <= 0 {
            return Err(SettingsError::Invalid {
                key: "JWT_EXPIRATION_MINUTES",
                reason: "must be positive".to_string(),
            });
        }
        if self.jwt_refresh_expiration_hours <= 0 {
            return Err(SettingsError::Invalid {
                key: "JWT_REFRESH_EXPIRATION_HOURS",
                reason: "must be positive".to_string(),
            });
        }
        let tokens = TokenConfig {
            access_ttl_minutes: self.jwt_expiration_minutes,
            refresh_ttl_hours: self.jwt_refresh_expiration_hours,
            issuer: self.jwt_issuer.trim().to_string(),
        };
        if tokens.refresh_ttl() <= tokens.access_ttl() {
            return Err(SettingsError::Invalid {
                key: "JWT_REFRESH_EXPIRATION_HOURS",
                reason: "refresh tokens must outlive access tokens".to_string(),
            });
        }
        if tokens.issuer.is_empty() {
            return Err(SettingsError::Invalid {
                key: "JWT_ISSUER",
                reason: "must not be empty".to_string(),
            });
        }

        let defaults = PasswordHashConfig::default();
        let password = PasswordHashConfig {
            memory_kib: self.password_hash_memory_kib.unwrap_or(defaults.memory_kib),
            iterations: self.password_hash_iterations.unwrap_or(defaults.iterations),
            parallelism: self.password_hash_parallelism.unwrap_or(defaults.parallelism),
            min_password_length: defaults.min_password_length,
        };

        let reuse_policy = self
            .refresh_reuse_policy
            .parse::<ReusePolicy>()
            .map_err(|reason| SettingsError::Invalid {
                key: "REFRESH_REUSE_POLICY",
                reason,
            })?;
        if self.refresh_reuse_grace_seconds < 0 {
            return Err(SettingsError::Invalid {
                key: "REFRESH_REUSE_GRACE_SECONDS",
                reason: "must not be negative".to_string(),
            });
        }

        let self_registration_roles = RoleSet::parse(
            self.self_registration_roles
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty()),
        )
        .map_err(|err| SettingsError::Invalid {
            key: "SELF_REGISTRATION_ROLES",
            reason: err.to_string(),
        })?;

        Ok(AuthSettings {
            environment: self.app_env,
            database_url: self.database_url,
            access_secret,
            refresh_secret,
            tokens,
            password,
            reuse_policy,
            reuse_grace: Duration::seconds(self.refresh_reuse_grace_seconds),
            self_registration_roles,
            cors_origin: self.origin,
        })
    }
}

fn check_secret(key: &'static str, secret: &SecretString, development: bool) -> Result<(), SettingsError> {
    let len = secret.expose_secret().len();
    if len == 0 {
        return Err(SettingsError::Missing(key));
    }
    if !development && len < MIN_SECRET_BYTES {
        return Err(SettingsError::Invalid {
            key,
            reason: format!("must be at least {MIN_SECRET_BYTES} bytes outside development"),
        });
    }
    Ok(())
}

fn default_environment() -> String {
    "development".to_string()
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

fn default_reuse_policy() -> String {
    "revoke_all".to_string()
}

fn default_reuse_grace_seconds() -> i64 {
    DEFAULT_REUSE_GRACE_SECONDS
}

fn default_self_registration_roles() -> String {
    "patient,doctor".to_string()
}

fn default_origin() -> String {
    "http://localhost:4200".to_string()
}
