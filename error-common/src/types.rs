use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codes;

/// Closed set of failure kinds the authentication subsystem surfaces.
///
/// Adding a variant forces every `match` on the kind to be revisited, which is
/// the point: the client-visible mapping below must stay exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorKind {
    InvalidCredentials,
    MissingToken,
    TokenMalformed,
    TokenExpired,
    TokenRevoked,
    TokenNotFound,
    IdentityMismatch,
    InsufficientRole,
    InvalidRequest,
    EmailTaken,
    StoreUnavailable,
}

impl AuthErrorKind {
    #[must_use]
    pub const fn outcome(self) -> ClientOutcome {
        match self {
            Self::InvalidCredentials
            | Self::MissingToken
            | Self::TokenMalformed
            | Self::TokenExpired
            | Self::TokenRevoked
            | Self::TokenNotFound
            | Self::IdentityMismatch => ClientOutcome::Unauthorized,
            Self::InsufficientRole => ClientOutcome::Forbidden,
            Self::InvalidRequest | Self::EmailTaken => ClientOutcome::BadRequest,
            Self::StoreUnavailable => ClientOutcome::ServerError,
        }
    }

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidCredentials => codes::authentication::INVALID_CREDENTIALS,
            Self::MissingToken => codes::authentication::MISSING_TOKEN,
            Self::TokenMalformed => codes::authentication::TOKEN_MALFORMED,
            Self::TokenExpired => codes::authentication::TOKEN_EXPIRED,
            Self::TokenRevoked => codes::authentication::TOKEN_REVOKED,
            Self::TokenNotFound => codes::authentication::TOKEN_NOT_FOUND,
            Self::IdentityMismatch => codes::authentication::IDENTITY_MISMATCH,
            Self::InsufficientRole => codes::authorization::INSUFFICIENT_ROLE,
            Self::InvalidRequest => codes::validation::INVALID_INPUT,
            Self::EmailTaken => codes::validation::EMAIL_TAKEN,
            Self::StoreUnavailable => codes::database::STORE_UNAVAILABLE,
        }
    }

    /// Fixed message safe to show to any caller.
    #[must_use]
    pub const fn public_message(self) -> &'static str {
        match self {
            Self::InvalidCredentials => "Invalid email or password",
            Self::MissingToken => "Authentication required",
            Self::TokenMalformed | Self::TokenNotFound | Self::IdentityMismatch => "Invalid token",
            Self::TokenExpired => "Token has expired",
            Self::TokenRevoked => "Token has been revoked",
            Self::InsufficientRole => "Insufficient permissions",
            Self::InvalidRequest => "Invalid request",
            Self::EmailTaken => "An account with this email already exists",
            Self::StoreUnavailable => "Internal server error",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::MissingToken => "missing_token",
            Self::TokenMalformed => "token_malformed",
            Self::TokenExpired => "token_expired",
            Self::TokenRevoked => "token_revoked",
            Self::TokenNotFound => "token_not_found",
            Self::IdentityMismatch => "identity_mismatch",
            Self::InsufficientRole => "insufficient_role",
            Self::InvalidRequest => "invalid_request",
            Self::EmailTaken => "email_taken",
            Self::StoreUnavailable => "store_unavailable",
        }
    }
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a client learns about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientOutcome {
    Unauthorized,
    Forbidden,
    BadRequest,
    ServerError,
}

impl ClientOutcome {
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::BadRequest => 400,
            Self::ServerError => 500,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::BadRequest => "bad_request",
            Self::ServerError => "server_error",
        }
    }
}

/// Errors raised outside the request path: start-up, configuration, serving.
#[derive(Error, Debug)]
pub enum MediError {
    /// Server configuration errors
    #[error("Server error: {0}")]
    ServerError(String),

    /// Database connection or migration errors
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for start-up operations
pub type Result<T> = std::result::Result<T, MediError>;
