use error_common::AuthErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token is malformed or its signature is invalid")]
    Malformed,

    #[error("Token has expired")]
    Expired,

    #[error("Refresh token has been revoked")]
    Revoked,

    #[error("Refresh token not found")]
    NotFound,

    #[error("Refresh token belongs to a different identity")]
    IdentityMismatch,

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl TokenError {
    #[must_use]
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::Malformed => AuthErrorKind::TokenMalformed,
            Self::Expired => AuthErrorKind::TokenExpired,
            Self::Revoked => AuthErrorKind::TokenRevoked,
            Self::NotFound => AuthErrorKind::TokenNotFound,
            Self::IdentityMismatch => AuthErrorKind::IdentityMismatch,
            Self::Signing(_) | Self::Storage(_) => AuthErrorKind::StoreUnavailable,
        }
    }
}

impl From<sqlx::Error> for TokenError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TokenError>;
