use error_common::AuthErrorKind;
use thiserror::Error;

use crate::models::UnknownRole;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Password must be at least {min_length} characters")]
    WeakPassword { min_length: usize },

    #[error(transparent)]
    UnknownRole(#[from] UnknownRole),

    #[error("Identity not found")]
    NotFound,

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl IdentityError {
    #[must_use]
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::InvalidCredentials => AuthErrorKind::InvalidCredentials,
            Self::EmailTaken => AuthErrorKind::EmailTaken,
            Self::InvalidEmail | Self::WeakPassword { .. } | Self::UnknownRole(_) => {
                AuthErrorKind::InvalidRequest
            }
            // A token whose subject no longer resolves to an identity.
            Self::NotFound => AuthErrorKind::IdentityMismatch,
            Self::Hashing(_) | Self::Storage(_) => AuthErrorKind::StoreUnavailable,
        }
    }
}

impl From<sqlx::Error> for IdentityError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IdentityError>;
