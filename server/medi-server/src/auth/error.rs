use auth_identity::{IdentityError, Role};
use auth_tokens::TokenError;
use error_common::AuthErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Every login failure, whatever its cause.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Role {0} cannot be chosen at registration")]
    RoleNotSelfAssignable(Role),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl SessionError {
    #[must_use]
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::InvalidCredentials => AuthErrorKind::InvalidCredentials,
            Self::RoleNotSelfAssignable(_) => AuthErrorKind::InsufficientRole,
            Self::Identity(err) => err.kind(),
            Self::Token(err) => err.kind(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
