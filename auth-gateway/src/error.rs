use auth_identity::Role;
use auth_tokens::TokenError;
use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use error_common::{AuthErrorKind, ClientOutcome};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("Missing authentication token")]
    MissingToken,

    #[error("Malformed authorization header")]
    MalformedHeader,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Request reached a protected handler without authentication")]
    Unauthenticated,

    #[error("Role {role} does not satisfy {required}")]
    InsufficientRole { role: Role, required: String },
}

impl GateError {
    #[must_use]
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::MissingToken | Self::Unauthenticated => AuthErrorKind::MissingToken,
            Self::MalformedHeader => AuthErrorKind::TokenMalformed,
            Self::Token(err) => err.kind(),
            Self::InsufficientRole { .. } => AuthErrorKind::InsufficientRole,
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let body = error_common::report(kind, &self);
        let status = StatusCode::from_u16(kind.outcome().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = (status, Json(body)).into_response();
        if kind.outcome() == ClientOutcome::Unauthorized {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
