use crate::auth::SessionError;
use auth_gateway::GateError;
use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use error_common::{AuthErrorKind, ClientOutcome, ErrorBody};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use validator::ValidationErrors;

/// Standard API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(flatten)]
    pub error: ErrorBody,
    /// Field-specific validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<HashMap<String, Vec<String>>>,
}

/// Standard API success response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Main API error enum
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field_errors: Option<HashMap<String, Vec<String>>>,
    },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Gate(#[from] GateError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::Validation { .. } | Self::BadRequest { .. } => AuthErrorKind::InvalidRequest,
            Self::Session(err) => err.kind(),
            Self::Gate(err) => err.kind(),
        }
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().outcome().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Message for input errors, which describe the caller's own request.
    /// Everything else gets the fixed message of its kind.
    fn public_message(&self) -> Option<String> {
        match self {
            Self::Validation { message, .. } | Self::BadRequest { message } => Some(message.clone()),
            _ if self.kind() == AuthErrorKind::InvalidRequest => Some(self.to_string()),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let messages = errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map_or_else(|| e.code.to_string(), ToString::to_string)
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();

        Self::Validation {
            message: "Request validation failed".to_string(),
            field_errors: Some(field_errors),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = self.status_code();

        let error = match self.public_message() {
            Some(message) => error_common::report_invalid_input(message, &self),
            None => error_common::report(kind, &self),
        };
        let field_errors = match self {
            Self::Validation { field_errors, .. } => field_errors,
            _ => None,
        };

        let mut response = (status, Json(ApiErrorResponse { error, field_errors })).into_response();
        if kind.outcome() == ClientOutcome::Unauthorized {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
