// Client-safe error bodies and the internal detail channel.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{AuthErrorKind, ClientOutcome};

/// JSON body returned to clients on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error_id: Uuid,
    pub error_type: String,
    pub code: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorBody {
    #[must_use]
    pub fn new(kind: AuthErrorKind) -> Self {
        Self {
            error_id: Uuid::new_v4(),
            error_type: kind.outcome().as_str().to_string(),
            code: kind.code().to_string(),
            message: kind.public_message().to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Logs `detail` against a fresh error id and returns the body a client may see.
///
/// `detail` never reaches the returned body.
pub fn report(kind: AuthErrorKind, detail: &dyn fmt::Display) -> ErrorBody {
    let body = ErrorBody::new(kind);

    match kind.outcome() {
        ClientOutcome::ServerError => tracing::error!(
            error_id = %body.error_id,
            kind = %kind,
            detail = %detail,
            "Request failed"
        ),
        _ => tracing::debug!(
            error_id = %body.error_id,
            kind = %kind,
            detail = %detail,
            "Request rejected"
        ),
    }

    body
}

/// Like [`report`], with a caller-chosen public message for input validation failures.
pub fn report_invalid_input(message: impl Into<String>, detail: &dyn fmt::Display) -> ErrorBody {
    let mut body = report(AuthErrorKind::InvalidRequest, detail);
    body.message = message.into();
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_keeps_detail_out_of_body() {
        let body = report(
            AuthErrorKind::StoreUnavailable,
            &"password authentication failed for user \"medi\"",
        );

        assert_eq!(body.error_type, "server_error");
        assert_eq!(body.code, "DB_4001");
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("password authentication"));
    }

    #[test]
    fn invalid_input_carries_custom_message() {
        let body = report_invalid_input("password must be at least 8 characters", &"len=3");
        assert_eq!(body.error_type, "bad_request");
        assert_eq!(body.message, "password must be at least 8 characters");
    }
}
