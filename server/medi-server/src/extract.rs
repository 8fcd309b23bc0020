// Request extractors
use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use std::fmt::Display;
use tracing::debug;
use validator::Validate;

/// Client-facing message for any body that does not parse.
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body";

/// Bad request for an unparsable body. The parser's detail is logged, not returned.
pub(crate) fn invalid_body(detail: impl Display) -> ApiError {
    debug!(detail = %detail, "Rejected request body");
    ApiError::bad_request(INVALID_BODY_MESSAGE)
}

/// JSON body that has passed its `validator` rules.
///
/// Syntax and shape errors become `400` with a fixed message; rule
/// violations become `400` with per-field messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| invalid_body(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}
