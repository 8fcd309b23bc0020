//! Authentication middleware for Axum
//!
//! Verifies the access token, injects [`AuthContext`] for handlers, and
//! enforces [`Requirement`]s on routes that declare them.

use crate::{context::AuthContext, error::GateError, requirement::Requirement};
use auth_tokens::{TokenCodec, TokenKind};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Cookie consulted when no `Authorization` header is sent.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Shared gate state
#[derive(Clone)]
pub struct Gate {
    codec: Arc<TokenCodec>,
}

impl Gate {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    /// Verifies the access token carried by `headers` at `now`.
    ///
    /// # Errors
    ///
    /// [`GateError::MissingToken`] without a token, [`GateError::MalformedHeader`]
    /// for a non-bearer `Authorization` header, [`GateError::Token`] when the
    /// token fails verification.
    pub fn authenticate_headers(&self, headers: &HeaderMap, now: DateTime<Utc>) -> Result<AuthContext, GateError> {
        let token = extract_token(headers)?;
        let claims = self.codec.verify(&token, TokenKind::Access, now)?;
        Ok(AuthContext::from_claims(&claims))
    }

    /// # Errors
    ///
    /// [`GateError::InsufficientRole`] when `context` does not meet `requirement`.
    pub fn authorize<R: Requirement>(context: &AuthContext, requirement: &R) -> Result<(), GateError> {
        if requirement.permits(context) {
            return Ok(());
        }

        warn!(
            subject = %context.subject,
            role = %context.role,
            required = %requirement.describe(),
            "Role check failed"
        );
        Err(GateError::InsufficientRole {
            role: context.role,
            required: requirement.describe(),
        })
    }
}

/// Main authentication middleware
///
/// Rejects the request unless it carries a valid access token.
pub async fn authenticate(
    State(gate): State<Gate>,
    mut request: Request,
    next: Next,
) -> Result<Response, GateError> {
    let context = gate
        .authenticate_headers(request.headers(), Utc::now())
        .inspect_err(|e| debug!(error = %e, path = %request.uri().path(), "Authentication failed"))?;

    debug!(subject = %context.subject, role = %context.role, "Request authenticated");
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

/// Rejects authenticated requests whose context does not meet `requirement`.
///
/// Must run after [`authenticate`].
pub async fn require<R: Requirement>(
    State(requirement): State<R>,
    request: Request,
    next: Next,
) -> Result<Response, GateError> {
    {
        let context = request
            .extensions()
            .get::<AuthContext>()
            .ok_or(GateError::Unauthenticated)?;
        Gate::authorize(context, &requirement)?;
    }

    Ok(next.run(request).await)
}

/// Extract the access token from the Authorization header or the access-token cookie
fn extract_token(headers: &HeaderMap) -> Result<String, GateError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value.to_str().map_err(|_| GateError::MalformedHeader)?;
        let (scheme, token) = value.trim().split_once(' ').ok_or(GateError::MalformedHeader)?;
        let token = token.trim();
        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            return Err(GateError::MalformedHeader);
        }
        return Ok(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(GateError::MissingToken)
}
