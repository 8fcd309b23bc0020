use auth_identity::Role;
use auth_tokens::TokenClaims;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GateError;

/// Who is making an authenticated request, and in what role.
///
/// Built only from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub subject: Uuid,
    pub role: Role,
    pub token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl AuthContext {
    #[must_use]
    pub fn from_claims(claims: &TokenClaims) -> Self {
        Self {
            subject: claims.sub,
            role: claims.role,
            token_id: claims.jti,
            expires_at: claims.expires_at(),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(GateError::Unauthenticated)
    }
}
