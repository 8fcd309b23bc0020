//! Access and refresh token codec
//!
//! Tokens are compact JWTs signed with HMAC-SHA256. The algorithm is pinned:
//! a token whose header names anything else is rejected before its signature
//! is looked at.

use auth_identity::Role;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

use crate::config::TokenConfig;
use crate::error::{Result, TokenError};

// =============================================================================
// TOKEN CLAIMS
// =============================================================================

/// Which of the two token families a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => f.write_str("access"),
            Self::Refresh => f.write_str("refresh"),
        }
    }
}

/// JWT claims carried by both token kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (identity ID)
    pub sub: Uuid,

    /// Role at the time of issuance
    pub role: Role,

    /// Token kind
    pub typ: TokenKind,

    /// JWT ID; makes every minted token distinct
    pub jti: Uuid,

    /// Issued at (seconds since epoch)
    pub iat: i64,

    /// Expiration (seconds since epoch)
    pub exp: i64,

    /// Issuer
    pub iss: String,
}

impl TokenClaims {
    /// Expired at `now` when `exp <= now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        // Out-of-range timestamps read as the epoch, i.e. long expired.
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_default()
    }

    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.iat, 0).single().unwrap_or_default()
    }
}

/// A freshly signed token together with the claims inside it.
#[derive(Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("claims", &self.claims)
            .finish_non_exhaustive()
    }
}

impl IssuedToken {
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.claims.expires_at()
    }
}

/// An access token and the refresh token that can renew it.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

// =============================================================================
// KEYS
// =============================================================================

/// HMAC key material for one token kind.
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    #[must_use]
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

// =============================================================================
// CODEC
// =============================================================================

/// Mints and verifies access and refresh tokens.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    access_key: SigningKey,
    refresh_key: SigningKey,
    config: TokenConfig,
}

impl TokenCodec {
    #[must_use]
    pub fn new(config: TokenConfig, access_key: SigningKey, refresh_key: SigningKey) -> Self {
        Self {
            access_key,
            refresh_key,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    #[must_use]
    pub fn key(&self, kind: TokenKind) -> &SigningKey {
        match kind {
            TokenKind::Access => &self.access_key,
            TokenKind::Refresh => &self.refresh_key,
        }
    }

    /// # Errors
    ///
    /// [`TokenError::Signing`] if the claims cannot be encoded.
    pub fn issue_access(&self, subject: Uuid, role: Role, now: DateTime<Utc>) -> Result<IssuedToken> {
        self.issue(subject, role, TokenKind::Access, now)
    }

    /// # Errors
    ///
    /// [`TokenError::Signing`] if the claims cannot be encoded.
    pub fn issue_refresh(&self, subject: Uuid, role: Role, now: DateTime<Utc>) -> Result<IssuedToken> {
        self.issue(subject, role, TokenKind::Refresh, now)
    }

    /// # Errors
    ///
    /// [`TokenError::Signing`] if either token cannot be encoded.
    pub fn issue_pair(&self, subject: Uuid, role: Role, now: DateTime<Utc>) -> Result<TokenPair> {
        Ok(TokenPair {
            access: self.issue_access(subject, role, now)?,
            refresh: self.issue_refresh(subject, role, now)?,
        })
    }

    /// Verifies `token` as a token of `kind`, using that kind's key.
    ///
    /// # Errors
    ///
    /// [`TokenError::Malformed`] for anything that fails parsing, signature,
    /// algorithm, issuer or kind checks; [`TokenError::Expired`] once `exp <= now`.
    pub fn verify(&self, token: &str, kind: TokenKind, now: DateTime<Utc>) -> Result<TokenClaims> {
        self.verify_with_key(token, self.key(kind), kind, now)
    }

    /// Verifies `token` against an explicit key.
    ///
    /// # Errors
    ///
    /// Same as [`TokenCodec::verify`].
    pub fn verify_with_key(
        &self,
        token: &str,
        key: &SigningKey,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the caller's clock, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.set_issuer(&[self.config.issuer.as_str()]);

        let data = decode::<TokenClaims>(token, &key.decoding, &validation).map_err(|e| {
            debug!(error = %e, kind = %kind, "Token rejected");
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        let claims = data.claims;
        if claims.typ != kind {
            debug!(expected = %kind, found = %claims.typ, "Token kind mismatch");
            return Err(TokenError::Malformed);
        }

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn issue(&self, subject: Uuid, role: Role, kind: TokenKind, now: DateTime<Utc>) -> Result<IssuedToken> {
        let ttl = match kind {
            TokenKind::Access => self.config.access_ttl(),
            TokenKind::Refresh => self.config.refresh_ttl(),
        };

        let iat = now.timestamp();
        let claims = TokenClaims {
            sub: subject,
            role,
            typ: kind,
            jti: Uuid::new_v4(),
            iat,
            exp: iat.saturating_add(ttl.num_seconds()),
            iss: self.config.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key(kind).encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken { token, claims })
    }
}
