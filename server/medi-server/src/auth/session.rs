//! Session orchestration
//!
//! Composes the credential store, token codec and refresh ledger into the
//! login / refresh / logout transitions. Each operation reads the clock once
//! and uses that instant for every expiry decision it makes.

use auth_gateway::{AuthContext, RoleSet};
use auth_identity::{CredentialStore, NewIdentity, SanitizedIdentity};
use auth_tokens::{RefreshTokenLedger, RevocationReason, TokenCodec, TokenKind, TokenPair};
use chrono::{DateTime, Utc};
use error_common::ClientOutcome;
use logger_redacted::redact_email;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::error::{Result, SessionError};

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub tokens: TokenPair,
    pub identity: SanitizedIdentity,
}

pub struct SessionOrchestrator {
    credentials: Arc<CredentialStore>,
    codec: Arc<TokenCodec>,
    ledger: Arc<RefreshTokenLedger>,
    /// Roles an anonymous caller may pick for themselves.
    registration_roles: RoleSet,
}

impl SessionOrchestrator {
    pub fn new(
        credentials: Arc<CredentialStore>,
        codec: Arc<TokenCodec>,
        ledger: Arc<RefreshTokenLedger>,
        registration_roles: RoleSet,
    ) -> Self {
        Self {
            credentials,
            codec,
            ledger,
            registration_roles,
        }
    }

    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    /// # Errors
    ///
    /// [`SessionError::RoleNotSelfAssignable`] for roles outside the
    /// self-registration set, otherwise whatever the credential store rejects.
    pub async fn register(&self, new: NewIdentity) -> Result<SanitizedIdentity> {
        if !self.registration_roles.contains(new.role) {
            warn!(role = %new.role, allowed = %self.registration_roles, "Registration with restricted role refused");
            return Err(SessionError::RoleNotSelfAssignable(new.role));
        }

        let identity = self.credentials.register(new).await?;
        Ok(identity.sanitized())
    }

    /// Anonymous -> Authenticated.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidCredentials`] for any failure to verify the
    /// credentials, including storage failures during the lookup. Failures
    /// after verification (signing, recording the refresh token) propagate.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        self.login_at(email, password, Utc::now()).await
    }

    async fn login_at(&self, email: &str, password: &str, now: DateTime<Utc>) -> Result<LoginOutcome> {
        let identity = match self.credentials.verify_credentials(email, password).await {
            Ok(identity) => identity,
            Err(err) => {
                if err.kind().outcome() == ClientOutcome::ServerError {
                    error!(email = %redact_email(email), error = %err, "Credential lookup failed during login");
                } else {
                    info!(email = %redact_email(email), "Login rejected");
                }
                return Err(SessionError::InvalidCredentials);
            }
        };

        let tokens = self.codec.issue_pair(identity.id, identity.role, now)?;
        self.ledger
            .record(identity.id, &tokens.refresh.token, tokens.refresh.expires_at(), now)
            .await?;

        info!(identity_id = %identity.id, role = %identity.role, "Login succeeded");
        Ok(LoginOutcome {
            tokens,
            identity: identity.sanitized(),
        })
    }

    /// Authenticated -> Refreshing -> Authenticated with a new pair.
    ///
    /// The presented token is revoked and its successor recorded in one
    /// atomic ledger step; of two concurrent calls with the same token at
    /// most one succeeds. The new pair carries the identity's current role.
    ///
    /// # Errors
    ///
    /// Any token or ledger failure; the caller must log in again.
    pub async fn refresh(&self, presented: &str) -> Result<TokenPair> {
        self.refresh_at(presented, Utc::now()).await
    }

    /// [`SessionOrchestrator::refresh`] against an explicit clock.
    ///
    /// # Errors
    ///
    /// See [`SessionOrchestrator::refresh`].
    pub async fn refresh_at(&self, presented: &str, now: DateTime<Utc>) -> Result<TokenPair> {
        let claims = self.codec.verify(presented, TokenKind::Refresh, now)?;
        let identity = self.credentials.identity(claims.sub).await?;

        let tokens = self.codec.issue_pair(identity.id, identity.role, now)?;
        self.ledger
            .rotate(
                presented,
                identity.id,
                &tokens.refresh.token,
                tokens.refresh.expires_at(),
                now,
            )
            .await?;

        info!(identity_id = %identity.id, "Session refreshed");
        Ok(tokens)
    }

    /// -> LoggedOut. Unknown and already revoked tokens are fine.
    ///
    /// Access tokens already issued stay valid until they expire.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    pub async fn logout(&self, presented: &str) -> Result<()> {
        self.ledger
            .revoke(presented, RevocationReason::Logout, Utc::now())
            .await?;
        Ok(())
    }

    /// Ends every session of `identity_id`. Returns how many refresh tokens were revoked.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    pub async fn logout_all(&self, identity_id: Uuid) -> Result<u64> {
        Ok(self
            .ledger
            .revoke_all(identity_id, RevocationReason::LogoutAll, Utc::now())
            .await?)
    }

    /// # Errors
    ///
    /// [`auth_identity::IdentityError::NotFound`] (as identity mismatch) when the
    /// subject no longer exists; storage failures.
    pub async fn profile(&self, context: &AuthContext) -> Result<SanitizedIdentity> {
        Ok(self.credentials.identity(context.subject).await?.sanitized())
    }

    /// # Errors
    ///
    /// Storage failures only.
    pub async fn active_sessions(&self, identity_id: Uuid) -> Result<u64> {
        Ok(self.ledger.active_count(identity_id, Utc::now()).await?)
    }
}
