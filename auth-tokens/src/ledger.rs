use crate::{error::*, models::*, repository::RefreshTokenRepository};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What happens when a refresh token that was already exchanged shows up again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReusePolicy {
    /// Reject it and revoke every outstanding refresh token of its identity.
    #[default]
    RevokeAll,
    /// Reject it.
    Reject,
}

impl FromStr for ReusePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "revoke_all" => Ok(Self::RevokeAll),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown refresh reuse policy: {other}")),
        }
    }
}

/// How long after an exchange a second presentation of the same token still
/// counts as a duplicate submission rather than a replay.
pub const DEFAULT_REUSE_GRACE_SECONDS: i64 = 10;

/// Server-side record of issued refresh tokens.
pub struct RefreshTokenLedger {
    repository: Arc<dyn RefreshTokenRepository>,
    reuse_policy: ReusePolicy,
    reuse_grace: Duration,
}

impl RefreshTokenLedger {
    pub fn new(repository: Arc<dyn RefreshTokenRepository>, reuse_policy: ReusePolicy) -> Self {
        Self {
            repository,
            reuse_policy,
            reuse_grace: Duration::seconds(DEFAULT_REUSE_GRACE_SECONDS),
        }
    }

    /// Sets the window after an exchange in which the exchanged token is
    /// rejected without revoking the identity's other sessions.
    #[must_use]
    pub fn with_reuse_grace(mut self, grace: Duration) -> Self {
        self.reuse_grace = grace;
        self
    }

    /// SHA-256 hex digest under which a token is stored.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }

    /// Records a freshly issued refresh token.
    ///
    /// # Errors
    ///
    /// [`TokenError::Storage`] if the entry cannot be stored.
    pub async fn record(
        &self,
        identity_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord> {
        self.repository
            .insert(
                NewRefreshToken {
                    identity_id,
                    token_hash: Self::hash_token(token),
                    expires_at,
                },
                now,
            )
            .await
    }

    /// Checks that `token` is live for `identity_id` and revokes it.
    ///
    /// Of any number of concurrent calls with the same token, at most one succeeds.
    ///
    /// # Errors
    ///
    /// [`TokenError::NotFound`], [`TokenError::IdentityMismatch`],
    /// [`TokenError::Revoked`] or [`TokenError::Expired`] when the entry is not
    /// live; [`TokenError::Storage`] on storage failure.
    pub async fn validate_and_consume(
        &self,
        token: &str,
        identity_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord> {
        let token_hash = Self::hash_token(token);
        let record = self.check_presented(&token_hash, identity_id, now).await?;

        if !self
            .repository
            .revoke_if_active(&token_hash, identity_id, RevocationReason::Consumed, now)
            .await?
        {
            debug!(token_id = %record.id, "Refresh token consumed concurrently");
            return Err(TokenError::Revoked);
        }

        Ok(RefreshTokenRecord {
            revoked: true,
            revoked_at: Some(now),
            revocation_reason: Some(RevocationReason::Consumed),
            ..record
        })
    }

    /// Exchanges `token` for `replacement`: the presented entry is revoked and
    /// the replacement recorded in one atomic step.
    ///
    /// # Errors
    ///
    /// Same as [`RefreshTokenLedger::validate_and_consume`]. A caller that loses
    /// a race for the same token gets [`TokenError::Revoked`] and nothing is stored.
    pub async fn rotate(
        &self,
        token: &str,
        identity_id: Uuid,
        replacement: &str,
        replacement_expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord> {
        let token_hash = Self::hash_token(token);
        let record = self.check_presented(&token_hash, identity_id, now).await?;

        let successor = self
            .repository
            .rotate(
                &token_hash,
                identity_id,
                NewRefreshToken {
                    identity_id,
                    token_hash: Self::hash_token(replacement),
                    expires_at: replacement_expires_at,
                },
                now,
            )
            .await?;

        match successor {
            Some(successor) => {
                debug!(previous = %record.id, successor = %successor.id, "Refresh token rotated");
                Ok(successor)
            }
            None => {
                // Live at lookup, gone at update: another request won the exchange.
                debug!(token_id = %record.id, "Lost refresh rotation race");
                Err(TokenError::Revoked)
            }
        }
    }

    /// Revokes `token` if it is on record. Unknown and already revoked tokens are not an error.
    ///
    /// # Errors
    ///
    /// [`TokenError::Storage`] on storage failure.
    pub async fn revoke(&self, token: &str, reason: RevocationReason, now: DateTime<Utc>) -> Result<()> {
        let revoked = self
            .repository
            .revoke(&Self::hash_token(token), reason, now)
            .await?;
        debug!(revoked, reason = %reason, "Refresh token revocation requested");
        Ok(())
    }

    /// Revokes every outstanding refresh token of `identity_id`.
    ///
    /// # Errors
    ///
    /// [`TokenError::Storage`] on storage failure.
    pub async fn revoke_all(
        &self,
        identity_id: Uuid,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let revoked = self
            .repository
            .revoke_all_for_identity(identity_id, reason, now)
            .await?;
        info!(identity_id = %identity_id, revoked, reason = %reason, "Revoked all refresh tokens");
        Ok(revoked)
    }

    /// # Errors
    ///
    /// [`TokenError::Storage`] on storage failure.
    pub async fn active_count(&self, identity_id: Uuid, now: DateTime<Utc>) -> Result<u64> {
        self.repository.count_active(identity_id, now).await
    }

    async fn check_presented(
        &self,
        token_hash: &str,
        identity_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord> {
        let record = self
            .repository
            .find_by_hash(token_hash)
            .await?
            .ok_or(TokenError::NotFound)?;

        if record.identity_id != identity_id {
            warn!(
                token_id = %record.id,
                claimed_identity = %identity_id,
                "Refresh token presented for a different identity"
            );
            return Err(TokenError::IdentityMismatch);
        }

        if record.revoked {
            if self.reuse_policy == ReusePolicy::RevokeAll && self.is_replay(&record, now) {
                warn!(
                    token_id = %record.id,
                    identity_id = %identity_id,
                    "Refresh token reuse detected, revoking all sessions"
                );
                self.repository
                    .revoke_all_for_identity(identity_id, RevocationReason::ReuseDetected, now)
                    .await?;
            }
            debug!(token_id = %record.id, "Revoked refresh token presented");
            return Err(TokenError::Revoked);
        }

        if record.expires_at <= now {
            return Err(TokenError::Expired);
        }

        Ok(record)
    }

    /// An exchanged token presented again once the grace window has passed.
    ///
    /// Inside the window it is most likely the losing half of a double
    /// submission, and the successor belongs to the same client.
    fn is_replay(&self, record: &RefreshTokenRecord, now: DateTime<Utc>) -> bool {
        let consumed = record
            .revocation_reason
            .is_some_and(RevocationReason::is_consumption);
        consumed
            && record
                .revoked_at
                .map_or(true, |revoked_at| now.signed_duration_since(revoked_at) >= self.reuse_grace)
    }
}
