use crate::{error::*, models::*};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub mod postgres;

pub use postgres::PostgresRefreshTokenRepository;

/// Durable storage for refresh-token ledger entries.
///
/// Every revocation is conditional on the entry still being unrevoked, and
/// reports whether this call was the one that revoked it.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn insert(&self, token: NewRefreshToken, now: DateTime<Utc>) -> Result<RefreshTokenRecord>;

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>>;

    /// Revokes the entry only if it is unrevoked, unexpired at `now` and owned by `owner`.
    async fn revoke_if_active(
        &self,
        token_hash: &str,
        owner: Uuid,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    /// Revokes the entry if it is unrevoked, whoever owns it and whether or not it expired.
    async fn revoke(&self, token_hash: &str, reason: RevocationReason, now: DateTime<Utc>) -> Result<bool>;

    /// Atomically revokes the active entry for `token_hash` and stores `replacement`.
    ///
    /// Returns `None`, storing nothing, when the entry was not active for `owner`.
    async fn rotate(
        &self,
        token_hash: &str,
        owner: Uuid,
        replacement: NewRefreshToken,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>>;

    async fn revoke_all_for_identity(
        &self,
        identity_id: Uuid,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> Result<u64>;

    async fn count_active(&self, identity_id: Uuid, now: DateTime<Utc>) -> Result<u64>;
}

/// In-memory implementation for development and testing
///
/// One mutex guards the whole ledger, which is what makes `rotate` atomic here.
#[derive(Clone, Default)]
pub struct InMemoryRefreshTokenRepository {
    entries: Arc<Mutex<HashMap<String, RefreshTokenRecord>>>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn mark_revoked(record: &mut RefreshTokenRecord, reason: RevocationReason, now: DateTime<Utc>) {
    record.revoked = true;
    record.revoked_at = Some(now);
    record.revocation_reason = Some(reason);
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn insert(&self, token: NewRefreshToken, now: DateTime<Utc>) -> Result<RefreshTokenRecord> {
        let mut entries = self.entries.lock();
        if entries.contains_key(&token.token_hash) {
            return Err(TokenError::Storage("duplicate refresh token hash".into()));
        }

        let record = token.into_record(now);
        entries.insert(record.token_hash.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>> {
        Ok(self.entries.lock().get(token_hash).cloned())
    }

    async fn revoke_if_active(
        &self,
        token_hash: &str,
        owner: Uuid,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut entries = self.entries.lock();
        match entries.get_mut(token_hash) {
            Some(record) if record.identity_id == owner && record.is_active(now) => {
                mark_revoked(record, reason, now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke(&self, token_hash: &str, reason: RevocationReason, now: DateTime<Utc>) -> Result<bool> {
        let mut entries = self.entries.lock();
        match entries.get_mut(token_hash) {
            Some(record) if !record.revoked => {
                mark_revoked(record, reason, now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn rotate(
        &self,
        token_hash: &str,
        owner: Uuid,
        replacement: NewRefreshToken,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>> {
        let mut entries = self.entries.lock();

        if entries.contains_key(&replacement.token_hash) {
            return Err(TokenError::Storage("duplicate refresh token hash".into()));
        }

        let successor = replacement.into_record(now);
        match entries.get_mut(token_hash) {
            Some(record) if record.identity_id == owner && record.is_active(now) => {
                mark_revoked(record, RevocationReason::Rotated, now);
                record.replaced_by = Some(successor.id);
            }
            _ => return Ok(None),
        }

        entries.insert(successor.token_hash.clone(), successor.clone());
        Ok(Some(successor))
    }

    async fn revoke_all_for_identity(
        &self,
        identity_id: Uuid,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let mut entries = self.entries.lock();
        let mut revoked = 0u64;
        for record in entries.values_mut().filter(|r| r.identity_id == identity_id && !r.revoked) {
            mark_revoked(record, reason, now);
            revoked = revoked.saturating_add(1);
        }
        Ok(revoked)
    }

    async fn count_active(&self, identity_id: Uuid, now: DateTime<Utc>) -> Result<u64> {
        let entries = self.entries.lock();
        let count = entries
            .values()
            .filter(|r| r.identity_id == identity_id && r.is_active(now))
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }
}
