//! PostgreSQL-backed refresh-token repository
//!
//! Revocations are single conditional `UPDATE`s, so concurrent callers racing
//! on the same row serialize on its row lock and exactly one of them sees an
//! affected row. Rotation wraps the conditional update and the successor
//! insert in one transaction.

use crate::{error::*, models::*, repository::RefreshTokenRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

pub struct PostgresRefreshTokenRepository {
    pool: PgPool,
}

impl PostgresRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_in(
        tx: &mut Transaction<'_, Postgres>,
        record: &RefreshTokenRecord,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, identity_id, token_hash, expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            "#,
        )
        .bind(record.id)
        .bind(record.identity_id)
        .bind(&record.token_hash)
        .bind(record.expires_at)
        .bind(record.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    id: Uuid,
    identity_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
    revoked: bool,
    revoked_at: Option<DateTime<Utc>>,
    revocation_reason: Option<String>,
    replaced_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<RefreshTokenRow> for RefreshTokenRecord {
    type Error = TokenError;

    fn try_from(row: RefreshTokenRow) -> Result<Self> {
        let revocation_reason = row
            .revocation_reason
            .as_deref()
            .map(str::parse::<RevocationReason>)
            .transpose()
            .map_err(TokenError::Storage)?;

        Ok(RefreshTokenRecord {
            id: row.id,
            identity_id: row.identity_id,
            token_hash: row.token_hash,
            expires_at: row.expires_at,
            revoked: row.revoked,
            revoked_at: row.revoked_at,
            revocation_reason,
            replaced_by: row.replaced_by,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl RefreshTokenRepository for PostgresRefreshTokenRepository {
    async fn insert(&self, token: NewRefreshToken, now: DateTime<Utc>) -> Result<RefreshTokenRecord> {
        let record = token.into_record(now);

        let mut tx = self.pool.begin().await?;
        Self::insert_in(&mut tx, &record).await?;
        tx.commit().await?;

        debug!(token_id = %record.id, identity_id = %record.identity_id, "Refresh token recorded");
        Ok(record)
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT id, identity_id, token_hash, expires_at, revoked, revoked_at,
                   revocation_reason, replaced_by, created_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.map(RefreshTokenRecord::try_from).transpose()
    }

    async fn revoke_if_active(
        &self,
        token_hash: &str,
        owner: Uuid,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = $3, revocation_reason = $4, updated_at = $3
            WHERE token_hash = $1 AND identity_id = $2 AND revoked = FALSE AND expires_at > $3
            "#,
        )
        .bind(token_hash)
        .bind(owner)
        .bind(now)
        .bind(reason.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke(&self, token_hash: &str, reason: RevocationReason, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = $2, revocation_reason = $3, updated_at = $2
            WHERE token_hash = $1 AND revoked = FALSE
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .bind(reason.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn rotate(
        &self,
        token_hash: &str,
        owner: Uuid,
        replacement: NewRefreshToken,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>> {
        let successor = replacement.into_record(now);
        let mut tx = self.pool.begin().await?;

        let revoked: Option<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = $3, revocation_reason = 'rotated', updated_at = $3
            WHERE token_hash = $1 AND identity_id = $2 AND revoked = FALSE AND expires_at > $3
            RETURNING id
            "#,
        )
        .bind(token_hash)
        .bind(owner)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((previous_id,)) = revoked else {
            tx.rollback().await?;
            return Ok(None);
        };

        Self::insert_in(&mut tx, &successor).await?;

        sqlx::query("UPDATE refresh_tokens SET replaced_by = $2 WHERE id = $1")
            .bind(previous_id)
            .bind(successor.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(previous = %previous_id, successor = %successor.id, "Refresh token rotated");
        Ok(Some(successor))
    }

    async fn revoke_all_for_identity(
        &self,
        identity_id: Uuid,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = $2, revocation_reason = $3, updated_at = $2
            WHERE identity_id = $1 AND revoked = FALSE
            "#,
        )
        .bind(identity_id)
        .bind(now)
        .bind(reason.as_str())
        .execute(&self.pool)
        .await?;

        info!(identity_id = %identity_id, revoked = result.rows_affected(), reason = %reason, "Revoked refresh tokens for identity");
        Ok(result.rows_affected())
    }

    async fn count_active(&self, identity_id: Uuid, now: DateTime<Utc>) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM refresh_tokens
            WHERE identity_id = $1 AND revoked = FALSE AND expires_at > $2
            "#,
        )
        .bind(identity_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}
