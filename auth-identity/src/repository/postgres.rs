//! PostgreSQL-backed identity repository

use crate::{error::*, models::*, repository::IdentityRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

pub struct PostgresIdentityRepository {
    pool: PgPool,
}

impl PostgresIdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct IdentityRow {
    id: Uuid,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    role: String,
    is_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = IdentityError;

    fn try_from(row: IdentityRow) -> Result<Self> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| IdentityError::Storage(format!("identity {}: {e}", row.id)))?;

        Ok(Identity {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            role,
            is_verified: row.is_verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, email, password_hash, first_name, last_name, role, is_verified, created_at, updated_at
    FROM identities
"#;

#[async_trait]
impl IdentityRepository for PostgresIdentityRepository {
    async fn insert(&self, identity: &Identity) -> Result<()> {
        debug!(identity_id = %identity.id, role = %identity.role, "Inserting identity");

        sqlx::query(
            r#"
            INSERT INTO identities (
                id, email, password_hash, first_name, last_name, role, is_verified, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(identity.id)
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(&identity.first_name)
        .bind(&identity.last_name)
        .bind(identity.role.as_str())
        .bind(identity.is_verified)
        .bind(identity.created_at)
        .bind(identity.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => IdentityError::EmailTaken,
            _ => IdentityError::from(e),
        })?;

        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let query = format!("{SELECT_COLUMNS} WHERE email = $1");
        let row = sqlx::query_as::<_, IdentityRow>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Identity::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>> {
        let query = format!("{SELECT_COLUMNS} WHERE id = $1");
        let row = sqlx::query_as::<_, IdentityRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Identity::try_from).transpose()
    }
}
