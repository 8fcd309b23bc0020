use crate::auth::{AuthSettings, SessionOrchestrator};
use auth_gateway::Gate;
use auth_identity::{
    repository::{IdentityRepository, InMemoryIdentityRepository, PostgresIdentityRepository},
    CredentialStore, IdentityError,
};
use auth_tokens::{
    repository::{InMemoryRefreshTokenRepository, PostgresRefreshTokenRepository, RefreshTokenRepository},
    RefreshTokenLedger, TokenCodec,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;

/// Main Medi server state
#[derive(Clone)]
pub struct MediServer {
    /// Validated start-up settings
    pub settings: Arc<AuthSettings>,
    /// Login, refresh and logout
    pub sessions: Arc<SessionOrchestrator>,
    /// Access-token verification for protected routes
    pub gate: Gate,
    /// Present when backed by Postgres; probed by the health check
    pub pool: Option<PgPool>,
    pub started_at: Instant,
}

impl MediServer {
    /// Wires the session components over the given repositories.
    ///
    /// # Errors
    ///
    /// Fails when the password hashing cost in `settings` is rejected.
    pub fn from_repositories(
        settings: AuthSettings,
        identities: Arc<dyn IdentityRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
    ) -> Result<Self, IdentityError> {
        let credentials = Arc::new(CredentialStore::new(identities, &settings.password)?);
        let codec = Arc::new(TokenCodec::new(
            settings.tokens.clone(),
            settings.access_key(),
            settings.refresh_key(),
        ));
        let ledger = Arc::new(
            RefreshTokenLedger::new(refresh_tokens, settings.reuse_policy).with_reuse_grace(settings.reuse_grace),
        );
        let sessions = Arc::new(SessionOrchestrator::new(
            credentials,
            Arc::clone(&codec),
            ledger,
            settings.self_registration_roles,
        ));

        Ok(Self {
            settings: Arc::new(settings),
            sessions,
            gate: Gate::new(codec),
            pool: None,
            started_at: Instant::now(),
        })
    }

    /// Postgres-backed server.
    ///
    /// # Errors
    ///
    /// See [`MediServer::from_repositories`].
    pub fn with_postgres(settings: AuthSettings, pool: PgPool) -> Result<Self, IdentityError> {
        let mut server = Self::from_repositories(
            settings,
            Arc::new(PostgresIdentityRepository::new(pool.clone())),
            Arc::new(PostgresRefreshTokenRepository::new(pool.clone())),
        )?;
        server.pool = Some(pool);
        Ok(server)
    }

    /// Process-local stores; everything is lost on restart.
    ///
    /// # Errors
    ///
    /// See [`MediServer::from_repositories`].
    pub fn in_memory(settings: AuthSettings) -> Result<Self, IdentityError> {
        Self::from_repositories(
            settings,
            Arc::new(InMemoryIdentityRepository::new()),
            Arc::new(InMemoryRefreshTokenRepository::new()),
        )
    }
}
