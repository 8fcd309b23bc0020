use clap::Parser;
use error_common::{MediError, Result};
use logger_redacted::LoggerConfig;
use medi_server::{create_app, AuthSettings, MediServer};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, time::Duration};
use tracing::{info, warn};

/// Medi authentication HTTP server
#[derive(Parser, Debug)]
#[command(name = "medi-server")]
#[command(about = "Login, refresh-token rotation and role-gated access for Medi")]
struct Args {
    /// Server bind address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Server port
    #[arg(short, long, env = "PORT", default_value = "3001")]
    port: u16,

    /// Optional configuration file; environment variables override it
    #[arg(short, long, env = "MEDI_CONFIG")]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Keep identities and refresh tokens in process memory instead of Postgres
    #[arg(long)]
    in_memory: bool,

    /// Maximum database connections
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value = "10")]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let settings = AuthSettings::load(args.config.as_deref())
        .map_err(|e| MediError::ConfigError(e.to_string()))?;

    logger_redacted::init(&LoggerConfig::for_environment(&settings.environment, args.verbose))
        .map_err(|e| MediError::ServerError(format!("Failed to initialise logging: {e}")))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %settings.environment,
        reuse_policy = ?settings.reuse_policy,
        reuse_grace_seconds = settings.reuse_grace.num_seconds(),
        "Starting Medi server"
    );

    let server = if args.in_memory {
        warn!("Running with in-memory stores; all identities and sessions are lost on exit");
        MediServer::in_memory(settings)
    } else {
        let database_url = settings
            .database_url
            .clone()
            .ok_or_else(|| MediError::ConfigError("DATABASE_URL is required unless --in-memory is set".into()))?;

        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url.expose_secret())
            .await
            .map_err(|e| MediError::DatabaseError(format!("Failed to connect: {e}")))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| MediError::DatabaseError(format!("Migration failed: {e}")))?;
        info!("Database migrations applied");

        MediServer::with_postgres(settings, pool)
    }
    .map_err(|e| MediError::ConfigError(e.to_string()))?;

    let app = create_app(server);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|e| MediError::ConfigError(format!("Invalid bind address: {e}")))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| MediError::ServerError(format!("Failed to bind to {addr}: {e}")))?;

    info!(%addr, "Medi server listening");
    info!("Authentication endpoints: http://{addr}/api/v1/auth");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| MediError::ServerError(format!("HTTP server error: {e}")))?;

    info!("Medi server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
