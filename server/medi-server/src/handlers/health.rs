use crate::server::MediServer;
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime: u64,
    pub checks: HashMap<String, String>,
}

/// Liveness plus a database probe when one is configured.
pub async fn health_check(State(server): State<MediServer>) -> (StatusCode, Json<HealthResponse>) {
    let mut checks = HashMap::new();
    let mut healthy = true;

    match &server.pool {
        Some(pool) => match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => {
                checks.insert("database".to_string(), "healthy".to_string());
            }
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                checks.insert("database".to_string(), "unhealthy".to_string());
                healthy = false;
            }
        },
        None => {
            checks.insert("database".to_string(), "in-memory".to_string());
        }
    }

    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (
        status,
        Json(HealthResponse {
            status: if healthy { "healthy" } else { "degraded" }.to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime: server.started_at.elapsed().as_secs(),
            checks,
        }),
    )
}
