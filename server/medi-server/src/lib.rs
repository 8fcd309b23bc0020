//! Medi authentication server
//!
//! HTTP surface for the session lifecycle: registration, login, refresh-token
//! rotation, logout, and role-gated access for downstream routes.

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

// Re-export commonly used types
pub use auth::{AuthSettings, SessionOrchestrator};
pub use error::*;
pub use server::MediServer;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the main application router with all routes and middleware
pub fn create_app(server: MediServer) -> Router {
    routes::create_routes(&server)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::create_cors_layer(&server.settings.cors_origin)),
        )
        .with_state(server)
}
