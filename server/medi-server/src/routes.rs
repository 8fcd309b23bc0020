use crate::{
    handlers::{auth, health},
    server::MediServer,
};
use auth_gateway::{authenticate, require, RoleSet};
use auth_identity::Role;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

/// Create all application routes
pub fn create_routes(server: &MediServer) -> Router<MediServer> {
    Router::new()
        .merge(health_routes())
        .nest("/api/v1/auth", auth_routes(server))
        .nest("/api/v1/admin", admin_routes(server))
}

/// Health check routes
fn health_routes() -> Router<MediServer> {
    Router::new().route("/health", get(health::health_check))
}

/// Authentication routes; profile and logout-all need an access token
fn auth_routes(server: &MediServer) -> Router<MediServer> {
    let protected = Router::new()
        .route("/profile", get(auth::profile))
        .route("/logout-all", post(auth::logout_all))
        .route_layer(from_fn_with_state(server.gate.clone(), authenticate));

    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh-token", post(auth::refresh_token))
        .route("/logout", post(auth::logout))
        .merge(protected)
}

/// Administrative routes, admin role only
fn admin_routes(server: &MediServer) -> Router<MediServer> {
    // Layers run outside-in: authenticate wraps require.
    Router::new()
        .route(
            "/identities/:identity_id/revoke-sessions",
            post(auth::revoke_identity_sessions),
        )
        .route_layer(from_fn_with_state(RoleSet::of([Role::Admin]), require::<RoleSet>))
        .route_layer(from_fn_with_state(server.gate.clone(), authenticate))
}
