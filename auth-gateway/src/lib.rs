//! Request authentication and authorization gate.
//!
//! Two axum middleware functions make up the gate:
//!
//! - [`authenticate`] verifies the bearer access token (the `Authorization`
//!   header, or an `access_token` cookie when no header is sent) and inserts
//!   the resulting [`AuthContext`] into the request extensions.
//! - [`require`] checks that context against a [`Requirement`], typically a
//!   [`RoleSet`], before the protected handler runs.
//!
//! Handlers take [`AuthContext`] as an extractor and pass it on explicitly.
//!
//! # Example
//!
//! ```rust,ignore
//! use auth_gateway::{authenticate, require, AuthContext, Gate, RoleSet};
//! use auth_identity::Role;
//! use axum::{middleware::from_fn_with_state, routing::get, Router};
//!
//! async fn chart(ctx: AuthContext) -> String {
//!     format!("chart for {}", ctx.subject)
//! }
//!
//! let app: Router = Router::new()
//!     .route("/charts", get(chart))
//!     .route_layer(from_fn_with_state(RoleSet::of([Role::Doctor, Role::Admin]), require::<RoleSet>))
//!     .route_layer(from_fn_with_state(Gate::new(codec), authenticate));
//! ```

pub mod context;
pub mod error;
pub mod middleware;
pub mod requirement;

pub use context::*;
pub use error::*;
pub use middleware::*;
pub use requirement::*;
