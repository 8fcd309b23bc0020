//! Common error handling utilities for the Medi authentication stack
//!
//! Every crate in the workspace keeps its own error enum, but each of them
//! classifies itself into the closed [`AuthErrorKind`] taxonomy defined here.
//! The kind decides what a client is allowed to see: an HTTP status, a stable
//! error code and a fixed public message. Anything more specific (SQL errors,
//! hashing failures, which check rejected a token) travels only through
//! [`report`] into the tracing pipeline, correlated by an `error_id`.
//!
//! # Example
//!
//! ```rust
//! use error_common::{report, AuthErrorKind, ClientOutcome};
//!
//! let kind = AuthErrorKind::StoreUnavailable;
//! assert_eq!(kind.outcome(), ClientOutcome::ServerError);
//!
//! let body = report(kind, &"connection reset by peer");
//! assert_eq!(body.message, "Internal server error");
//! assert!(!body.message.contains("connection"));
//! ```

pub mod codes;
pub mod reporting;
pub mod types;

pub use reporting::*;
pub use types::*;
