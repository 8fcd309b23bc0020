//! Identity records and password credentials.
//!
//! This crate owns everything the authentication stack knows about a person:
//! the [`Identity`] record, its [`Role`], and the Argon2id hash of its
//! password. The [`CredentialStore`] is the only way to check a password, and
//! it answers every failed check with the same [`IdentityError::InvalidCredentials`]
//! regardless of whether the email exists.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use auth_identity::{
//!     config::PasswordHashConfig, repository::InMemoryIdentityRepository, CredentialStore,
//!     NewIdentity, Role,
//! };
//!
//! # async fn demo() -> auth_identity::Result<()> {
//! let store = CredentialStore::new(
//!     Arc::new(InMemoryIdentityRepository::new()),
//!     &PasswordHashConfig::default(),
//! )?;
//!
//! store
//!     .register(NewIdentity {
//!         email: "alice@example.com".into(),
//!         password: "correct horse battery".into(),
//!         first_name: "Alice".into(),
//!         last_name: "Liddell".into(),
//!         role: Role::Doctor,
//!     })
//!     .await?;
//!
//! let alice = store
//!     .verify_credentials("ALICE@example.com", "correct horse battery")
//!     .await?;
//! assert_eq!(alice.role, Role::Doctor);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;

pub use error::*;
pub use models::*;
pub use service::*;
