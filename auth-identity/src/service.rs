use crate::{config::*, error::*, models::*, password::Argon2Hasher, repository::*};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::ValidateEmail;

/// Verifies credentials and registers identities.
pub struct CredentialStore {
    repository: Arc<dyn IdentityRepository>,
    hasher: Argon2Hasher,
    min_password_length: usize,
    /// Verified against when the email is unknown, so both failure paths cost one hash check.
    dummy_hash: String,
}

impl CredentialStore {
    /// # Errors
    ///
    /// Fails when the hashing cost in `config` is invalid.
    ///
    /// Hashes once on the calling thread to prepare the unknown-email path.
    pub fn new(repository: Arc<dyn IdentityRepository>, config: &PasswordHashConfig) -> Result<Self> {
        let hasher = Argon2Hasher::new(config)?;
        let dummy_hash = hasher.hash_password_blocking(&Uuid::new_v4().to_string())?;
        Ok(Self {
            repository,
            hasher,
            min_password_length: config.min_password_length,
            dummy_hash,
        })
    }

    /// Returns the identity whose email and password both match.
    ///
    /// An unknown email and a wrong password fail identically with
    /// [`IdentityError::InvalidCredentials`]. Storage failures propagate.
    ///
    /// # Errors
    ///
    /// See above.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Identity> {
        let email = normalize_email(email);

        match self.repository.find_by_email(&email).await? {
            Some(identity) => {
                if self.hasher.check_password(password, &identity.password_hash).await {
                    Ok(identity)
                } else {
                    debug!(identity_id = %identity.id, "Password mismatch");
                    Err(IdentityError::InvalidCredentials)
                }
            }
            None => {
                let _ = self.hasher.check_password(password, &self.dummy_hash).await;
                Err(IdentityError::InvalidCredentials)
            }
        }
    }

    /// Creates a new identity with a freshly hashed password.
    ///
    /// # Errors
    ///
    /// [`IdentityError::InvalidEmail`] or [`IdentityError::WeakPassword`] for bad
    /// input, [`IdentityError::EmailTaken`] when the email is already registered.
    pub async fn register(&self, new: NewIdentity) -> Result<Identity> {
        let email = normalize_email(&new.email);
        if !email.validate_email() {
            return Err(IdentityError::InvalidEmail);
        }

        if new.password.chars().count() < self.min_password_length {
            return Err(IdentityError::WeakPassword {
                min_length: self.min_password_length,
            });
        }

        if self.repository.find_by_email(&email).await?.is_some() {
            return Err(IdentityError::EmailTaken);
        }

        let password_hash = self.hasher.hash_password(&new.password).await?;
        let now = Utc::now();
        let identity = Identity {
            id: Uuid::new_v4(),
            email,
            password_hash,
            first_name: new.first_name.trim().to_string(),
            last_name: new.last_name.trim().to_string(),
            role: new.role,
            is_verified: false,
            created_at: now,
            updated_at: now,
        };

        // The repository re-checks uniqueness; two concurrent registrations cannot both land.
        self.repository.insert(&identity).await?;
        info!(identity_id = %identity.id, role = %identity.role, "Identity registered");

        Ok(identity)
    }

    /// # Errors
    ///
    /// [`IdentityError::NotFound`] when no identity has this id.
    pub async fn identity(&self, id: Uuid) -> Result<Identity> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(IdentityError::NotFound)
    }

    /// # Errors
    ///
    /// Fails only if hashing itself fails.
    pub async fn hash_password(&self, plaintext: &str) -> Result<String> {
        self.hasher.hash_password(plaintext).await
    }

    pub async fn check_password(&self, plaintext: &str, hash: &str) -> bool {
        self.hasher.check_password(plaintext, hash).await
    }
}
