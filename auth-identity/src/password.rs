//! Argon2id password hashing.
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`), so the
//! parameters used at registration travel with the hash and verification keeps
//! working after the configured cost changes.
//!
//! Both directions are CPU-bound and run on the blocking pool.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use tracing::{error, warn};

use crate::config::PasswordHashConfig;
use crate::error::{IdentityError, Result};

#[derive(Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// # Errors
    ///
    /// Fails when the configured cost is outside what argon2 accepts.
    pub fn new(config: &PasswordHashConfig) -> Result<Self> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| IdentityError::Hashing(format!("invalid argon2 parameters: {e}")))?;
        Ok(Self { params })
    }

    /// Hashes `plaintext` with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Fails only if hashing itself fails or the blocking task is lost.
    pub async fn hash_password(&self, plaintext: &str) -> Result<String> {
        let plaintext = plaintext.to_owned();
        let params = self.params.clone();

        tokio::task::spawn_blocking(move || hash_with(params, &plaintext))
            .await
            .map_err(|e| IdentityError::Hashing(format!("hashing task failed: {e}")))?
    }

    /// Same as [`Argon2Hasher::hash_password`], on the calling thread.
    ///
    /// # Errors
    ///
    /// Fails only if hashing itself fails.
    pub fn hash_password_blocking(&self, plaintext: &str) -> Result<String> {
        hash_with(self.params.clone(), plaintext)
    }

    /// True only when `plaintext` matches `hash`. A malformed hash never matches.
    pub async fn check_password(&self, plaintext: &str, hash: &str) -> bool {
        let plaintext = plaintext.to_owned();
        let hash = hash.to_owned();

        let outcome = tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&hash)?;
            // Parameters come from the PHC string, not from self.params.
            Argon2::default().verify_password(plaintext.as_bytes(), &parsed)
        })
        .await;

        match outcome {
            Ok(Ok(())) => true,
            Ok(Err(argon2::password_hash::Error::Password)) => false,
            Ok(Err(e)) => {
                warn!(error = %e, "Stored password hash could not be used");
                false
            }
            Err(e) => {
                error!(error = %e, "Password verification task failed");
                false
            }
        }
    }
}

fn hash_with(params: Params, plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::Hashing(e.to_string()))
}
