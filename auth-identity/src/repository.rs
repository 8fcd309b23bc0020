use crate::{error::*, models::*};
use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::Arc;
use uuid::Uuid;

pub mod postgres;

pub use postgres::PostgresIdentityRepository;

/// Durable storage for identities.
///
/// Emails passed in are already normalized with [`normalize_email`].
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Fails with [`IdentityError::EmailTaken`] when the email is already stored.
    async fn insert(&self, identity: &Identity) -> Result<()>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>>;
}

/// In-memory implementation for development and testing
#[derive(Clone, Default)]
pub struct InMemoryIdentityRepository {
    by_id: Arc<DashMap<Uuid, Identity>>,
    by_email: Arc<DashMap<String, Uuid>>,
}

impl InMemoryIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    async fn insert(&self, identity: &Identity) -> Result<()> {
        // The email entry stays locked until the identity is stored.
        match self.by_email.entry(identity.email.clone()) {
            Entry::Occupied(_) => Err(IdentityError::EmailTaken),
            Entry::Vacant(slot) => {
                self.by_id.insert(identity.id, identity.clone());
                slot.insert(identity.id);
                Ok(())
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let Some(id) = self.by_email.get(email).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.by_id.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>> {
        Ok(self.by_id.get(&id).map(|entry| entry.value().clone()))
    }
}
