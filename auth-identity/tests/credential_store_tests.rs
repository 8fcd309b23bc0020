use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use auth_identity::{
    config::PasswordHashConfig,
    repository::{IdentityRepository, InMemoryIdentityRepository},
    CredentialStore, Identity, IdentityError, NewIdentity, Role,
};
use error_common::AuthErrorKind;
use uuid::Uuid;

fn store() -> CredentialStore {
    CredentialStore::new(
        Arc::new(InMemoryIdentityRepository::new()),
        &PasswordHashConfig::for_tests(),
    )
    .unwrap()
}

fn alice() -> NewIdentity {
    NewIdentity {
        email: "Alice@Example.com".into(),
        password: "wonderland-42".into(),
        first_name: "Alice".into(),
        last_name: "Liddell".into(),
        role: Role::Doctor,
    }
}

#[tokio::test]
async fn registered_identity_verifies_with_any_email_casing() {
    let store = store();
    let registered = store.register(alice()).await.unwrap();
    assert_eq!(registered.email, "alice@example.com");

    let verified = store
        .verify_credentials("  ALICE@example.COM ", "wonderland-42")
        .await
        .unwrap();
    assert_eq!(verified.id, registered.id);
    assert_eq!(verified.role, Role::Doctor);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_fail_the_same_way() {
    let store = store();
    store.register(alice()).await.unwrap();

    let wrong_password = store
        .verify_credentials("alice@example.com", "wrong-password")
        .await
        .unwrap_err();
    let unknown_email = store
        .verify_credentials("nobody@example.com", "wonderland-42")
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, IdentityError::InvalidCredentials));
    assert!(matches!(unknown_email, IdentityError::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    assert_eq!(wrong_password.kind(), AuthErrorKind::InvalidCredentials);
}

#[tokio::test]
async fn unknown_email_still_pays_for_a_hash_check() {
    let mut config = PasswordHashConfig::for_tests();
    config.memory_kib = 4096;
    config.iterations = 3;
    let store = CredentialStore::new(Arc::new(InMemoryIdentityRepository::new()), &config).unwrap();

    let started = Instant::now();
    let _ = store.verify_credentials("nobody@example.com", "whatever").await;
    let unknown = started.elapsed();

    let hash = store.hash_password("calibration").await.unwrap();
    let started = Instant::now();
    let _ = store.check_password("whatever", &hash).await;
    let one_check = started.elapsed();

    // Generous bound: the unknown-email path must not be an order of magnitude cheaper.
    assert!(unknown * 5 >= one_check, "unknown={unknown:?} check={one_check:?}");
    assert!(one_check > Duration::ZERO);
}

#[tokio::test]
async fn first_unknown_email_costs_the_same_as_later_ones() {
    let mut config = PasswordHashConfig::for_tests();
    config.memory_kib = 8192;
    config.iterations = 4;

    let mut first = Duration::ZERO;
    let mut later = Duration::ZERO;
    for _ in 0..3 {
        let store = CredentialStore::new(Arc::new(InMemoryIdentityRepository::new()), &config).unwrap();

        let started = Instant::now();
        let _ = store.verify_credentials("nobody@example.com", "whatever").await;
        first += started.elapsed();

        let started = Instant::now();
        let _ = store.verify_credentials("nobody-else@example.com", "whatever").await;
        later += started.elapsed();
    }

    // Hashing on first use would make the first call roughly twice as slow.
    assert!(first * 2 < later * 3, "first={first:?} later={later:?}");
}

#[tokio::test]
async fn duplicate_email_is_rejected_case_insensitively() {
    let store = store();
    store.register(alice()).await.unwrap();

    let mut again = alice();
    again.email = "ALICE@EXAMPLE.COM".into();
    let err = store.register(again).await.unwrap_err();
    assert!(matches!(err, IdentityError::EmailTaken));
    assert_eq!(err.kind(), AuthErrorKind::EmailTaken);
}

#[tokio::test]
async fn register_validates_input() {
    let store = store();

    let mut bad_email = alice();
    bad_email.email = "not-an-email".into();
    assert!(matches!(store.register(bad_email).await, Err(IdentityError::InvalidEmail)));

    let mut short = alice();
    short.password = "short".into();
    assert!(matches!(
        store.register(short).await,
        Err(IdentityError::WeakPassword { min_length: 8 })
    ));
}

#[tokio::test]
async fn identity_lookup_by_id() {
    let store = store();
    let registered = store.register(alice()).await.unwrap();

    assert_eq!(store.identity(registered.id).await.unwrap().email, "alice@example.com");
    assert!(matches!(store.identity(Uuid::new_v4()).await, Err(IdentityError::NotFound)));
}

struct UnavailableRepository;

#[async_trait]
impl IdentityRepository for UnavailableRepository {
    async fn insert(&self, _identity: &Identity) -> auth_identity::Result<()> {
        Err(IdentityError::Storage("connection refused".into()))
    }

    async fn find_by_email(&self, _email: &str) -> auth_identity::Result<Option<Identity>> {
        Err(IdentityError::Storage("connection refused".into()))
    }

    async fn find_by_id(&self, _id: Uuid) -> auth_identity::Result<Option<Identity>> {
        Err(IdentityError::Storage("connection refused".into()))
    }
}

#[tokio::test]
async fn storage_failures_surface_as_store_unavailable() {
    let store = CredentialStore::new(Arc::new(UnavailableRepository), &PasswordHashConfig::for_tests()).unwrap();

    let err = store.verify_credentials("alice@example.com", "pw").await.unwrap_err();
    assert_eq!(err.kind(), AuthErrorKind::StoreUnavailable);
}
