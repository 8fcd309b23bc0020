use std::sync::Arc;

use auth_tokens::{
    repository::{InMemoryRefreshTokenRepository, RefreshTokenRepository},
    RefreshTokenLedger, ReusePolicy, RevocationReason, TokenError, DEFAULT_REUSE_GRACE_SECONDS,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

fn ledger(policy: ReusePolicy) -> (RefreshTokenLedger, InMemoryRefreshTokenRepository) {
    let repo = InMemoryRefreshTokenRepository::new();
    (RefreshTokenLedger::new(Arc::new(repo.clone()), policy), repo)
}

#[tokio::test]
async fn token_is_stored_as_digest_only() {
    let (ledger, repo) = ledger(ReusePolicy::Reject);
    let now = Utc::now();
    let record = ledger
        .record(Uuid::new_v4(), "raw-token-value", now + Duration::hours(1), now)
        .await
        .unwrap();

    assert_eq!(record.token_hash.len(), 64);
    assert_ne!(record.token_hash, "raw-token-value");
    assert!(repo.find_by_hash("raw-token-value").await.unwrap().is_none());
    assert!(repo
        .find_by_hash(&RefreshTokenLedger::hash_token("raw-token-value"))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn validate_and_consume_classifies_failures() {
    let (ledger, _) = ledger(ReusePolicy::Reject);
    let now = Utc::now();
    let alice = Uuid::new_v4();
    ledger.record(alice, "live", now + Duration::hours(1), now).await.unwrap();
    ledger.record(alice, "stale", now + Duration::seconds(10), now).await.unwrap();

    assert!(matches!(
        ledger.validate_and_consume("unknown", alice, now).await,
        Err(TokenError::NotFound)
    ));
    assert!(matches!(
        ledger.validate_and_consume("live", Uuid::new_v4(), now).await,
        Err(TokenError::IdentityMismatch)
    ));
    assert!(matches!(
        ledger.validate_and_consume("stale", alice, now + Duration::seconds(10)).await,
        Err(TokenError::Expired)
    ));

    let consumed = ledger.validate_and_consume("live", alice, now).await.unwrap();
    assert!(consumed.revoked);
    assert!(matches!(
        ledger.validate_and_consume("live", alice, now).await,
        Err(TokenError::Revoked)
    ));
}

#[tokio::test]
async fn rotation_is_single_use() {
    let (ledger, _) = ledger(ReusePolicy::Reject);
    let now = Utc::now();
    let alice = Uuid::new_v4();
    let expiry = now + Duration::hours(1);
    ledger.record(alice, "t0", expiry, now).await.unwrap();

    ledger.rotate("t0", alice, "t1", expiry, now).await.unwrap();
    assert!(matches!(
        ledger.rotate("t0", alice, "t1-again", expiry, now).await,
        Err(TokenError::Revoked)
    ));
    // Under the reject policy the successor survives the replay.
    ledger.rotate("t1", alice, "t2", expiry, now).await.unwrap();
}

#[tokio::test]
async fn replaying_an_exchanged_token_revokes_the_whole_identity() {
    let (ledger, _) = ledger(ReusePolicy::RevokeAll);
    let now = Utc::now();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let expiry = now + Duration::hours(1);

    ledger.record(alice, "t0", expiry, now).await.unwrap();
    ledger.record(alice, "other-device", expiry, now).await.unwrap();
    ledger.record(bob, "bob", expiry, now).await.unwrap();
    ledger.rotate("t0", alice, "t1", expiry, now).await.unwrap();

    let later = now + Duration::seconds(DEFAULT_REUSE_GRACE_SECONDS);
    assert!(matches!(
        ledger.rotate("t0", alice, "attacker", expiry, later).await,
        Err(TokenError::Revoked)
    ));
    assert_eq!(ledger.active_count(alice, later).await.unwrap(), 0);
    assert!(matches!(
        ledger.rotate("t1", alice, "t2", expiry, later).await,
        Err(TokenError::Revoked)
    ));
    assert_eq!(ledger.active_count(bob, later).await.unwrap(), 1);
}

#[tokio::test]
async fn duplicate_submission_inside_grace_keeps_the_successor() {
    let (ledger, _) = ledger(ReusePolicy::RevokeAll);
    let now = Utc::now();
    let alice = Uuid::new_v4();
    let expiry = now + Duration::hours(1);
    ledger.record(alice, "t0", expiry, now).await.unwrap();
    ledger.rotate("t0", alice, "t1", expiry, now).await.unwrap();

    let moments_later = now + Duration::seconds(1);
    assert!(matches!(
        ledger.rotate("t0", alice, "t1-duplicate", expiry, moments_later).await,
        Err(TokenError::Revoked)
    ));
    assert_eq!(ledger.active_count(alice, moments_later).await.unwrap(), 1);
    ledger.rotate("t1", alice, "t2", expiry, moments_later).await.unwrap();
}

#[tokio::test]
async fn zero_grace_treats_any_second_presentation_as_replay() {
    let repo = InMemoryRefreshTokenRepository::new();
    let ledger = RefreshTokenLedger::new(Arc::new(repo), ReusePolicy::RevokeAll).with_reuse_grace(Duration::zero());
    let now = Utc::now();
    let alice = Uuid::new_v4();
    let expiry = now + Duration::hours(1);
    ledger.record(alice, "t0", expiry, now).await.unwrap();
    ledger.rotate("t0", alice, "t1", expiry, now).await.unwrap();

    assert!(ledger.rotate("t0", alice, "x", expiry, now).await.is_err());
    assert_eq!(ledger.active_count(alice, now).await.unwrap(), 0);
}

#[tokio::test]
async fn logged_out_tokens_are_rejected_without_containment() {
    let (ledger, _) = ledger(ReusePolicy::RevokeAll);
    let now = Utc::now();
    let alice = Uuid::new_v4();
    let expiry = now + Duration::hours(1);

    ledger.record(alice, "laptop", expiry, now).await.unwrap();
    ledger.record(alice, "phone", expiry, now).await.unwrap();
    ledger.revoke("laptop", RevocationReason::Logout, now).await.unwrap();

    assert!(matches!(
        ledger.rotate("laptop", alice, "x", expiry, now).await,
        Err(TokenError::Revoked)
    ));
    assert_eq!(ledger.active_count(alice, now).await.unwrap(), 1);
}

#[tokio::test]
async fn revoke_is_idempotent() {
    let (ledger, _) = ledger(ReusePolicy::Reject);
    let now = Utc::now();
    let alice = Uuid::new_v4();
    ledger.record(alice, "t0", now + Duration::hours(1), now).await.unwrap();

    ledger.revoke("t0", RevocationReason::Logout, now).await.unwrap();
    ledger.revoke("t0", RevocationReason::Logout, now).await.unwrap();
    ledger.revoke("never-issued", RevocationReason::Logout, now).await.unwrap();
    assert!(matches!(
        ledger.validate_and_consume("t0", alice, now).await,
        Err(TokenError::Revoked)
    ));
}

#[tokio::test]
async fn concurrent_rotation_has_exactly_one_winner() {
    let (ledger, repo) = ledger(ReusePolicy::Reject);
    let ledger = Arc::new(ledger);
    let now = Utc::now();
    let alice = Uuid::new_v4();
    let expiry = now + Duration::hours(1);
    ledger.record(alice, "shared", expiry, now).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..32 {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            ledger.rotate("shared", alice, &format!("next-{i}"), expiry, now).await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(TokenError::Revoked | TokenError::NotFound) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(repo.count_active(alice, now).await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_rotation_under_default_policy_keeps_the_winner() {
    let (ledger, repo) = ledger(ReusePolicy::default());
    let ledger = Arc::new(ledger);
    let now = Utc::now();
    let alice = Uuid::new_v4();
    let expiry = now + Duration::hours(1);
    ledger.record(alice, "shared", expiry, now).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..32 {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            let successor = format!("next-{i}");
            let outcome = ledger.rotate("shared", alice, &successor, expiry, now).await;
            outcome.map(|_| successor)
        }));
    }

    let mut successors = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(successor) => successors.push(successor),
            Err(TokenError::Revoked) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successors.len(), 1);
    assert_eq!(repo.count_active(alice, now).await.unwrap(), 1);
    ledger
        .rotate(successors.first().unwrap(), alice, "after-race", expiry, now)
        .await
        .unwrap();
}
