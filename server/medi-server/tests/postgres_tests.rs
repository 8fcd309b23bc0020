//! Run with a disposable database:
//! `DATABASE_URL=postgres://... cargo test -p medi-server --test postgres_tests -- --ignored`

mod common;

use auth_tokens::ReusePolicy;
use axum::http::StatusCode;
use common::{settings, TestApp};
use medi_server::{create_app, AuthSettings, MediServer};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

async fn postgres_app(reuse_policy: ReusePolicy) -> TestApp {
    postgres_app_with(AuthSettings {
        reuse_policy,
        ..settings()
    })
    .await
}

async fn postgres_app_with(settings: AuthSettings) -> TestApp {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for Postgres tests");
    let pool = PgPoolOptions::new().max_connections(8).connect(&url).await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    let server = MediServer::with_postgres(settings, pool).unwrap();
    let router = create_app(server.clone());
    TestApp { server, router }
}

fn unique_email() -> String {
    format!("pg-{}@example.com", Uuid::new_v4().simple())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn rotation_and_replay_against_postgres() {
    let app = postgres_app_with(AuthSettings {
        reuse_grace: chrono::Duration::zero(),
        ..settings()
    })
    .await;
    let email = unique_email();
    assert_eq!(app.register(&email, "patient").await.status, StatusCode::CREATED);
    let session = app.login(&email).await;

    let first = app.refresh_with_body(&session.refresh_token).await;
    assert_eq!(first.status, StatusCode::OK);
    let rotated = first.body["data"]["refreshToken"].as_str().unwrap().to_string();

    assert_eq!(
        app.refresh_with_body(&session.refresh_token).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(app.refresh_with_body(&rotated).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_refresh_against_postgres() {
    let app = postgres_app(ReusePolicy::Reject).await;
    let email = unique_email();
    app.register(&email, "doctor").await;
    let session = app.login(&email).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let app = app.clone();
            let token = session.refresh_token.clone();
            tokio::spawn(async move { app.refresh_with_body(&token).await.status })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() == StatusCode::OK {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_email_against_postgres() {
    let app = postgres_app(ReusePolicy::RevokeAll).await;
    let email = unique_email();
    assert_eq!(app.register(&email, "patient").await.status, StatusCode::CREATED);

    let response = app.register(&email.to_uppercase(), "patient").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "VALIDATION_1002");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_refresh_under_default_policy_against_postgres() {
    let app = postgres_app(ReusePolicy::default()).await;
    let email = unique_email();
    app.register(&email, "patient").await;
    let session = app.login(&email).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let app = app.clone();
            let token = session.refresh_token.clone();
            tokio::spawn(async move { app.refresh_with_body(&token).await })
        })
        .collect();

    let mut rotated = Vec::new();
    for handle in handles {
        let response = handle.await.unwrap();
        if response.status == StatusCode::OK {
            rotated.push(response.body["data"]["refreshToken"].as_str().unwrap().to_string());
        }
    }

    assert_eq!(rotated.len(), 1);
    assert_eq!(app.refresh_with_body(rotated.first().unwrap()).await.status, StatusCode::OK);
}
