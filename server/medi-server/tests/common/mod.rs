#![allow(dead_code)]

use auth_gateway::RoleSet;
use auth_identity::{config::PasswordHashConfig, Role};
use auth_tokens::{ReusePolicy, TokenConfig, DEFAULT_REUSE_GRACE_SECONDS};
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use medi_server::{create_app, AuthSettings, MediServer};
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const PASSWORD: &str = "correct horse battery";

pub fn settings() -> AuthSettings {
    AuthSettings {
        environment: "development".to_string(),
        database_url: None,
        access_secret: SecretString::new("test-access-secret-test-access-secret".to_string()),
        refresh_secret: SecretString::new("test-refresh-secret-test-refresh-secret".to_string()),
        tokens: TokenConfig::default(),
        password: PasswordHashConfig::for_tests(),
        reuse_policy: ReusePolicy::RevokeAll,
        reuse_grace: chrono::Duration::seconds(DEFAULT_REUSE_GRACE_SECONDS),
        self_registration_roles: RoleSet::of([Role::Patient, Role::Doctor]),
        cors_origin: "http://localhost:4200".to_string(),
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `Set-Cookie` header for `name`, if the response sets one.
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{name}=");
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with(&prefix))
            .map(str::to_string)
    }

    /// Value of the cookie `name` as set by this response.
    pub fn cookie_value(&self, name: &str) -> Option<String> {
        let header = self.set_cookie(name)?;
        let pair = header.split(';').next()?;
        pair.split_once('=').map(|(_, value)| value.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub identity_id: String,
}

#[derive(Clone)]
pub struct TestApp {
    pub server: MediServer,
    pub router: Router,
}

impl TestApp {
    pub fn new(settings: AuthSettings) -> Self {
        let server = MediServer::in_memory(settings).unwrap();
        let router = create_app(server.clone());
        Self { server, router }
    }

    pub fn default_app() -> Self {
        Self::new(settings())
    }

    pub fn with_policy(reuse_policy: ReusePolicy) -> Self {
        Self::new(AuthSettings {
            reuse_policy,
            ..settings()
        })
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse { status, headers, body }
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> TestResponse {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_with_cookie(&self, uri: &str, cookie: &str, body: Option<&Value>) -> TestResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::COOKIE, cookie);
        let body = match body {
            Some(body) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    pub async fn with_bearer(&self, method: Method, uri: &str, token: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn register(&self, email: &str, role: &str) -> TestResponse {
        self.post_json(
            "/api/v1/auth/register",
            &json!({
                "firstName": "Alice",
                "lastName": "Liddell",
                "email": email,
                "password": PASSWORD,
                "role": role,
            }),
        )
        .await
    }

    pub async fn login(&self, email: &str) -> Session {
        let response = self
            .post_json("/api/v1/auth/login", &json!({ "email": email, "password": PASSWORD }))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        Session {
            access_token: response.body["data"]["accessToken"].as_str().unwrap().to_string(),
            refresh_token: response.body["data"]["refreshToken"].as_str().unwrap().to_string(),
            identity_id: response.body["data"]["user"]["id"].as_str().unwrap().to_string(),
        }
    }

    pub async fn refresh_with_body(&self, refresh_token: &str) -> TestResponse {
        self.post_json("/api/v1/auth/refresh-token", &json!({ "refreshToken": refresh_token }))
            .await
    }
}
