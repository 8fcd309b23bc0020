use crate::{
    auth::cookies::{expired_refresh_cookie, refresh_cookie, REFRESH_TOKEN_COOKIE},
    error::{ApiError, ApiResponse, ApiResult},
    extract::{invalid_body, ValidatedJson},
    server::MediServer,
};
use auth_gateway::AuthContext;
use auth_identity::{NewIdentity, Role, SanitizedIdentity};
use auth_tokens::TokenPair;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body form of the refresh token, kept for clients that cannot use the cookie.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenBody {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

impl From<&TokenPair> for TokenResponse {
    fn from(pair: &TokenPair) -> Self {
        Self {
            access_token: pair.access.token.clone(),
            refresh_token: pair.refresh.token.clone(),
            access_token_expires_at: pair.access.expires_at(),
            refresh_token_expires_at: pair.refresh.expires_at(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenResponse,
    pub user: SanitizedIdentity,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokedSessions {
    pub revoked_sessions: u64,
}

/// Register a new identity
pub async fn register(
    State(server): State<MediServer>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SanitizedIdentity>>)> {
    let identity = server
        .sessions
        .register(NewIdentity {
            email: request.email,
            password: request.password,
            first_name: request.first_name,
            last_name: request.last_name,
            role: request.role,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(identity).with_message("Registration successful")),
    ))
}

/// Exchange credentials for a token pair; the refresh token is also set as a cookie
pub async fn login(
    State(server): State<MediServer>,
    jar: CookieJar,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<(CookieJar, Json<ApiResponse<LoginResponse>>)> {
    let outcome = server.sessions.login(&request.email, &request.password).await?;

    let jar = jar.add(issue_cookie(&server, &outcome.tokens));
    Ok((
        jar,
        Json(
            ApiResponse::ok(LoginResponse {
                tokens: TokenResponse::from(&outcome.tokens),
                user: outcome.identity,
            })
            .with_message("Login successful"),
        ),
    ))
}

/// Rotate a refresh token. The cookie wins over the body when both are sent.
///
/// A token the server refuses is also removed from the browser.
pub async fn refresh_token(
    State(server): State<MediServer>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, Json<ApiResponse<TokenResponse>>), (CookieJar, ApiError)> {
    let presented = match cookie_token(&jar) {
        Some(token) => token,
        None => match body_token(&body) {
            Ok(Some(token)) => token,
            Ok(None) => return Err((jar, ApiError::bad_request("Refresh token is required"))),
            Err(err) => return Err((jar, err)),
        },
    };

    let tokens = match server.sessions.refresh(&presented).await {
        Ok(tokens) => tokens,
        Err(err) => {
            let err = ApiError::from(err);
            let jar = if err.status_code() == StatusCode::UNAUTHORIZED {
                jar.add(expired_refresh_cookie(server.settings.secure_cookies()))
            } else {
                jar
            };
            return Err((jar, err));
        }
    };

    let jar = jar.add(issue_cookie(&server, &tokens));
    Ok((
        jar,
        Json(ApiResponse::ok(TokenResponse::from(&tokens)).with_message("Token refreshed successfully")),
    ))
}

/// Revoke the presented refresh token(s) and clear the cookie.
///
/// Answers success whether or not a token was sent or known.
pub async fn logout(
    State(server): State<MediServer>,
    jar: CookieJar,
    body: Bytes,
) -> ApiResult<(CookieJar, Json<ApiResponse<()>>)> {
    // An unreadable body is ignored; the cookie may still carry the token.
    let from_body = body_token(&body).ok().flatten();
    let from_cookie = cookie_token(&jar);

    if let Some(token) = &from_body {
        server.sessions.logout(token).await?;
    }
    if let Some(token) = from_cookie.filter(|token| Some(token) != from_body.as_ref()) {
        server.sessions.logout(&token).await?;
    }

    let jar = jar.add(expired_refresh_cookie(server.settings.secure_cookies()));
    Ok((jar, Json(ApiResponse::ok(()).with_message("Logged out successfully"))))
}

/// Revoke every refresh token of the caller
pub async fn logout_all(
    State(server): State<MediServer>,
    context: AuthContext,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<ApiResponse<RevokedSessions>>)> {
    let revoked_sessions = server.sessions.logout_all(context.subject).await?;

    let jar = jar.add(expired_refresh_cookie(server.settings.secure_cookies()));
    Ok((
        jar,
        Json(ApiResponse::ok(RevokedSessions { revoked_sessions }).with_message("Logged out of all sessions")),
    ))
}

/// Current identity
pub async fn profile(
    State(server): State<MediServer>,
    context: AuthContext,
) -> ApiResult<Json<ApiResponse<SanitizedIdentity>>> {
    let identity = server.sessions.profile(&context).await?;
    Ok(Json(ApiResponse::ok(identity)))
}

/// Admin: end every session of another identity
pub async fn revoke_identity_sessions(
    State(server): State<MediServer>,
    context: AuthContext,
    Path(identity_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<RevokedSessions>>> {
    let revoked_sessions = server.sessions.logout_all(identity_id).await?;
    info!(admin = %context.subject, identity_id = %identity_id, revoked_sessions, "Sessions revoked by admin");
    Ok(Json(ApiResponse::ok(RevokedSessions { revoked_sessions })))
}

fn issue_cookie(server: &MediServer, tokens: &TokenPair) -> axum_extra::extract::cookie::Cookie<'static> {
    refresh_cookie(
        tokens.refresh.token.clone(),
        server.settings.tokens.refresh_ttl(),
        server.settings.secure_cookies(),
    )
}

fn cookie_token(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

fn body_token(body: &Bytes) -> ApiResult<Option<String>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let parsed: RefreshTokenBody = serde_json::from_slice(body).map_err(invalid_body)?;
    Ok(parsed.refresh_token.filter(|token| !token.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_has_no_token() {
        assert_eq!(body_token(&Bytes::new()).unwrap(), None);
        assert_eq!(body_token(&Bytes::from_static(b"  \n")).unwrap(), None);
        assert_eq!(body_token(&Bytes::from_static(b"{}")).unwrap(), None);
        assert_eq!(body_token(&Bytes::from_static(br#"{"refreshToken":""}"#)).unwrap(), None);
    }

    #[test]
    fn body_token_is_read() {
        let body = Bytes::from_static(br#"{"refreshToken":"abc"}"#);
        assert_eq!(body_token(&body).unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn garbage_body_is_a_bad_request() {
        let err = body_token(&Bytes::from_static(b"refreshToken=abc")).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { .. }));
    }

    #[test]
    fn parser_detail_stays_out_of_the_message() {
        let err = body_token(&Bytes::from_static(br#"{"refreshToken": 42}"#)).unwrap_err();
        match err {
            ApiError::BadRequest { message } => assert_eq!(message, crate::extract::INVALID_BODY_MESSAGE),
            other => panic!("expected a bad request, got {other:?}"),
        }
    }

    #[test]
    fn register_request_rules() {
        let request: RegisterRequest = serde_json::from_str(
            r#"{"firstName":"","lastName":"Liddell","email":"not-an-email","password":"short","role":"Patient"}"#,
        )
        .unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("first_name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert_eq!(request.role, Role::Patient);
    }
}
