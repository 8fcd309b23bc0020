// Refresh-token cookie
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Duration;

pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// HttpOnly, same-site strict, scoped to the whole API, living as long as the token.
#[must_use]
pub fn refresh_cookie(token: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(max_age.num_seconds()))
        .build()
}

/// Overwrites the refresh cookie with an empty, already expired one.
#[must_use]
pub fn expired_refresh_cookie(secure: bool) -> Cookie<'static> {
    refresh_cookie(String::new(), Duration::zero(), secure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_cookie_attributes() {
        let cookie = refresh_cookie("abc".into(), Duration::hours(168), true);
        assert_eq!(cookie.name(), REFRESH_TOKEN_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(168)));
    }

    #[test]
    fn development_cookie_is_not_secure() {
        let cookie = refresh_cookie("abc".into(), Duration::hours(1), false);
        assert_eq!(cookie.secure(), Some(false));
        let rendered = cookie.to_string();
        assert!(!rendered.contains("Secure"));
        assert!(rendered.contains("HttpOnly"));
    }

    #[test]
    fn expired_cookie_clears_value() {
        let cookie = expired_refresh_cookie(true);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        assert!(cookie.to_string().contains("Max-Age=0"));
    }
}
