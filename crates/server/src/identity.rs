//! Self-asserted viewer identity.
//!
//! Clients identify themselves with an `x-user-id` header or, failing
//! that, a `userId` cookie. Nothing is authenticated.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ID_COOKIE: &str = "userId";

/// The caller's user id, taken from the header first, then the cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity(pub String);

impl UserIdentity {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let from_header = headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        from_header
            .or_else(|| {
                CookieJar::from_headers(headers)
                    .get(USER_ID_COOKIE)
                    .map(|cookie| cookie.value().trim().to_string())
                    .filter(|value| !value.is_empty())
            })
            .map(UserIdentity)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for UserIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers).ok_or(ApiError::MissingIdentity)
    }
}

/// Long-lived cookie carrying a freshly issued identity
pub fn identity_cookie(user_id: String) -> Cookie<'static> {
    Cookie::build((USER_ID_COOKIE, user_id))
        .path("/")
        .same_site(SameSite::Lax)
        .permanent()
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("from-header"));
        headers.insert("cookie", HeaderValue::from_static("userId=from-cookie"));

        assert_eq!(
            UserIdentity::from_headers(&headers),
            Some(UserIdentity("from-header".into()))
        );
    }

    #[test]
    fn test_cookie_fallback_and_missing() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("theme=dark; userId=abc-123"));
        assert_eq!(UserIdentity::from_headers(&headers).unwrap().as_str(), "abc-123");

        let mut blank = HeaderMap::new();
        blank.insert(USER_ID_HEADER, HeaderValue::from_static("  "));
        assert!(UserIdentity::from_headers(&blank).is_none());
    }

    #[test]
    fn test_identity_cookie_is_persistent() {
        let cookie = identity_cookie("u-1".into());
        assert_eq!(cookie.name(), USER_ID_COOKIE);
        assert_eq!(cookie.value(), "u-1");
        assert!(cookie.max_age().is_some());
    }
}
