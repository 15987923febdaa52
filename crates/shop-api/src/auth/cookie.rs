//! Session cookie transport
//!
//! The session token travels in a cookie named `token`:
//! `HttpOnly; Path=/; Max-Age=<ttl>; SameSite=Lax`, plus `Secure` in
//! production. Logout overwrites it with an empty, immediately expired value.

use axum::http::{header, HeaderMap, HeaderValue};
use shop_core::AuthConfig;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "token";

/// Attributes applied to the session cookie
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub max_age_secs: u64,
    pub secure: bool,
}

impl From<&AuthConfig> for CookieSettings {
    fn from(config: &AuthConfig) -> Self {
        Self {
            max_age_secs: config.token_ttl_secs,
            secure: config.cookie_secure,
        }
    }
}

/// Build the `Set-Cookie` value carrying a freshly issued token
pub fn session_cookie(
    token: &str,
    settings: &CookieSettings,
) -> Result<HeaderValue, header::InvalidHeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
        settings.max_age_secs
    );
    if settings.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// `Set-Cookie` value that clears the session cookie
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("token=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax")
}

/// Find a cookie value in the request's `Cookie` headers
///
/// An empty value is treated as absent.
pub fn extract_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// Raw session token from the request, unverified
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    extract_cookie(headers, SESSION_COOKIE)
}
