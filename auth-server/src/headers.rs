//! Request and response header helpers for credentials.

use axum::http::HeaderValue;
use http::header::{AUTHORIZATION, CACHE_CONTROL, COOKIE, PRAGMA, SET_COOKIE};
use http::HeaderMap;
use log::warn;

/// Name of the cookie carrying the refresh token id
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Path the refresh cookie is scoped to
const REFRESH_COOKIE_PATH: &str = "/token";

/// Bearer token from the `Authorization` header.
///
/// `None` when the header is absent, not valid text, uses another scheme,
/// or carries an empty token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Value of the first cookie called `name` across all `Cookie` headers
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
}

/// `Set-Cookie` value for the refresh token id
pub fn refresh_cookie(refresh_id: &str, max_age_secs: i64) -> Option<HeaderValue> {
    let cookie = format!(
        "{REFRESH_COOKIE}={refresh_id}; Path={REFRESH_COOKIE_PATH}; Max-Age={}; HttpOnly; Secure; SameSite=Strict",
        max_age_secs.max(0)
    );
    match HeaderValue::from_str(&cookie) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("failed to build refresh cookie: {e}");
            None
        }
    }
}

/// Token responses must never be cached by clients or intermediaries
pub fn apply_no_store(headers: &mut HeaderMap) {
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
}

/// Attach the refresh cookie to a response
pub fn apply_refresh_cookie(headers: &mut HeaderMap, refresh_id: &str, max_age_secs: i64) {
    if let Some(cookie) = refresh_cookie(refresh_id, max_age_secs) {
        headers.append(SET_COOKIE, cookie);
    }
}
