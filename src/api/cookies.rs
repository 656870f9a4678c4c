//! Token cookies.
//!
//! Both tokens travel as opaque cookies readable only by the server:
//! HttpOnly; Secure; SameSite=None (the mobile webview posts cross-site);
//! Path=/. Max-Age is the remaining TTL in seconds; clearing sets an empty
//! value with Max-Age=0.

use std::time::Duration;

use axum::http::header::InvalidHeaderValue;
use axum::http::{HeaderMap, HeaderValue};

pub const ACCESS_TOKEN_COOKIE: &str = "ACCESS_TOKEN";
pub const REFRESH_TOKEN_COOKIE: &str = "REFRESH_TOKEN";

pub fn token_cookie(
    name: &str,
    token: &str,
    max_age: Duration,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let max_age = max_age.as_secs();
    HeaderValue::from_str(&format!(
        "{name}={token}; Path=/; HttpOnly; Secure; SameSite=None; Max-Age={max_age}"
    ))
}

pub fn clear_cookie(name: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{name}=; Path=/; HttpOnly; Secure; SameSite=None; Max-Age=0"
    ))
}

/// Read a cookie value from the request headers.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
            continue;
        };
        if key.trim() == name && !val.trim().is_empty() {
            return Some(val.trim().to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_cookie_carries_all_attributes() {
        let cookie = token_cookie(ACCESS_TOKEN_COOKIE, "tok", Duration::from_secs(3600)).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "ACCESS_TOKEN=tok; Path=/; HttpOnly; Secure; SameSite=None; Max-Age=3600"
        );
    }

    #[test]
    fn clear_cookie_zeroes_the_value_and_age() {
        let cookie = clear_cookie(REFRESH_TOKEN_COOKIE).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "REFRESH_TOKEN=; Path=/; HttpOnly; Secure; SameSite=None; Max-Age=0"
        );
    }

    #[test]
    fn extract_cookie_walks_the_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("foo=bar; ACCESS_TOKEN=abc123; REFRESH_TOKEN=def456"),
        );
        assert_eq!(
            extract_cookie(&headers, ACCESS_TOKEN_COOKIE).as_deref(),
            Some("abc123")
        );
        assert_eq!(
            extract_cookie(&headers, REFRESH_TOKEN_COOKIE).as_deref(),
            Some("def456")
        );
        assert_eq!(extract_cookie(&headers, "OTHER"), None);
    }

    #[test]
    fn empty_cookie_values_count_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("ACCESS_TOKEN="),
        );
        assert_eq!(extract_cookie(&headers, ACCESS_TOKEN_COOKIE), None);
    }

    #[test]
    fn missing_header_yields_none() {
        let headers = HeaderMap::new();
        assert_eq!(extract_cookie(&headers, ACCESS_TOKEN_COOKIE), None);
    }
}
