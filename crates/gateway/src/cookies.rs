//! Refresh token cookie handling.
//!
//! The refresh token lives only in an `HttpOnly` cookie named
//! `refresh_token`. Login sets it, logout clears it with the same
//! `Path`/`Domain` so browsers match and drop the stored cookie.

use crate::config::Config;
use axum::http::{header, HeaderMap};
use std::time::Duration;

/// Name of the cookie carrying the refresh token.
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Path attribute of the refresh cookie.
pub const REFRESH_COOKIE_PATH: &str = "/";

const EPOCH_HTTP_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Attributes shared by the issuing and the clearing cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    pub domain: Option<String>,
    pub secure: bool,
}

impl CookieSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            domain: config.cookie_domain.clone(),
            secure: config.cookie_secure,
        }
    }

    /// `Set-Cookie` value carrying a freshly issued refresh token.
    pub fn refresh_cookie(&self, token: &str, max_age: Duration) -> String {
        self.build(token, &format!("Max-Age={}", max_age.as_secs()))
    }

    /// `Set-Cookie` value that makes the client drop the refresh cookie.
    pub fn clearing_cookie(&self) -> String {
        self.build("", &format!("Max-Age=0; Expires={}", EPOCH_HTTP_DATE))
    }

    fn build(&self, value: &str, lifetime: &str) -> String {
        let mut cookie = format!(
            "{}={}; Path={}",
            REFRESH_COOKIE_NAME, value, REFRESH_COOKIE_PATH
        );
        if let Some(domain) = &self.domain {
            cookie.push_str("; Domain=");
            cookie.push_str(domain);
        }
        cookie.push_str("; ");
        cookie.push_str(lifetime);
        cookie.push_str("; HttpOnly");
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Find a cookie value by name across all `Cookie` headers.
///
/// Empty values count as absent.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
        .find(|value| !value.is_empty())
}
