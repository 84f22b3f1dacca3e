//! Gateway configuration.
//!
//! Configuration is loaded once from environment variables and handed to the
//! token codec, the gates and the handlers. The signing key is redacted in
//! Debug output.

use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default Identity Service base URL.
pub const DEFAULT_USERS_SERVICE_ADDRESS: &str = "http://localhost:8081";

/// Default access token lifetime (15 minutes).
pub const DEFAULT_ACCESS_TOKEN_DURATION_SECONDS: u64 = 900;

/// Default refresh token lifetime (24 hours).
pub const DEFAULT_REFRESH_TOKEN_DURATION_SECONDS: u64 = 86_400;

/// Default request timeout for the HTTP router.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Default domain attribute of the refresh token cookie.
pub const DEFAULT_COOKIE_DOMAIN: &str = "localhost";

/// Minimum accepted length of the symmetric signing key in bytes.
pub const MIN_SYMMETRIC_KEY_BYTES: usize = 32;

/// gRPC methods reachable without a bearer token.
pub const DEFAULT_GRPC_PUBLIC_METHODS: [&str; 2] = [
    "/proto.UsersService/CreateUser",
    "/proto.UsersService/LoginUser",
];

/// Gateway configuration.
#[derive(Clone)]
pub struct Config {
    /// HS256 signing key shared by every token this gateway issues.
    pub token_symmetric_key: SecretString,

    /// HTTP bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Base URL of the Identity Service.
    pub users_service_address: String,

    /// Lifetime of access tokens.
    pub access_token_duration: Duration,

    /// Lifetime of refresh tokens. Always longer than the access lifetime.
    pub refresh_token_duration: Duration,

    /// Domain attribute of the refresh cookie; `None` omits the attribute.
    pub cookie_domain: Option<String>,

    /// Whether the refresh cookie carries `Secure`. Turn on in production.
    pub cookie_secure: bool,

    /// Full gRPC method paths that bypass authentication.
    pub grpc_public_methods: Vec<String>,

    /// Per-request timeout applied by the HTTP router.
    pub request_timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token_symmetric_key", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("users_service_address", &self.users_service_address)
            .field("access_token_duration", &self.access_token_duration)
            .field("refresh_token_duration", &self.refresh_token_duration)
            .field("cookie_domain", &self.cookie_domain)
            .field("cookie_secure", &self.cookie_secure)
            .field("grpc_public_methods", &self.grpc_public_methods)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let key = vars
            .get("TOKEN_SYMMETRIC_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("TOKEN_SYMMETRIC_KEY".to_string()))?;
        if key.len() < MIN_SYMMETRIC_KEY_BYTES {
            return Err(ConfigError::InvalidValue(format!(
                "TOKEN_SYMMETRIC_KEY must be at least {} bytes, got {}",
                MIN_SYMMETRIC_KEY_BYTES,
                key.len()
            )));
        }
        let token_symmetric_key = SecretString::from(key.clone());

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let users_service_address = vars
            .get("USERS_SERVICE_ADDRESS")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_USERS_SERVICE_ADDRESS.to_string());

        let access_token_duration = Duration::from_secs(parse_positive_secs(
            vars,
            "ACCESS_TOKEN_DURATION_SECONDS",
            DEFAULT_ACCESS_TOKEN_DURATION_SECONDS,
        )?);

        let refresh_token_duration = Duration::from_secs(parse_positive_secs(
            vars,
            "REFRESH_TOKEN_DURATION_SECONDS",
            DEFAULT_REFRESH_TOKEN_DURATION_SECONDS,
        )?);

        if refresh_token_duration <= access_token_duration {
            return Err(ConfigError::InvalidValue(format!(
                "REFRESH_TOKEN_DURATION_SECONDS ({}) must exceed ACCESS_TOKEN_DURATION_SECONDS ({})",
                refresh_token_duration.as_secs(),
                access_token_duration.as_secs()
            )));
        }

        let cookie_domain = match vars.get("COOKIE_DOMAIN") {
            Some(domain) if domain.trim().is_empty() => None,
            Some(domain) => Some(domain.trim().to_string()),
            None => Some(DEFAULT_COOKIE_DOMAIN.to_string()),
        };

        let cookie_secure = match vars.get("COOKIE_SECURE").map(|v| v.trim().to_lowercase()) {
            None => false,
            Some(v) if v == "true" || v == "1" => true,
            Some(v) if v == "false" || v == "0" => false,
            Some(v) => {
                return Err(ConfigError::InvalidValue(format!(
                    "COOKIE_SECURE must be true or false, got '{}'",
                    v
                )))
            }
        };

        let grpc_public_methods = match vars.get("GRPC_PUBLIC_METHODS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(|m| {
                    if m.starts_with('/') {
                        Ok(m.to_string())
                    } else {
                        Err(ConfigError::InvalidValue(format!(
                            "GRPC_PUBLIC_METHODS entries must be full method paths, got '{}'",
                            m
                        )))
                    }
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => DEFAULT_GRPC_PUBLIC_METHODS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        };

        let request_timeout = Duration::from_secs(parse_positive_secs(
            vars,
            "REQUEST_TIMEOUT_SECONDS",
            DEFAULT_REQUEST_TIMEOUT_SECONDS,
        )?);

        Ok(Config {
            token_symmetric_key,
            bind_address,
            users_service_address,
            access_token_duration,
            refresh_token_duration,
            cookie_domain,
            cookie_secure,
            grpc_public_methods,
            request_timeout,
        })
    }

    /// Length of the signing key, for startup logging.
    pub fn token_key_len(&self) -> usize {
        self.token_symmetric_key.expose_secret().len()
    }
}

fn parse_positive_secs(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(value_str) = vars.get(name) else {
        return Ok(default);
    };

    let value: u64 = value_str.trim().parse().map_err(|e| {
        ConfigError::InvalidValue(format!(
            "{} must be a valid positive integer, got '{}': {}",
            name, value_str, e
        ))
    })?;

    if value == 0 {
        return Err(ConfigError::InvalidValue(format!(
            "{} must be greater than 0",
            name
        )));
    }

    Ok(value)
}
