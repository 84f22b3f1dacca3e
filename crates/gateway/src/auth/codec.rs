//! Signed token issuance and verification.
//!
//! Tokens are HS256 JWTs signed with the gateway's symmetric key.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - The declared `alg` must be in the HMAC family before any signature work,
//!   so `none` and asymmetric algorithms never reach the verifier
//! - Signature failures and expiry are reported as distinct errors so callers
//!   can tell a stale token from a forged one
//! - Token strings are never logged

use crate::auth::claims::PayloadClaims;
use crate::auth::clock::{Clock, SystemClock};
use chrono::{TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header};
use jsonwebtoken::Validation;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

/// Maximum accepted token size in bytes (8KB).
///
/// Larger tokens are rejected before base64 decoding or HMAC work.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Algorithm used for every token this gateway issues.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Errors produced by a [`TokenCodec`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Malformed token, wrong algorithm, or signature mismatch.
    #[error("token is invalid")]
    InvalidToken,

    /// Well-formed, correctly signed, but past its expiry.
    #[error("token has expired")]
    ExpiredToken,

    /// Issuance failed for a reason the caller cannot fix.
    #[error("token issuance failed: {0}")]
    Internal(String),
}

/// A freshly issued token together with the claims it carries.
#[derive(Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: PayloadClaims,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"[REDACTED]")
            .field("claims", &self.claims)
            .finish()
    }
}

/// Access and refresh tokens issued together at login.
///
/// Both carry the same subject, email and admin flag; nothing else links them.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Issues and verifies signed tokens.
pub trait TokenCodec: Send + Sync {
    /// Sign a new token for `subject` valid for `ttl`.
    fn issue(
        &self,
        subject: &str,
        email: &str,
        is_admin: bool,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError>;

    /// Verify a token and return its claims.
    fn verify(&self, token: &str) -> Result<PayloadClaims, TokenError>;
}

/// Issue an access/refresh pair for the same identity.
pub fn issue_pair(
    codec: &dyn TokenCodec,
    subject: &str,
    email: &str,
    is_admin: bool,
    access_ttl: Duration,
    refresh_ttl: Duration,
) -> Result<TokenPair, TokenError> {
    let access = codec.issue(subject, email, is_admin, access_ttl)?;
    let refresh = codec.issue(subject, email, is_admin, refresh_ttl)?;
    Ok(TokenPair { access, refresh })
}

/// HS256 JWT implementation of [`TokenCodec`].
pub struct JwtTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for JwtTokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtTokenCodec")
            .field("algorithm", &SIGNING_ALGORITHM)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl JwtTokenCodec {
    /// Create a codec using the system clock.
    pub fn new(secret: &SecretString) -> Self {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    /// Create a codec with an explicit time source.
    pub fn with_clock(secret: &SecretString, clock: Arc<dyn Clock>) -> Self {
        let secret_bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret_bytes),
            decoding_key: DecodingKey::from_secret(secret_bytes),
            clock,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        // Expiry is checked against the injected clock after the signature.
        // `exp` may be fractional, which the library's own presence check
        // rejects; claim deserialization still requires it.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        validation
    }
}

fn is_hmac(alg: Algorithm) -> bool {
    matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

impl TokenCodec for JwtTokenCodec {
    #[instrument(skip_all, fields(is_admin = is_admin, ttl_ms = %ttl.as_millis()))]
    fn issue(
        &self,
        subject: &str,
        email: &str,
        is_admin: bool,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        if ttl.is_zero() {
            return Err(TokenError::Internal("token TTL must be positive".to_string()));
        }

        // Millisecond precision; a sub-millisecond remainder rounds up so the
        // token never dies before `now + ttl`.
        let ttl = chrono::Duration::try_milliseconds(
            i64::try_from(ttl.as_nanos().div_ceil(1_000_000)).unwrap_or(i64::MAX),
        )
        .ok_or_else(|| TokenError::Internal("token TTL overflows".to_string()))?;

        let now_ms = self.clock.now().timestamp_millis();
        let iat = Utc
            .timestamp_millis_opt(now_ms)
            .single()
            .ok_or_else(|| TokenError::Internal("clock out of range".to_string()))?;
        let exp = iat
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Internal("token TTL overflows".to_string()))?;

        let claims = PayloadClaims {
            jti: Uuid::new_v4(),
            sub: subject.to_string(),
            email: email.to_string(),
            is_admin,
            iat,
            exp,
        };

        let mut header = Header::new(SIGNING_ALGORITHM);
        header.typ = Some("JWT".to_string());

        let token = encode(&header, &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(target: "gateway.auth.codec", error = %e, "Failed to sign token");
            TokenError::Internal("failed to sign token".to_string())
        })?;

        tracing::debug!(target: "gateway.auth.codec", jti = %claims.jti, exp = %claims.exp, "Token issued");
        Ok(IssuedToken { token, claims })
    }

    #[instrument(skip_all)]
    fn verify(&self, token: &str) -> Result<PayloadClaims, TokenError> {
        if token.len() > MAX_TOKEN_SIZE_BYTES {
            tracing::debug!(
                target: "gateway.auth.codec",
                token_size = token.len(),
                max_size = MAX_TOKEN_SIZE_BYTES,
                "Token rejected: size exceeds maximum allowed"
            );
            return Err(TokenError::InvalidToken);
        }

        // 1. Algorithm family
        let header = decode_header(token).map_err(|e| {
            tracing::debug!(target: "gateway.auth.codec", error = %e, "Token header unreadable");
            TokenError::InvalidToken
        })?;
        if !is_hmac(header.alg) {
            tracing::warn!(target: "gateway.auth.codec", alg = ?header.alg, "Token rejected: non-HMAC algorithm");
            return Err(TokenError::InvalidToken);
        }

        // 2. Signature
        let data = decode::<PayloadClaims>(token, &self.decoding_key, &Self::validation())
            .map_err(|e| {
                match e.kind() {
                    ErrorKind::InvalidSignature => {
                        tracing::debug!(target: "gateway.auth.codec", "Token rejected: signature mismatch");
                    }
                    other => {
                        tracing::debug!(target: "gateway.auth.codec", error = ?other, "Token rejected");
                    }
                }
                TokenError::InvalidToken
            })?;

        // 3. Expiry
        let claims = data.claims;
        if !claims.is_live_at(self.clock.now()) {
            tracing::debug!(target: "gateway.auth.codec", jti = %claims.jti, exp = %claims.exp, "Token rejected: expired");
            return Err(TokenError::ExpiredToken);
        }

        Ok(claims)
    }
}
