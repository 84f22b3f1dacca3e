//! Authentication middleware for protected routes.
//!
//! Extracts the Bearer token from the Authorization header, verifies it with
//! the configured `TokenCodec`, and injects the resulting `PayloadClaims`
//! into request extensions. Handlers read them back through `Identity`.

use crate::auth::{authenticate, PayloadClaims, TokenCodec, AUTHORIZATION_HEADER};
use crate::errors::GatewayError;
use crate::observability::metrics::record_auth_failure;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    /// Codec used to verify bearer tokens.
    pub codec: Arc<dyn TokenCodec>,
}

/// Authentication middleware that verifies bearer tokens.
///
/// # Authorization Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Response
///
/// - Returns 401 Unauthorized with WWW-Authenticate header if the header is
///   missing, malformed, uses another scheme, or carries an invalid/expired token
/// - Continues to next handler with claims in extensions otherwise
#[instrument(skip_all, name = "gateway.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, GatewayError> {
    let header_value = req
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|h| h.to_str().ok());

    let claims = authenticate(state.codec.as_ref(), header_value).map_err(|e| {
        tracing::debug!(target: "gateway.middleware.auth", reason = e.reason(), "Request rejected");
        record_auth_failure("http", e.reason());
        e
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Authenticated identity of the caller.
///
/// Only valid behind `require_auth`. A handler reached without one is a
/// routing bug and answers 500 instead of guessing an identity.
#[derive(Debug, Clone)]
pub struct Identity(pub PayloadClaims);

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<PayloadClaims>()
            .cloned()
            .map(Identity)
            .ok_or(GatewayError::MissingIdentity)
    }
}
