//! Role gate for admin-only routes.
//!
//! Trusts the `is_admin` flag of the already-verified token. A demoted
//! admin keeps access until the access token expires.

use crate::auth::PayloadClaims;
use crate::errors::GatewayError;
use crate::observability::metrics::record_auth_failure;
use axum::{extract::Request, middleware::Next, response::IntoResponse};
use tracing::instrument;

/// Authorization middleware requiring an admin identity.
///
/// Must run after `require_auth`.
///
/// # Response
///
/// - 500 if no identity is attached (gate wired without `require_auth`)
/// - 403 Forbidden if the caller is not an admin
#[instrument(skip_all, name = "gateway.middleware.roles")]
pub async fn require_admin(req: Request, next: Next) -> Result<impl IntoResponse, GatewayError> {
    let claims = req
        .extensions()
        .get::<PayloadClaims>()
        .ok_or(GatewayError::MissingIdentity)?;

    if !claims.is_admin {
        tracing::debug!(target: "gateway.middleware.roles", jti = %claims.jti, "Admin role required");
        let err = GatewayError::PermissionDenied("admin role required".to_string());
        record_auth_failure("http", err.reason());
        return Err(err);
    }

    Ok(next.run(req).await)
}
