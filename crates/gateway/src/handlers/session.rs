//! Session handlers: login, access token renewal, logout.
//!
//! Refresh tokens travel only in the `refresh_token` cookie on the way in.
//! Renewal issues a new access token and leaves the refresh token alone; it
//! stays valid until its own expiry. Logout clears the cookie but cannot
//! revoke tokens already handed out.

use crate::auth::issue_pair;
use crate::cookies::{get_cookie, REFRESH_COOKIE_NAME};
use crate::errors::GatewayError;
use crate::handlers::json_body;
use crate::models::{LoginRequest, LoginResponse, RenewTokenResponse};
use crate::observability::metrics::{record_auth_failure, record_token_issued};
use crate::routes::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Body of a successful logout.
pub const LOGGED_OUT_MESSAGE: &str = "logged out";

/// Handler for POST /v1/login
///
/// Verifies the credentials with the Identity Service, issues an access and
/// a refresh token, and sets the refresh cookie.
///
/// ## Response
///
/// ```json
/// {
///   "access_token": "eyJ...",
///   "access_token_expires_at": "2024-05-01T12:15:00Z",
///   "refresh_token": "eyJ...",
///   "refresh_token_expires_at": "2024-05-02T12:00:00Z",
///   "user": { "id": 7, "email": "rider@example.com", ... }
/// }
/// ```
#[instrument(skip_all, name = "gateway.handlers.login")]
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let request = json_body(payload)?;
    request.validate()?;

    let user = state.identity.verify_credentials(&request).await?;

    let pair = issue_pair(
        state.codec.as_ref(),
        &user.id.to_string(),
        &user.email,
        user.is_admin,
        state.config.access_token_duration,
        state.config.refresh_token_duration,
    )?;
    record_token_issued("access");
    record_token_issued("refresh");

    tracing::info!(
        target: "gateway.handlers.login",
        user_id = user.id,
        access_jti = %pair.access.claims.jti,
        refresh_jti = %pair.refresh.claims.jti,
        "User logged in"
    );

    let cookie = state
        .cookies
        .refresh_cookie(&pair.refresh.token, state.config.refresh_token_duration);

    let response = LoginResponse {
        access_token_expires_at: pair.access.claims.expires_at(),
        access_token: pair.access.token,
        refresh_token_expires_at: pair.refresh.claims.expires_at(),
        refresh_token: pair.refresh.token,
        user,
    };

    Ok(([(header::SET_COOKIE, cookie)], Json(response)))
}

/// Handler for POST /v1/renew_token
///
/// Reads the refresh token from the cookie only. The new access token copies
/// subject, email and role from the refresh token.
///
/// ## Response
///
/// - 200 `{access_token, access_token_expires_at}`
/// - 401 if the cookie is missing, or the refresh token is invalid or expired
#[instrument(skip_all, name = "gateway.handlers.renew_token")]
pub async fn renew_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<RenewTokenResponse>, GatewayError> {
    let refresh_claims = get_cookie(&headers, REFRESH_COOKIE_NAME)
        .ok_or(GatewayError::MissingCookie)
        .and_then(|token| state.codec.verify(token).map_err(GatewayError::from))
        .map_err(|e| {
            tracing::debug!(target: "gateway.handlers.renew_token", reason = e.reason(), "Renew rejected");
            record_auth_failure("http", e.reason());
            e
        })?;

    let access = state.codec.issue(
        &refresh_claims.sub,
        &refresh_claims.email,
        refresh_claims.is_admin,
        state.config.access_token_duration,
    )?;
    record_token_issued("access");

    tracing::debug!(
        target: "gateway.handlers.renew_token",
        refresh_jti = %refresh_claims.jti,
        access_jti = %access.claims.jti,
        "Access token renewed"
    );

    Ok(Json(RenewTokenResponse {
        access_token_expires_at: access.claims.expires_at(),
        access_token: access.token,
    }))
}

/// Handler for POST /v1/logout
///
/// Always succeeds. The clearing cookie reuses the issuing cookie's `Path`
/// and `Domain`.
#[instrument(skip_all, name = "gateway.handlers.logout")]
pub async fn logout(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, state.cookies.clearing_cookie())],
        Json(LOGGED_OUT_MESSAGE),
    )
}
