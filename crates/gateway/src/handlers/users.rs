//! User handlers proxied to the Identity Service.
//!
//! Profile routes act on the caller's own record, identified by the token
//! subject, never by a client-supplied id.

use crate::errors::GatewayError;
use crate::handlers::{json_body, path_param};
use crate::middleware::Identity;
use crate::models::{AddPhoneRequest, CreateUserRequest, UpdateNameRequest, UserRecord};
use crate::routes::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::header,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /v1/users
#[instrument(skip_all, name = "gateway.handlers.create_user")]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<UserRecord>, GatewayError> {
    let request = json_body(payload)?;
    request.validate()?;

    let user = state.identity.create_user(&request).await?;
    tracing::info!(target: "gateway.handlers.users", user_id = user.id, "User created");

    Ok(Json(user))
}

/// Handler for GET /v1/users/my_profile
#[instrument(skip_all, name = "gateway.handlers.my_profile")]
pub async fn get_my_profile(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<UserRecord>, GatewayError> {
    let user_id = subject_id(&identity)?;
    Ok(Json(state.identity.get_user(user_id).await?))
}

/// Handler for PATCH /v1/users/my_profile
#[instrument(skip_all, name = "gateway.handlers.update_name")]
pub async fn update_my_name(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    payload: Result<Json<UpdateNameRequest>, JsonRejection>,
) -> Result<Json<UserRecord>, GatewayError> {
    let user_id = subject_id(&identity)?;
    let request = json_body(payload)?;
    request.validate()?;

    Ok(Json(state.identity.update_name(user_id, &request).await?))
}

/// Handler for PATCH /v1/users/my_profile/phone_number
#[instrument(skip_all, name = "gateway.handlers.add_phone")]
pub async fn add_my_phone(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    payload: Result<Json<AddPhoneRequest>, JsonRejection>,
) -> Result<Json<UserRecord>, GatewayError> {
    let user_id = subject_id(&identity)?;
    let request = json_body(payload)?;
    request.validate()?;

    Ok(Json(state.identity.add_phone(user_id, &request).await?))
}

/// Body of a successful account deletion.
pub const ACCOUNT_DELETED_MESSAGE: &str = "user deleted";

/// Handler for DELETE /v1/users/my_profile
///
/// Deletes the caller's own account and clears the refresh cookie. Tokens
/// already issued stay valid until they expire.
#[instrument(skip_all, name = "gateway.handlers.delete_account")]
pub async fn delete_my_account(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<impl IntoResponse, GatewayError> {
    let user_id = subject_id(&identity)?;
    state.identity.delete_user(user_id).await?;
    tracing::info!(target: "gateway.handlers.users", user_id, "User deleted own account");

    Ok((
        [(header::SET_COOKIE, state.cookies.clearing_cookie())],
        Json(ACCOUNT_DELETED_MESSAGE),
    ))
}

/// Handler for GET /v1/admin/users/{id}
///
/// Mounted behind `require_auth` and `require_admin`.
#[instrument(skip_all, name = "gateway.handlers.admin_get_user")]
pub async fn get_user_as_admin(
    State(state): State<Arc<AppState>>,
    Identity(admin): Identity,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<UserRecord>, GatewayError> {
    let user_id = path_param(id)?;
    tracing::info!(target: "gateway.handlers.users", admin_jti = %admin.jti, user_id, "Admin user lookup");

    Ok(Json(state.identity.get_user(user_id).await?))
}

/// User id carried in the token subject.
fn subject_id(identity: &Identity) -> Result<i64, GatewayError> {
    identity.0.sub.parse().map_err(|_| {
        tracing::warn!(target: "gateway.handlers.users", jti = %identity.0.jti, "Token subject is not a user id");
        GatewayError::InvalidToken
    })
}
