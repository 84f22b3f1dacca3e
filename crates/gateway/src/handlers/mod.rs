//! HTTP request handlers for the delivery gateway.

pub mod health;
pub mod metrics;
pub mod session;
pub mod users;

pub use health::{health_check, ping};
pub use metrics::metrics_handler;
pub use session::{login, logout, renew_token};
pub use users::{
    add_my_phone, create_user, delete_my_account, get_my_profile, get_user_as_admin,
    update_my_name,
};

use crate::errors::GatewayError;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Json, Path};

/// Turn a JSON body rejection into the gateway's `{"error": ..}` shape.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, GatewayError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| GatewayError::BadRequest(e.body_text()))
}

/// Turn a path rejection into the gateway's `{"error": ..}` shape.
pub(crate) fn path_param<T>(param: Result<Path<T>, PathRejection>) -> Result<T, GatewayError> {
    param
        .map(|Path(value)| value)
        .map_err(|e| GatewayError::BadRequest(e.body_text()))
}
