//! Health check handlers.
//!
//! - `/healthz`: Liveness probe, returns OK while the process runs
//! - `/ping`: Connectivity check for clients, returns `{"message": "pong"}`

use crate::models::PingResponse;
use axum::Json;

/// Liveness probe handler.
///
/// Does not check the Identity Service; a slow peer must not get the
/// gateway restarted.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Handler for GET /ping
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        message: "pong".to_string(),
    })
}
