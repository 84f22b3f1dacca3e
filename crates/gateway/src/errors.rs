//! Gateway error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl and are
//! rendered as `{"error": "<message>"}`. Messages returned to clients never
//! carry internal details; those are logged server-side.

use crate::auth::codec::TokenError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Value of the `WWW-Authenticate` header on 401 responses.
const WWW_AUTHENTICATE_VALUE: &str = "Bearer realm=\"delivery-gateway\"";

/// Gateway error type.
///
/// Maps to HTTP status codes:
/// - MalformedHeader, UnsupportedScheme, InvalidToken, ExpiredToken,
///   MissingCookie, InvalidCredentials: 401 Unauthorized
/// - PermissionDenied: 403 Forbidden
/// - BadRequest: 400, NotFound: 404, Conflict: 409
/// - MissingIdentity, DownstreamUnavailable, Internal: 500
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Malformed authorization header: {0}")]
    MalformedHeader(String),

    #[error("Unsupported authorization scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Expired token")]
    ExpiredToken,

    #[error("Missing refresh token cookie")]
    MissingCookie,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A handler behind the auth gate found no identity in the request.
    #[error("Authenticated identity missing from request")]
    MissingIdentity,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Downstream unavailable: {0}")]
    DownstreamUnavailable(String),

    #[error("Internal server error")]
    Internal,
}

impl GatewayError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::MalformedHeader(_)
            | GatewayError::UnsupportedScheme(_)
            | GatewayError::InvalidToken
            | GatewayError::ExpiredToken
            | GatewayError::MissingCookie
            | GatewayError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            GatewayError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::MissingIdentity
            | GatewayError::DownstreamUnavailable(_)
            | GatewayError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Bounded label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            GatewayError::MalformedHeader(_) => "malformed_header",
            GatewayError::UnsupportedScheme(_) => "unsupported_scheme",
            GatewayError::InvalidToken => "invalid_token",
            GatewayError::ExpiredToken => "expired_token",
            GatewayError::MissingCookie => "missing_cookie",
            GatewayError::InvalidCredentials => "invalid_credentials",
            GatewayError::PermissionDenied(_) => "permission_denied",
            GatewayError::MissingIdentity => "missing_identity",
            GatewayError::BadRequest(_) => "bad_request",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::Conflict(_) => "conflict",
            GatewayError::DownstreamUnavailable(_) => "downstream_unavailable",
            GatewayError::Internal => "internal",
        }
    }

    /// Message safe to show to clients.
    pub fn client_message(&self) -> String {
        match self {
            GatewayError::MalformedHeader(reason) => reason.clone(),
            GatewayError::UnsupportedScheme(scheme) => {
                format!("unsupported authorization type {}", scheme)
            }
            GatewayError::InvalidToken => TokenError::InvalidToken.to_string(),
            GatewayError::ExpiredToken => TokenError::ExpiredToken.to_string(),
            GatewayError::MissingCookie => "refresh token cookie is not provided".to_string(),
            GatewayError::InvalidCredentials => "invalid email or password".to_string(),
            GatewayError::PermissionDenied(reason) => reason.clone(),
            GatewayError::BadRequest(reason) => reason.clone(),
            GatewayError::NotFound(resource) => resource.clone(),
            GatewayError::Conflict(reason) => reason.clone(),
            GatewayError::DownstreamUnavailable(_) => {
                "downstream service is unavailable".to_string()
            }
            GatewayError::MissingIdentity | GatewayError::Internal => {
                "an internal error occurred".to_string()
            }
        }
    }
}

impl From<TokenError> for GatewayError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken => GatewayError::InvalidToken,
            TokenError::ExpiredToken => GatewayError::ExpiredToken,
            TokenError::Internal(reason) => {
                tracing::error!(target: "gateway.errors", reason = %reason, "Token issuance failed");
                GatewayError::Internal
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            GatewayError::DownstreamUnavailable(reason) => {
                tracing::warn!(target: "gateway.downstream", reason = %reason, "Downstream unavailable");
            }
            GatewayError::MissingIdentity => {
                tracing::error!(target: "gateway.errors", "Handler reached without an authenticated identity");
            }
            _ => {}
        }

        let body = ErrorResponse {
            error: self.client_message(),
        };
        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(WWW_AUTHENTICATE_VALUE),
            );
        }

        response
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn read_body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GatewayError::MalformedHeader("x".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::UnsupportedScheme("basic".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(GatewayError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(GatewayError::ExpiredToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(GatewayError::MissingCookie.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            GatewayError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::PermissionDenied("x".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            GatewayError::MissingIdentity.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatewayError::DownstreamUnavailable("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatewayError::BadRequest("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::NotFound("x".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::Conflict("x".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            GatewayError::Internal.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_token_error_conversion_keeps_expired_distinct() {
        assert!(matches!(
            GatewayError::from(TokenError::ExpiredToken),
            GatewayError::ExpiredToken
        ));
        assert!(matches!(
            GatewayError::from(TokenError::InvalidToken),
            GatewayError::InvalidToken
        ));
        assert!(matches!(
            GatewayError::from(TokenError::Internal("boom".to_string())),
            GatewayError::Internal
        ));
    }

    #[tokio::test]
    async fn test_unauthorized_response_shape() {
        let response = GatewayError::ExpiredToken.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let www_auth = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(www_auth.starts_with("Bearer"));

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body, serde_json::json!({"error": "token has expired"}));
    }

    #[tokio::test]
    async fn test_unsupported_scheme_message() {
        let response = GatewayError::UnsupportedScheme("basic".to_string()).into_response();
        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["error"], "unsupported authorization type basic");
    }

    #[tokio::test]
    async fn test_forbidden_has_no_www_authenticate() {
        let response = GatewayError::PermissionDenied("admin role required".to_string())
            .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["error"], "admin role required");
    }

    #[tokio::test]
    async fn test_downstream_detail_is_not_leaked() {
        let response =
            GatewayError::DownstreamUnavailable("connect 10.0.0.7:8081 refused".to_string())
                .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["error"], "downstream service is unavailable");
        assert!(!body.to_string().contains("10.0.0.7"));
    }

    #[tokio::test]
    async fn test_missing_identity_is_generic_500() {
        let response = GatewayError::MissingIdentity.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["error"], "an internal error occurred");
    }

    #[test]
    fn test_reason_labels_are_distinct() {
        let errors = [
            GatewayError::MalformedHeader(String::new()),
            GatewayError::UnsupportedScheme(String::new()),
            GatewayError::InvalidToken,
            GatewayError::ExpiredToken,
            GatewayError::MissingCookie,
            GatewayError::InvalidCredentials,
            GatewayError::PermissionDenied(String::new()),
            GatewayError::MissingIdentity,
            GatewayError::BadRequest(String::new()),
            GatewayError::NotFound(String::new()),
            GatewayError::Conflict(String::new()),
            GatewayError::DownstreamUnavailable(String::new()),
            GatewayError::Internal,
        ];
        let labels: std::collections::HashSet<_> = errors.iter().map(|e| e.reason()).collect();
        assert_eq!(labels.len(), errors.len());
    }
}
