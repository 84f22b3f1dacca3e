//! Metrics definitions for the delivery gateway.
//!
//! All metrics follow Prometheus naming conventions:
//! - `gateway_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: HTTP verbs
//! - `endpoint`: the routed paths, everything else is `/other`
//! - `transport`: `http` or `grpc`
//! - `reason`: `GatewayError::reason()` labels
//! - `kind`: `access` or `refresh`
//! - `operation`: identity client operations

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus recorder and return the handle used by
/// `GET /metrics`.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("gateway_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("gateway_identity_request".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.000, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set identity request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `gateway_http_requests_total`, `gateway_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("gateway_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("gateway_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Map a request path onto its route template.
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/healthz" => "/healthz",
        "/ping" => "/ping",
        "/metrics" => "/metrics",
        "/renew_token" => "/renew_token",
        "/logout" => "/logout",
        "/v1/users" => "/v1/users",
        "/v1/login" => "/v1/login",
        "/v1/renew_token" => "/v1/renew_token",
        "/v1/logout" => "/v1/logout",
        "/v1/users/my_profile" => "/v1/users/my_profile",
        "/v1/users/my_profile/phone_number" => "/v1/users/my_profile/phone_number",
        _ => match path.strip_prefix("/v1/admin/users/") {
            Some(id) if !id.is_empty() && !id.contains('/') => "/v1/admin/users/{id}",
            _ => "/other",
        },
    }
}

// ============================================================================
// Auth Metrics
// ============================================================================

/// Record a rejected request at one of the gates.
///
/// Metric: `gateway_auth_failures_total`
/// Labels: `transport` (http, grpc), `reason`
pub fn record_auth_failure(transport: &'static str, reason: &'static str) {
    counter!("gateway_auth_failures_total",
        "transport" => transport,
        "reason" => reason
    )
    .increment(1);
}

/// Record an issued token.
///
/// Metric: `gateway_tokens_issued_total`
/// Labels: `kind` (access, refresh)
pub fn record_token_issued(kind: &'static str) {
    counter!("gateway_tokens_issued_total", "kind" => kind).increment(1);
}

// ============================================================================
// Identity Service Metrics
// ============================================================================

/// Record an Identity Service call.
///
/// Metric: `gateway_identity_request_duration_seconds`, `gateway_identity_requests_total`
/// Labels: `operation`, `status` (success, error)
pub fn record_identity_request(operation: &'static str, status: &'static str, duration: Duration) {
    histogram!("gateway_identity_request_duration_seconds",
        "operation" => operation,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("gateway_identity_requests_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Recording without an installed recorder goes to the global no-op
    // recorder; these only exercise the label paths.

    #[test]
    fn test_record_functions_do_not_panic() {
        record_http_request("GET", "/healthz", 200, Duration::from_millis(2));
        record_http_request("POST", "/v1/renew_token", 401, Duration::from_millis(3));
        record_auth_failure("http", "expired_token");
        record_auth_failure("grpc", "invalid_token");
        record_token_issued("access");
        record_token_issued("refresh");
        record_identity_request("get_user", "success", Duration::from_millis(20));
    }

    #[test]
    fn test_categorize_status_code() {
        assert_eq!(categorize_status_code(200), "success");
        assert_eq!(categorize_status_code(204), "success");
        assert_eq!(categorize_status_code(401), "error");
        assert_eq!(categorize_status_code(500), "error");
        assert_eq!(categorize_status_code(408), "timeout");
        assert_eq!(categorize_status_code(504), "timeout");
    }

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(normalize_endpoint("/v1/login"), "/v1/login");
        assert_eq!(normalize_endpoint("/renew_token"), "/renew_token");
        assert_eq!(normalize_endpoint("/logout"), "/logout");
        assert_eq!(normalize_endpoint("/v1/users/my_profile"), "/v1/users/my_profile");
        assert_eq!(normalize_endpoint("/v1/admin/users/42"), "/v1/admin/users/{id}");
        assert_eq!(normalize_endpoint("/v1/admin/users/"), "/other");
        assert_eq!(normalize_endpoint("/v1/admin/users/42/orders"), "/other");
        assert_eq!(normalize_endpoint("/wp-admin"), "/other");
    }
}
