//! Middleware for the delivery gateway.
//!
//! # Components
//!
//! - `auth` - Bearer token authentication for protected routes
//! - `roles` - Admin role gate, stacked after `auth`
//! - `http_metrics` - HTTP request metrics

pub mod auth;
pub mod http_metrics;
pub mod roles;

pub use auth::{require_auth, AuthState, Identity};
pub use http_metrics::http_metrics_middleware;
pub use roles::require_admin;
