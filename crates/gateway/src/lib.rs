//! Delivery Gateway Library
//!
//! The API-gateway front door of the delivery platform. It owns the token
//! plane of the system:
//!
//! - Issuing and verifying HS256 access/refresh tokens
//! - Bearer authentication for HTTP routes and gRPC methods
//! - Admin role gate
//! - Access token renewal from the refresh cookie, and logout
//!
//! Accounts live in the Identity Service; the gateway proxies user routes
//! to it.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/*.rs -> handlers/*.rs -> services/*.rs
//!                        |
//!                      auth/*.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - Claims, clock, token codec, bearer parsing
//! - `config` - Service configuration from environment
//! - `cookies` - Refresh token cookie
//! - `errors` - Error types with HTTP status code mapping
//! - `grpc` - Tower layer authenticating gRPC methods
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authentication, role and metrics middleware
//! - `models` - Request/response models
//! - `observability` - Metrics
//! - `routes` - Axum router setup
//! - `services` - Identity Service client

pub mod auth;
pub mod config;
pub mod cookies;
pub mod errors;
pub mod grpc;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
