//! gRPC support for the delivery gateway.
//!
//! The gateway does not host RPC services of its own; it provides the
//! authentication layer that tonic servers in front of the platform mount.

pub mod auth_layer;

pub use auth_layer::{GrpcAuthLayer, GrpcAuthService};
