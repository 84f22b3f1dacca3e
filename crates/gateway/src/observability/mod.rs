//! Observability for the delivery gateway.
//!
//! Provides metrics definitions and the Prometheus recorder setup.

pub mod metrics;
