//! # Gateway Test Utilities
//!
//! Shared test utilities for the delivery gateway.
//!
//! This crate provides:
//! - Server test harness (`TestGatewayServer` for E2E tests)
//! - Token fixtures signed with the harness key
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gateway_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestGatewayServer::spawn(mock_identity()).await?;
//!
//!     let response = reqwest::get(format!("{}/healthz", server.url())).await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod server_harness;
pub mod token_fixtures;

pub use server_harness::*;
pub use token_fixtures::*;
