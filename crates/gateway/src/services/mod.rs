//! Downstream service clients.
//!
//! - `identity_client` - Identity Service (accounts and credentials)

pub mod identity_client;

pub use identity_client::{mock::MockIdentityService, HttpIdentityClient, IdentityService};
