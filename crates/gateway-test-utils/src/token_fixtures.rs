//! Token fixtures signed with the harness key.

use delivery_gateway::auth::{IssuedToken, JwtTokenCodec, TokenCodec};
use delivery_gateway::services::MockIdentityService;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;

/// Signing key every `TestGatewayServer` is configured with.
pub const TEST_TOKEN_SYMMETRIC_KEY: &str = "test-gateway-symmetric-key-0123456789abcdef";

/// Rider account present in `mock_identity()`.
pub const RIDER_ID: i64 = 100;
pub const RIDER_EMAIL: &str = "rider@example.com";
pub const RIDER_PASSWORD: &str = "rider-secret";

/// Admin account present in `mock_identity()`.
pub const ADMIN_ID: i64 = 1;
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-secret";

/// Codec using the harness key and the system clock.
pub fn test_codec() -> JwtTokenCodec {
    JwtTokenCodec::new(&SecretString::from(TEST_TOKEN_SYMMETRIC_KEY))
}

/// Codec using an unrelated key, for wrong-secret tests.
pub fn foreign_codec() -> JwtTokenCodec {
    JwtTokenCodec::new(&SecretString::from(
        "some-other-deployment-key-0123456789abcdef",
    ))
}

/// Issue a token for `subject` with the harness key.
pub fn issue_token(subject: i64, email: &str, is_admin: bool, ttl: Duration) -> IssuedToken {
    test_codec()
        .issue(&subject.to_string(), email, is_admin, ttl)
        .expect("test token issuance should succeed")
}

/// `Authorization` header value for `token`.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Identity Service mock with a rider and an admin account.
pub fn mock_identity() -> Arc<MockIdentityService> {
    Arc::new(
        MockIdentityService::new()
            .with_user(ADMIN_ID, ADMIN_EMAIL, ADMIN_PASSWORD, true)
            .with_user(RIDER_ID, RIDER_EMAIL, RIDER_PASSWORD, false),
    )
}
