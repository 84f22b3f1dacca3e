//! Test server harness for E2E testing
//!
//! Provides `TestGatewayServer` for spawning real gateway instances in tests.

use crate::token_fixtures::TEST_TOKEN_SYMMETRIC_KEY;
use delivery_gateway::auth::JwtTokenCodec;
use delivery_gateway::config::Config;
use delivery_gateway::routes::{self, AppState};
use delivery_gateway::services::IdentityService;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning the gateway in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_ping_e2e() -> Result<(), anyhow::Error> {
///     let server = TestGatewayServer::spawn(mock_identity()).await?;
///
///     let response = reqwest::get(format!("{}/ping", server.url())).await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestGatewayServer {
    addr: SocketAddr,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestGatewayServer {
    /// Spawn a gateway with default test configuration.
    pub async fn spawn(identity: Arc<dyn IdentityService>) -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(identity, HashMap::new()).await
    }

    /// Spawn a gateway with extra environment-style overrides.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Sign tokens with `TEST_TOKEN_SYMMETRIC_KEY` and the system clock
    /// - Start the HTTP server in the background
    pub async fn spawn_with_vars(
        identity: Arc<dyn IdentityService>,
        overrides: HashMap<String, String>,
    ) -> Result<Self, anyhow::Error> {
        let mut vars = HashMap::from([
            (
                "TOKEN_SYMMETRIC_KEY".to_string(),
                TEST_TOKEN_SYMMETRIC_KEY.to_string(),
            ),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
        ]);
        vars.extend(overrides);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let codec = Arc::new(JwtTokenCodec::new(&config.token_symmetric_key));
        let state = Arc::new(AppState::new(config.clone(), codec, identity));

        // Metrics recorder is process-global; the harness serves without /metrics.
        let app = routes::build_routes(state, None);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            _handle: handle,
        })
    }

    /// Get the server's base URL (e.g., "http://127.0.0.1:12345").
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the server's socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestGatewayServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
