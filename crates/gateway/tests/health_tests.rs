//! Health endpoint integration tests.
//!
//! Tests `/healthz` and `/ping` using the `TestGatewayServer` harness.

use gateway_test_utils::{mock_identity, TestGatewayServer};

#[tokio::test]
async fn test_healthz_returns_ok() -> Result<(), anyhow::Error> {
    let server = TestGatewayServer::spawn(mock_identity()).await?;

    let response = reqwest::get(format!("{}/healthz", server.url())).await?;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await?, "OK");

    Ok(())
}

#[tokio::test]
async fn test_ping_returns_pong() -> Result<(), anyhow::Error> {
    let server = TestGatewayServer::spawn(mock_identity()).await?;

    let response = reqwest::get(format!("{}/ping", server.url())).await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body, serde_json::json!({"message": "pong"}));

    Ok(())
}

#[tokio::test]
async fn test_unknown_route_returns_404() -> Result<(), anyhow::Error> {
    let server = TestGatewayServer::spawn(mock_identity()).await?;

    let response = reqwest::get(format!("{}/v1/orders", server.url())).await?;

    assert_eq!(response.status(), 404);

    Ok(())
}
