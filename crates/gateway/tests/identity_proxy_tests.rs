//! Gateway-to-Identity-Service integration tests.
//!
//! Runs the gateway with the real HTTP client pointed at a wiremock
//! Identity Service.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use delivery_gateway::services::HttpIdentityClient;
use gateway_test_utils::*;
use reqwest::{header, Client};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn user_json(id: i64, email: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "email": email,
        "name": "Rider",
        "phone": "",
        "is_admin": false,
        "created_at": "2024-01-01T00:00:00Z"
    })
}

async fn spawn_against(identity: &MockServer) -> Result<TestGatewayServer, anyhow::Error> {
    let client = HttpIdentityClient::new(identity.uri())?;
    TestGatewayServer::spawn(Arc::new(client)).await
}

#[tokio::test]
async fn test_login_forwards_credentials() -> Result<(), anyhow::Error> {
    let identity = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .and(body_json(serde_json::json!({
            "email": RIDER_EMAIL,
            "password": RIDER_PASSWORD
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(RIDER_ID, RIDER_EMAIL)))
        .expect(1)
        .mount(&identity)
        .await;
    let server = spawn_against(&identity).await?;

    let response = Client::new()
        .post(format!("{}/v1/login", server.url()))
        .json(&serde_json::json!({"email": RIDER_EMAIL, "password": RIDER_PASSWORD}))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["user"]["email"], RIDER_EMAIL);

    Ok(())
}

#[tokio::test]
async fn test_rejected_credentials_are_401() -> Result<(), anyhow::Error> {
    let identity = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({"error": "bad password"})),
        )
        .mount(&identity)
        .await;
    let server = spawn_against(&identity).await?;

    let response = Client::new()
        .post(format!("{}/v1/login", server.url()))
        .json(&serde_json::json!({"email": RIDER_EMAIL, "password": "wrong-password"}))
        .send()
        .await?;

    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"], "invalid email or password");

    Ok(())
}

#[tokio::test]
async fn test_invalid_login_body_never_reaches_identity() -> Result<(), anyhow::Error> {
    let identity = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(RIDER_ID, RIDER_EMAIL)))
        .expect(0)
        .mount(&identity)
        .await;
    let server = spawn_against(&identity).await?;

    let response = Client::new()
        .post(format!("{}/v1/login", server.url()))
        .json(&serde_json::json!({"email": "not-an-email", "password": RIDER_PASSWORD}))
        .send()
        .await?;

    assert_eq!(response.status(), 400);

    Ok(())
}

#[tokio::test]
async fn test_identity_outage_is_500_without_details() -> Result<(), anyhow::Error> {
    let identity = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/users/{RIDER_ID}")))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream db at 10.1.2.3 down"))
        .mount(&identity)
        .await;
    let server = spawn_against(&identity).await?;
    let token = issue_token(RIDER_ID, RIDER_EMAIL, false, Duration::from_secs(60));

    let response = Client::new()
        .get(format!("{}/v1/users/my_profile", server.url()))
        .header(header::AUTHORIZATION, bearer(&token.token))
        .send()
        .await?;

    assert_eq!(response.status(), 500);
    let text = response.text().await?;
    assert!(text.contains("downstream service is unavailable"));
    assert!(!text.contains("10.1.2.3"));

    Ok(())
}

#[tokio::test]
async fn test_profile_update_uses_token_subject() -> Result<(), anyhow::Error> {
    let identity = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("/users/{RIDER_ID}")))
        .and(body_json(serde_json::json!({"name": "Renamed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(RIDER_ID, RIDER_EMAIL)))
        .expect(1)
        .mount(&identity)
        .await;
    let server = spawn_against(&identity).await?;
    let token = issue_token(RIDER_ID, RIDER_EMAIL, false, Duration::from_secs(60));

    let response = Client::new()
        .patch(format!("{}/v1/users/my_profile", server.url()))
        .header(header::AUTHORIZATION, bearer(&token.token))
        .json(&serde_json::json!({"name": "Renamed"}))
        .send()
        .await?;

    assert_eq!(response.status(), 200);

    Ok(())
}

#[tokio::test]
async fn test_delete_account_uses_token_subject() -> Result<(), anyhow::Error> {
    let identity = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("/users/{RIDER_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json("user deleted"))
        .expect(1)
        .mount(&identity)
        .await;
    let server = spawn_against(&identity).await?;
    let token = issue_token(RIDER_ID, RIDER_EMAIL, false, Duration::from_secs(60));

    let response = Client::new()
        .delete(format!("{}/v1/users/my_profile", server.url()))
        .header(header::AUTHORIZATION, bearer(&token.token))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    assert!(response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|c| c.starts_with("refresh_token=;")));
    assert_eq!(response.json::<String>().await?, "user deleted");

    Ok(())
}
