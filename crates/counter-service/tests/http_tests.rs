//! HTTP surface integration tests.
//!
//! Greeting, routing fallbacks, CORS and the metrics endpoint.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use counter_service::services::room_directory::mock::InMemoryRoomDirectory;
use counter_test_utils::TestCounterServer;
use std::sync::Arc;

async fn spawn() -> Result<TestCounterServer, anyhow::Error> {
    TestCounterServer::spawn(Arc::new(InMemoryRoomDirectory::new())).await
}

#[tokio::test]
async fn test_homepage_returns_greeting() -> Result<(), anyhow::Error> {
    let server = spawn().await?;

    let response = reqwest::get(format!("{}/", server.url())).await?;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await?, "Hello, you've reached the homepage!");

    Ok(())
}

#[tokio::test]
async fn test_unknown_route_returns_404() -> Result<(), anyhow::Error> {
    let server = spawn().await?;

    let response = reqwest::get(format!("{}/rooms", server.url())).await?;
    assert_eq!(response.status(), 404);

    Ok(())
}

#[tokio::test]
async fn test_wrong_method_returns_405() -> Result<(), anyhow::Error> {
    let server = spawn().await?;

    let response = reqwest::get(format!("{}/create-room", server.url())).await?;
    assert_eq!(response.status(), 405);

    let response = reqwest::get(format!("{}/counter-increment", server.url())).await?;
    assert_eq!(response.status(), 405);

    Ok(())
}

#[tokio::test]
async fn test_cors_allows_any_origin() -> Result<(), anyhow::Error> {
    let server = spawn().await?;

    let response = reqwest::Client::new()
        .get(format!("{}/", server.url()))
        .header("origin", "http://app.example.com")
        .send()
        .await?;

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    Ok(())
}

#[tokio::test]
async fn test_cors_preflight_for_increment() -> Result<(), anyhow::Error> {
    let server = spawn().await?;

    let response = reqwest::Client::new()
        .request(
            reqwest::Method::OPTIONS,
            format!("{}/counter-increment", server.url()),
        )
        .header("origin", "http://app.example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .send()
        .await?;

    assert_eq!(response.status(), 200);

    let allow_methods = response
        .headers()
        .get("access-control-allow-methods")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(allow_methods.contains("POST"), "got {allow_methods}");

    assert!(response
        .headers()
        .contains_key("access-control-allow-headers"));

    Ok(())
}

#[tokio::test]
async fn test_metrics_endpoint_is_served() -> Result<(), anyhow::Error> {
    let server = spawn().await?;

    let response = reqwest::get(format!("{}/metrics", server.url())).await?;
    assert_eq!(response.status(), 200);

    Ok(())
}

#[tokio::test]
async fn test_create_room_returns_json() -> Result<(), anyhow::Error> {
    let server = spawn().await?;

    let response = reqwest::Client::new()
        .post(format!("{}/create-room", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.contains("application/json"));

    let body: serde_json::Value = response.json().await?;
    assert!(body["roomName"].is_string());
    assert!(body["token"].is_string());

    Ok(())
}
