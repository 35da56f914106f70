//! Admission chain over real HTTP: whitelist bypass, bearer auth, rate limit.

use pxe_sdk::SdkError;
use reqwest::StatusCode;
use serde_json::Value;

mod common;
use common::{TestServer, TOKEN};

#[tokio::test]
async fn test_missing_and_invalid_credentials_are_distinct() {
    let server = TestServer::start(|_| {}).await;
    let http = server.http();

    let missing = http.get(format!("{}/api/health", server.url())).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    let missing: Value = missing.json().await.unwrap();

    let invalid = http
        .get(format!("{}/api/health", server.url()))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);
    let invalid: Value = invalid.json().await.unwrap();

    assert_eq!(missing["error"], "missing bearer credential");
    assert_eq!(invalid["error"], "invalid bearer credential");
    assert!(!invalid.to_string().contains(TOKEN));
}

#[tokio::test]
async fn test_valid_token_is_admitted() {
    let server = TestServer::start(|_| {}).await;
    let health = server.client().health().await.unwrap();
    assert_eq!(health["status"], "ok");
}

#[tokio::test]
async fn test_rate_limit_reports_limit_and_window() {
    let server = TestServer::start(|c| c.auth.requests_per_minute = 3).await;
    let client = server.client();

    for _ in 0..3 {
        client.health().await.unwrap();
    }

    let limited = client.get_raw("/api/health").await.unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.headers()["x-ratelimit-limit"], "3");
    assert_eq!(limited.headers()["x-ratelimit-window"], "60");
    assert_eq!(limited.headers()["retry-after"], "20");
    let body: Value = limited.json().await.unwrap();
    assert_eq!(body["limit"], 3);
}

#[tokio::test]
async fn test_auth_failures_do_not_spend_rate_budget() {
    let server = TestServer::start(|c| c.auth.requests_per_minute = 2).await;
    let anonymous = server.anonymous();

    for _ in 0..5 {
        let err = anonymous.health().await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    }

    let client = server.client();
    client.health().await.unwrap();
    client.health().await.unwrap();
}

#[tokio::test]
async fn test_whitelisted_client_bypasses_auth_and_rate_limit() {
    let server = TestServer::start(|c| {
        c.auth.whitelist = vec!["192.168.88.0/24".into()];
        c.auth.requests_per_minute = 1;
    })
    .await;
    let http = server.http();

    // 127.0.0.1 is a trusted proxy, so the forwarded address is the client.
    for _ in 0..5 {
        let res = http
            .get(format!("{}/api/health", server.url()))
            .header("x-forwarded-for", "192.168.88.20")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let outside = http
        .get(format!("{}/api/health", server.url()))
        .header("x-forwarded-for", "203.0.113.9")
        .send()
        .await
        .unwrap();
    assert_eq!(outside.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rate_limit_is_per_client_address() {
    let server = TestServer::start(|c| c.auth.requests_per_minute = 1).await;
    let http = server.http();

    let call = |ip: &'static str| {
        http.get(format!("{}/api/health", server.url()))
            .bearer_auth(TOKEN)
            .header("x-forwarded-for", ip)
            .send()
    };

    assert_eq!(call("203.0.113.1").await.unwrap().status(), StatusCode::OK);
    assert_eq!(call("203.0.113.1").await.unwrap().status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(call("203.0.113.2").await.unwrap().status(), StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let server = TestServer::start(|_| {}).await;
    let res = server.client().get_raw("/api/health").await.unwrap();
    let id = res.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert_eq!(id.len(), 36);

    let err = server.anonymous().health().await.unwrap_err();
    assert!(matches!(err, SdkError::Api { .. }));
}
