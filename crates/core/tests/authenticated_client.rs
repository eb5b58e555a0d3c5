//! Integration tests for `AuthenticatedClient`
//!
//! Covers the single refresh-and-retry cycle and refresh serialization across
//! concurrent requests.

mod support;

use std::sync::Arc;
use std::time::Duration;

use loopauth_core::AuthenticatedClient;
use loopauth_domain::{AuthError, HttpMethod, RequestOptions, TokenSet};
use support::mocks::{MemoryTokenStore, ScriptedTokenEndpoint, ScriptedTransport};
use support::tokens;

const API: &str = "https://api.example.com/v1/things";

struct Harness {
    store: Arc<MemoryTokenStore>,
    endpoint: Arc<ScriptedTokenEndpoint>,
    transport: Arc<ScriptedTransport>,
    client: AuthenticatedClient,
}

fn harness(
    initial: TokenSet,
    endpoint: ScriptedTokenEndpoint,
    transport: ScriptedTransport,
) -> Harness {
    let store = Arc::new(MemoryTokenStore::with_tokens(initial.clone()));
    let endpoint = Arc::new(endpoint);
    let transport = Arc::new(transport);
    let client =
        AuthenticatedClient::new(initial, transport.clone(), endpoint.clone(), store.clone());
    Harness { store, endpoint, transport, client }
}

#[tokio::test]
async fn successful_response_is_returned_without_refresh() {
    let h = harness(
        tokens("A1", "R1"),
        ScriptedTokenEndpoint::refresh_only(),
        ScriptedTransport::new().respond("Bearer A1", 200),
    );

    let response = h.client.request(HttpMethod::Get, API, RequestOptions::default()).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(h.transport.authorizations(), vec!["Bearer A1"]);
    assert!(h.endpoint.refreshes().is_empty());
    assert_eq!(h.store.save_count(), 0);
}

#[tokio::test]
async fn unauthorized_then_refresh_then_success_saves_once() {
    let renewed = tokens("A2", "R2");
    let h = harness(
        tokens("A1", "R1"),
        ScriptedTokenEndpoint::refresh_only().then_refresh(Ok(renewed.clone())),
        ScriptedTransport::new().respond("Bearer A1", 401).respond("Bearer A2", 200),
    );

    let response = h.client.request(HttpMethod::Get, API, RequestOptions::default()).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(h.transport.authorizations(), vec!["Bearer A1", "Bearer A2"]);
    assert_eq!(h.endpoint.refreshes(), vec!["R1".to_string()]);
    assert_eq!(h.store.save_count(), 1);
    assert_eq!(h.store.stored(), Some(renewed.clone()));
    assert_eq!(h.client.tokens().await, renewed);
}

#[tokio::test]
async fn second_unauthorized_is_returned_without_another_refresh() {
    let h = harness(
        tokens("A1", "R1"),
        ScriptedTokenEndpoint::refresh_only()
            .then_refresh(Ok(tokens("A2", "R2")))
            .then_refresh(Ok(tokens("A3", "R3"))),
        ScriptedTransport::new().respond("Bearer A1", 401).respond("Bearer A2", 401),
    );

    let response = h.client.request(HttpMethod::Get, API, RequestOptions::default()).await.unwrap();

    assert_eq!(response.status, 401);
    assert_eq!(h.transport.requests().len(), 2);
    assert_eq!(h.endpoint.refreshes().len(), 1);
    assert_eq!(h.store.save_count(), 1);
}

#[tokio::test]
async fn missing_refresh_token_propagates_without_retry() {
    let h = harness(
        TokenSet::new("A1", None),
        ScriptedTokenEndpoint::refresh_only(),
        ScriptedTransport::new().respond("Bearer A1", 401),
    );

    let err = h.client.request(HttpMethod::Get, API, RequestOptions::default()).await.unwrap_err();

    assert_eq!(err, AuthError::NoRefreshToken);
    assert_eq!(h.transport.requests().len(), 1);
    assert_eq!(h.store.save_count(), 0);
}

#[tokio::test]
async fn refresh_rejection_keeps_current_tokens() {
    let h = harness(
        tokens("A1", "R1"),
        ScriptedTokenEndpoint::refresh_only().then_refresh(Err(AuthError::TokenExchange {
            endpoint: "https://p/token".to_string(),
            status: 400,
            body: r#"{"error":"invalid_grant"}"#.to_string(),
        })),
        ScriptedTransport::new().respond("Bearer A1", 401),
    );

    let err = h.client.request(HttpMethod::Get, API, RequestOptions::default()).await.unwrap_err();

    assert!(matches!(err, AuthError::TokenExchange { status: 400, .. }));
    assert_eq!(h.transport.requests().len(), 1);
    assert_eq!(h.client.tokens().await, tokens("A1", "R1"));
    assert_eq!(h.store.stored(), Some(tokens("A1", "R1")));
}

#[tokio::test]
async fn failed_save_after_refresh_propagates_without_retry() {
    let store = Arc::new(MemoryTokenStore::with_tokens(tokens("A1", "R1")).failing_saves());
    let endpoint =
        Arc::new(ScriptedTokenEndpoint::refresh_only().then_refresh(Ok(tokens("A2", "R2"))));
    let transport =
        Arc::new(ScriptedTransport::new().respond("Bearer A1", 401).respond("Bearer A2", 200));
    let client = AuthenticatedClient::new(
        tokens("A1", "R1"),
        transport.clone(),
        endpoint.clone(),
        store.clone(),
    );

    let err = client.request(HttpMethod::Get, API, RequestOptions::default()).await.unwrap_err();

    assert!(matches!(err, AuthError::Storage(_)));
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(endpoint.refreshes(), vec!["R1".to_string()]);
    assert_eq!(store.save_count(), 1);
    assert_eq!(store.stored(), Some(tokens("A1", "R1")));
    assert_eq!(client.tokens().await, tokens("A2", "R2"));
}

#[tokio::test]
async fn other_client_errors_do_not_trigger_refresh() {
    let h = harness(
        tokens("A1", "R1"),
        ScriptedTokenEndpoint::refresh_only(),
        ScriptedTransport::new().respond("Bearer A1", 403),
    );

    let response =
        h.client.request(HttpMethod::Delete, API, RequestOptions::default()).await.unwrap();

    assert_eq!(response.status, 403);
    assert!(h.endpoint.refreshes().is_empty());
}

#[tokio::test]
async fn caller_headers_survive_and_authorization_is_replaced() {
    let h = harness(
        tokens("A1", "R1"),
        ScriptedTokenEndpoint::refresh_only(),
        ScriptedTransport::new(),
    );
    let options = RequestOptions::default()
        .header("Authorization", "Basic stale")
        .header("X-Request-Id", "42")
        .query("page", "2");

    h.client.request(HttpMethod::Post, API, options).await.unwrap();

    let sent = &h.transport.requests()[0];
    assert_eq!(sent.method, HttpMethod::Post);
    assert_eq!(sent.header("authorization"), Some("Bearer A1"));
    assert_eq!(sent.header("x-request-id"), Some("42"));
    assert_eq!(sent.query, vec![("page".to_string(), "2".to_string())]);
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
    let h = harness(
        tokens("A1", "R1"),
        ScriptedTokenEndpoint::refresh_only()
            .then_refresh(Ok(tokens("A2", "R2")))
            .then_refresh(Ok(tokens("A3", "R3")))
            .with_refresh_delay(Duration::from_millis(20)),
        ScriptedTransport::new()
            .respond("Bearer A1", 401)
            .respond("Bearer A2", 200)
            .with_delay(Duration::from_millis(20)),
    );

    let (first, second) = tokio::join!(
        h.client.request(HttpMethod::Get, API, RequestOptions::default()),
        h.client.request(HttpMethod::Get, API, RequestOptions::default()),
    );

    assert_eq!(first.unwrap().status, 200);
    assert_eq!(second.unwrap().status, 200);
    assert_eq!(h.endpoint.refreshes(), vec!["R1".to_string()]);
    assert_eq!(h.store.save_count(), 1);
    assert_eq!(h.client.tokens().await.access_token, "A2");
}

#[tokio::test]
async fn explicit_refresh_updates_tokens_and_store() {
    let h = harness(
        tokens("A1", "R1"),
        ScriptedTokenEndpoint::refresh_only().then_refresh(Ok(tokens("A2", "R1"))),
        ScriptedTransport::new(),
    );

    let renewed = h.client.refresh().await.unwrap();

    assert_eq!(renewed.access_token, "A2");
    assert_eq!(h.store.stored(), Some(renewed));
    assert!(h.transport.requests().is_empty());
}
