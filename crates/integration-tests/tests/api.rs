//! Router tests for paths served without the database.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use mayombe_integration_tests::test_app;
use tower::ServiceExt;

async fn send(method: Method, uri: &str, body: Body) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", "41.202.219.10")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap();
    test_app().oneshot(request).await.unwrap()
}

async fn get(uri: &str) -> Response {
    send(Method::GET, uri, Body::empty()).await
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Health and middleware
// =============================================================================

#[tokio::test]
async fn test_health_is_ok_with_security_headers() {
    let response = get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_upstream_request_id_is_echoed() {
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "brazza-42")
        .body(Body::empty())
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "brazza-42");
}

// =============================================================================
// Authentication guard
// =============================================================================

#[tokio::test]
async fn test_protected_routes_require_a_session() {
    for (method, uri) in [
        (Method::GET, "/api/auth/me"),
        (Method::GET, "/api/cart"),
        (Method::GET, "/api/orders"),
        (Method::GET, "/api/negotiations"),
        (Method::GET, "/api/payouts"),
        (Method::POST, "/api/orders/1/confirm"),
    ] {
        let response = send(method.clone(), uri, Body::empty()).await;
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{method} {uri}"
        );
        let body = json_body(response).await;
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_logout_without_session_succeeds() {
    let response = send(Method::POST, "/api/auth/logout", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_malformed_json_is_rejected_before_any_lookup() {
    let response = send(
        Method::POST,
        "/api/auth/login",
        Body::from(r#"{"email": "awa@mayombe.cg""#),
    )
    .await;
    assert!(response.status().is_client_error());
}

// =============================================================================
// Content pages
// =============================================================================

#[tokio::test]
async fn test_page_is_served_with_public_cache() {
    let response = get("/api/pages/livraison").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=300"
    );
    let body = json_body(response).await;
    assert_eq!(body["slug"], "livraison");
    assert!(body["html"].as_str().unwrap().contains('<'));
}

#[tokio::test]
async fn test_unknown_page_is_json_404() {
    let response = get("/api/pages/inconnue").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "no-store, max-age=0"
    );
    let body = json_body(response).await;
    assert_eq!(body["error"], "Page not found");
}
