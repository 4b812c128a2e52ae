//! End-to-end HTTP surface tests: ingest -> search -> suggest -> update ->
//! delete, driven straight through `server::build_router` with `tower`'s
//! `oneshot`, no socket involved.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use server::{build_router, ServerConfig, ServerState};
use tower::ServiceExt;

const API_KEY: &str = "test-key";
const TENANT: &str = "tenant-a";

fn test_config() -> ServerConfig {
    let mut cfg = ServerConfig::default();
    cfg.api_keys.insert(API_KEY.to_string());
    cfg.embedding.mode = "fast".to_string();
    cfg
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn authed_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_check_requires_no_auth() {
    let state = Arc::new(ServerState::new(test_config()).unwrap());
    let app = build_router(state);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_reject_missing_api_key() {
    let state = Arc::new(ServerState::new(test_config()).unwrap());
    let app = build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/search?query=invoice&tenant_id={TENANT}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ingest_snippet_then_search_finds_it() {
    let state = Arc::new(ServerState::new(test_config()).unwrap());
    let app = build_router(state);

    let ingest_body = json!({
        "text": "Acme Corp invoice number 48213 for $1,204.50 due 2026-08-01",
        "title": "acme-invoice-48213",
        "tenant_id": TENANT,
        "owner_id": "owner-1",
        "source": "user_input",
        "tags": ["finance"],
    });
    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            "/api/v1/ingest/snippet",
            ingest_body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let ingested = body_json(response).await;
    let artifact_id = ingested["artifact_id"].as_str().unwrap().to_string();
    assert!(!artifact_id.is_empty());

    let search_uri = format!(
        "/api/v1/search?query=acme+invoice&tenant_id={TENANT}&mode=keyword"
    );
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(search_uri)
                .header("x-api-key", API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let results = body_json(response).await;
    assert_eq!(results["query_analysis"]["clean_text"].is_string(), true);
    let hits = results["results"].as_array().unwrap();
    assert!(
        hits.iter()
            .any(|hit| hit["id"].as_str() == Some(artifact_id.as_str())),
        "expected ingested artifact in search results, got {results:?}"
    );

    let suggest_uri = format!("/api/v1/suggest?prefix=acme&tenant_id={TENANT}");
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(suggest_uri)
                .header("x-api-key", API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let suggestions = body_json(response).await;
    let suggestions = suggestions.as_array().unwrap();
    assert!(
        suggestions.iter().any(|s| s["text"]
            .as_str()
            .map(|t| t.contains("acme"))
            .unwrap_or(false)),
        "expected an acme-prefixed suggestion, got {suggestions:?}"
    );

    let update_uri = format!("/api/v1/artifacts/{artifact_id}");
    let update_body = json!({"tenant_id": TENANT, "name": "acme-invoice-renamed"});
    let response = app
        .clone()
        .oneshot(authed_request("PUT", &update_uri, update_body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let delete_uri = format!("/api/v1/artifacts/{artifact_id}?tenant_id={TENANT}");
    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(delete_uri)
                .header("x-api-key", API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
