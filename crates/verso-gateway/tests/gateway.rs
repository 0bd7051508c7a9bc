//! End-to-end tests for the versioning middleware and versioned endpoints.

use std::io::Write;

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use verso_gateway::{build_registry, create_router, AppState, GatewayConfig};

fn api_version() -> HeaderName {
    HeaderName::from_static("api-version")
}

fn server_with(config: GatewayConfig) -> TestServer {
    let registry = build_registry(&config).unwrap();
    let state = AppState::new(registry, config).unwrap();
    TestServer::new(create_router(state).unwrap()).unwrap()
}

fn server() -> TestServer {
    server_with(GatewayConfig::default())
}

fn keys(value: &Value) -> Vec<String> {
    value.as_object().unwrap().keys().cloned().collect()
}

#[tokio::test]
async fn current_version_by_default() {
    let server = server();
    let response = server
        .post("/keys/validate")
        .json(&json!({"meta": {"key": "abc", "scope": {"fingerprint": "f1"}}}))
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("api-version"), "1.2");
    assert_eq!(
        response.json::<Value>(),
        json!({"meta": {
            "code": "VALID",
            "detail": "is valid",
            "valid": true,
            "scope": {"fingerprint": "f1"}
        }})
    );
}

#[tokio::test]
async fn old_client_gets_old_shape() {
    let server = server();
    let response = server
        .post("/keys/validate")
        .add_header(api_version(), HeaderValue::from_static("1.1"))
        .json(&json!({"meta": {"key": "abc", "fingerprint": "f1"}}))
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("api-version"), "1.1");
    let body = response.json::<Value>();
    assert_eq!(body["meta"]["code"], json!("VALID"));
    assert_eq!(body["meta"]["fingerprint"], json!("f1"));
    assert!(body["meta"].get("scope").is_none());
}

#[tokio::test]
async fn oldest_client_uses_legacy_variant() {
    let server = server();
    let response = server
        .post("/keys/validate")
        .add_header(api_version(), HeaderValue::from_static("1.0"))
        .json(&json!({"meta": {}}))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(
        body,
        json!({"meta": {"constant": "NOT_FOUND", "detail": "does not exist", "valid": false}})
    );
    assert_eq!(keys(&body["meta"]), vec!["constant", "detail", "valid"]);
}

#[tokio::test]
async fn newer_client_uses_current_variant() {
    let server = server();
    let response = server
        .post("/keys/validate")
        .add_header(api_version(), HeaderValue::from_static("1.1"))
        .json(&json!({"meta": {}}))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["meta"]["code"], json!("KEY_REQUIRED"));
}

#[tokio::test]
async fn unsupported_version_rejected() {
    let server = server();
    let response = server
        .post("/keys/validate")
        .add_header(api_version(), HeaderValue::from_static("9.9"))
        .json(&json!({"meta": {"key": "abc"}}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["error"], json!(true));
    assert_eq!(body["code"], json!("UNSUPPORTED_VERSION"));
}

#[tokio::test]
async fn malformed_version_rejected() {
    let server = server();
    let response = server
        .get("/versions")
        .add_header(api_version(), HeaderValue::from_static("latest"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], json!("UNSUPPORTED_VERSION"));
}

#[tokio::test]
async fn versions_endpoint() {
    let server = server();
    let response = server
        .get("/versions")
        .add_header(api_version(), HeaderValue::from_static("1.0"))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({"current": "1.2", "supported": ["1.0", "1.1", "1.2"], "resolved": "1.0"})
    );
}

#[tokio::test]
async fn health_endpoint() {
    let server = server();
    let response = server.get("/health").await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["api_version"], json!("1.2"));
}

#[tokio::test]
async fn invalid_json_reaches_handler() {
    let server = server();
    let response = server
        .post("/keys/validate")
        .add_header(api_version(), HeaderValue::from_static("1.0"))
        .content_type("application/json")
        .bytes("{not json".into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], json!("BAD_REQUEST"));
}

#[tokio::test]
async fn non_json_body_refused() {
    let server = server();
    let response = server
        .post("/keys/validate")
        .add_header(api_version(), HeaderValue::from_static("1.1"))
        .content_type("text/plain")
        .bytes(r#"{"meta":{"key":"abc","fingerprint":"f1"}}"#.into())
        .await;

    response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(response.json::<Value>()["code"], json!("UNSUPPORTED_MEDIA_TYPE"));
}

#[tokio::test]
async fn oversized_bodies() {
    let server = server_with(GatewayConfig::default().with_max_body_bytes(10));

    let response = server
        .post("/keys/validate")
        .add_header(api_version(), HeaderValue::from_static("1.1"))
        .json(&json!({"meta": {"key": "abcdefghijklmnop"}}))
        .await;
    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);

    // The response to an old client is too large to migrate.
    let response = server
        .get("/versions")
        .add_header(api_version(), HeaderValue::from_static("1.0"))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["code"], json!("INTERNAL_ERROR"));
}

#[tokio::test]
async fn host_versioning() {
    let server = server_with(GatewayConfig::default().with_host_versioning(true));
    let response = server
        .post("/keys/validate")
        .add_header(header::HOST, HeaderValue::from_static("v1-0.api.example.com"))
        .json(&json!({"meta": {"key": "abc"}}))
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("api-version"), "1.0");
    assert_eq!(response.json::<Value>()["meta"]["constant"], json!("VALID"));
}

#[tokio::test]
async fn custom_header_and_manifest() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"versions": [
            {{"version": "1.0"}},
            {{"version": "1.2", "steps": [
                {{"name": "code", "kind": "rename_key", "from": "meta.constant", "to": "meta.code"}}
            ]}}
        ]}}"#
    )
    .unwrap();

    let config = GatewayConfig::default()
        .with_version_header("X-Api-Version")
        .with_manifest(file.path());
    let server = server_with(config);

    let response = server
        .post("/keys/validate")
        .add_header(
            HeaderName::from_static("x-api-version"),
            HeaderValue::from_static("1.0"),
        )
        .json(&json!({"meta": {"key": "abc"}}))
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("x-api-version"), "1.0");
    assert_eq!(response.json::<Value>()["meta"]["constant"], json!("VALID"));
}

#[test]
fn router_requires_variant_coverage() {
    // Every endpoint declares a catch-all, so any registry is covered.
    let config = GatewayConfig::default().with_current_version("1.2");
    let registry = build_registry(&config).unwrap();
    let state = AppState::new(registry, config).unwrap();
    assert!(create_router(state).is_ok());
}
