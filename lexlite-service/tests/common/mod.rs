//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use lexlite_service::config::{
    DocumentConfig, LexliteConfig, LlmConfig, ProviderKind, QuotaConfig, SessionConfig,
};
use lexlite_service::models::ReuploadPolicy;
use lexlite_service::services::providers::mock::MockTextProvider;
use lexlite_service::startup::{build_router, AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

#[path = "../../src/services/test_pdf.rs"]
mod test_pdf;

pub use test_pdf::pdf_with_pages;

pub const UPGRADE_URL: &str = "https://example.com/upgrade";
pub const BOUNDARY: &str = "lexlite-test-boundary";

pub fn test_config() -> LexliteConfig {
    LexliteConfig {
        common: service_core::config::Config { port: 0 },
        quota: QuotaConfig {
            free_actions: 3,
            upgrade_url: UPGRADE_URL.to_string(),
        },
        documents: DocumentConfig {
            max_chars: 25_000,
            max_upload_bytes: 1024 * 1024,
            reupload_policy: ReuploadPolicy::Ignore,
        },
        sessions: SessionConfig {
            idle_timeout_secs: 3600,
        },
        llm: LlmConfig {
            provider: ProviderKind::Mock,
            api_key: None,
            base_url: "http://localhost:9".to_string(),
            model: "mock-model".to_string(),
            summary_temperature: 0.2,
            answer_temperature: 0.1,
            timeout_secs: 5,
            max_retries: 0,
        },
    }
}

/// State and router sharing one session store.
pub fn test_app_with(
    config: LexliteConfig,
    provider: Arc<MockTextProvider>,
) -> (AppState, Router) {
    let state = AppState::new(config, provider);
    let router = build_router(state.clone());
    (state, router)
}

pub fn test_app(provider: Arc<MockTextProvider>) -> Router {
    test_app_with(test_config(), provider).1
}

/// A `multipart/form-data` body with a single file field.
pub fn multipart_body(field: &str, file_name: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(session_id: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(format!("/sessions/{}/document", session_id))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body("file", "contract.pdf", data)))
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Send a request through the router and decode the JSON body, if any.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

/// Create a session and return its id.
pub async fn create_session(app: &Router) -> String {
    let (status, body) = send(app, empty_request(Method::POST, "/sessions")).await;
    assert_eq!(status, StatusCode::CREATED);
    body["session_id"].as_str().unwrap().to_string()
}

/// Create a session with the two-page "Hello" / "World" document loaded.
pub async fn loaded_session(app: &Router) -> String {
    let id = create_session(app).await;
    let (status, _) = send(app, upload_request(&id, &pdf_with_pages(&["Hello", "World"]))).await;
    assert_eq!(status, StatusCode::CREATED);
    id
}
