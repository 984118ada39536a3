//! End-to-end flows through the HTTP router with a scripted mock provider.

mod common;

use axum::http::{Method, StatusCode};
use common::*;
use lexlite_service::models::ReuploadPolicy;
use lexlite_service::services::providers::mock::MockTextProvider;
use lexlite_service::services::providers::ProviderError;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn summaries(n: usize) -> Vec<Result<String, ProviderError>> {
    (1..=n).map(|i| Ok(format!("summary-{}", i))).collect()
}

#[tokio::test]
async fn free_quota_then_upgrade_prompt() {
    let provider = Arc::new(MockTextProvider::scripted(summaries(3)));
    let app = test_app(provider.clone());

    let (status, session) = send(&app, empty_request(Method::POST, "/sessions")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["has_document"], false);
    assert_eq!(session["usage"]["remaining"], 3);
    assert!(session["usage"].get("upgrade_url").is_none());
    let id = session["session_id"].as_str().unwrap().to_string();

    let (status, upload) =
        send(&app, upload_request(&id, &pdf_with_pages(&["Hello", "World"]))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(upload["status"], "loaded");
    assert_eq!(upload["document"]["page_count"], 2);
    assert_eq!(upload["document"]["char_count"], 11);
    assert_eq!(upload["document"]["file_name"], "contract.pdf");

    let summary_uri = format!("/sessions/{}/summary", id);
    for i in 1..=3u64 {
        let (status, body) = send(&app, empty_request(Method::POST, &summary_uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "content");
        assert_eq!(body["content"], format!("summary-{}", i));
        assert_eq!(body["usage"]["used"], i);
        assert_eq!(body["usage"]["remaining"], 3 - i);
    }

    let (status, body) = send(&app, empty_request(Method::POST, &summary_uri)).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["status"], "quota_exceeded");
    assert_eq!(body["remaining"], 0);
    assert_eq!(body["upgrade_url"], UPGRADE_URL);
    assert_eq!(body["usage"]["upgrade_url"], UPGRADE_URL);

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            &format!("/sessions/{}/answer", id),
            json!({ "question": "What is the term?" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);

    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn answer_uses_question_and_document() {
    let provider = Arc::new(MockTextProvider::scripted(vec![Ok(
        "Not stated in the document.".to_string(),
    )]));
    let app = test_app(provider.clone());
    let id = loaded_session(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            &format!("/sessions/{}/answer", id),
            json!({ "question": "Who pays for shipping?" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "Not stated in the document.");

    let prompt = &provider.prompts()[0];
    assert!(prompt.contains("Hello\nWorld"));
    assert!(prompt.contains("Question: Who pays for shipping?"));
    assert_eq!(provider.params()[0].temperature, Some(0.1));
}

#[tokio::test]
async fn empty_question_is_rejected_and_not_charged() {
    let provider = Arc::new(MockTextProvider::new(true));
    let app = test_app(provider.clone());
    let id = loaded_session(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            &format!("/sessions/{}/answer", id),
            json!({ "question": "   " }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("question"));

    let (_, session) = send(&app, empty_request(Method::GET, &format!("/sessions/{}", id))).await;
    assert_eq!(session["usage"]["used"], 0);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn overlong_question_fails_validation() {
    let app = test_app(Arc::new(MockTextProvider::new(true)));
    let id = loaded_session(&app).await;

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            &format!("/sessions/{}/answer", id),
            json!({ "question": "x".repeat(2001) }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn provider_failure_is_bad_gateway_and_not_charged() {
    let provider = Arc::new(MockTextProvider::scripted(vec![
        Ok("summary-1".to_string()),
        Err(ProviderError::Unauthorized),
    ]));
    let app = test_app(provider.clone());
    let id = loaded_session(&app).await;
    let uri = format!("/sessions/{}/summary", id);

    let (status, _) = send(&app, empty_request(Method::POST, &uri)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, empty_request(Method::POST, &uri)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("try again"));

    let (_, session) = send(&app, empty_request(Method::GET, &format!("/sessions/{}", id))).await;
    assert_eq!(session["usage"]["used"], 1);
    assert_eq!(session["usage"]["remaining"], 2);
}

#[tokio::test]
async fn action_without_document_is_conflict() {
    let provider = Arc::new(MockTextProvider::new(true));
    let app = test_app(provider.clone());
    let id = create_session(&app).await;

    let (status, _) = send(
        &app,
        empty_request(Method::POST, &format!("/sessions/{}/summary", id)),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn unknown_and_malformed_session_ids() {
    let app = test_app(Arc::new(MockTextProvider::new(true)));

    let (status, _) = send(
        &app,
        empty_request(
            Method::POST,
            "/sessions/3f2b8c1e-0000-4000-8000-000000000000/summary",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, empty_request(Method::GET, "/sessions/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn second_upload_is_ignored() {
    let app = test_app(Arc::new(MockTextProvider::new(true)));
    let id = loaded_session(&app).await;

    let (status, body) = send(&app, upload_request(&id, &pdf_with_pages(&["Other"]))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ignored");
    assert_eq!(body["document"]["char_count"], 11);
}

#[tokio::test]
async fn replace_policy_swaps_document() {
    let mut config = test_config();
    config.documents.reupload_policy = ReuploadPolicy::Replace;
    let provider = Arc::new(MockTextProvider::new(true));
    let (_, app) = test_app_with(config, provider.clone());
    let id = loaded_session(&app).await;

    let (status, body) = send(&app, upload_request(&id, &pdf_with_pages(&["Other"]))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "replaced");

    send(
        &app,
        empty_request(Method::POST, &format!("/sessions/{}/summary", id)),
    )
    .await;
    assert!(provider.prompts()[0].contains("Other"));
    assert!(!provider.prompts()[0].contains("Hello"));
}

#[tokio::test]
async fn invalid_uploads_are_rejected() {
    let app = test_app(Arc::new(MockTextProvider::new(true)));
    let id = create_session(&app).await;

    let (status, _) = send(&app, upload_request(&id, b"definitely not a pdf")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, upload_request(&id, b"%PDF-1.4\ngarbage")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, session) = send(&app, empty_request(Method::GET, &format!("/sessions/{}", id))).await;
    assert_eq!(session["has_document"], false);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let mut config = test_config();
    config.documents.max_upload_bytes = 1024;
    let (_, app) = test_app_with(config, Arc::new(MockTextProvider::new(true)));
    let id = create_session(&app).await;

    let (status, _) = send(&app, upload_request(&id, &vec![b'a'; 8 * 1024])).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn busy_session_rejects_concurrent_action() {
    let provider = Arc::new(MockTextProvider::new(true));
    let (state, app) = test_app_with(test_config(), provider.clone());
    let id = loaded_session(&app).await;

    let handle = state.store.get(&id.parse().unwrap()).unwrap();
    let guard = handle.lock().await;

    let (status, _) = send(
        &app,
        empty_request(Method::POST, &format!("/sessions/{}/summary", id)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(provider.call_count(), 0);

    drop(guard);
    let (status, _) = send(
        &app,
        empty_request(Method::POST, &format!("/sessions/{}/summary", id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn sessions_are_isolated() {
    let app = test_app(Arc::new(MockTextProvider::new(true)));
    let a = loaded_session(&app).await;
    let b = loaded_session(&app).await;

    send(&app, empty_request(Method::POST, &format!("/sessions/{}/summary", a))).await;

    let (_, session_a) = send(&app, empty_request(Method::GET, &format!("/sessions/{}", a))).await;
    let (_, session_b) = send(&app, empty_request(Method::GET, &format!("/sessions/{}", b))).await;
    assert_eq!(session_a["usage"]["used"], 1);
    assert_eq!(session_b["usage"]["used"], 0);
}

#[tokio::test]
async fn deleted_session_is_gone() {
    let app = test_app(Arc::new(MockTextProvider::new(true)));
    let id = loaded_session(&app).await;
    let uri = format!("/sessions/{}", id);

    let (status, _) = send(&app, empty_request(Method::DELETE, &uri)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, empty_request(Method::GET, &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, empty_request(Method::DELETE, &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_view_does_not_wait_for_running_action() {
    let provider = Arc::new(MockTextProvider::new(true).with_delay(Duration::from_millis(1500)));
    let app = test_app(provider.clone());
    let id = loaded_session(&app).await;
    let session_uri = format!("/sessions/{}", id);

    let action = {
        let app = app.clone();
        let uri = format!("/sessions/{}/summary", id);
        tokio::spawn(async move { send(&app, empty_request(Method::POST, &uri)).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let (status, session) = tokio::time::timeout(
        Duration::from_millis(500),
        send(&app, empty_request(Method::GET, &session_uri)),
    )
    .await
    .expect("session view waited for the running action");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["has_document"], true);
    assert_eq!(session["usage"]["used"], 0);

    let (status, _) = action.await.unwrap();
    assert_eq!(status, StatusCode::OK);

    let (_, session) = send(&app, empty_request(Method::GET, &session_uri)).await;
    assert_eq!(session["usage"]["used"], 1);
    assert_eq!(session["usage"]["remaining"], 2);
}

#[tokio::test]
async fn provider_timeout_is_gateway_timeout_and_not_charged() {
    let mut config = test_config();
    config.llm.timeout_secs = 1;
    let provider = Arc::new(MockTextProvider::new(true).with_delay(Duration::from_millis(1500)));
    let (_, app) = test_app_with(config, provider.clone());
    let id = loaded_session(&app).await;

    let (status, body) = send(
        &app,
        empty_request(Method::POST, &format!("/sessions/{}/summary", id)),
    )
    .await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(body["error"].as_str().unwrap().contains("try again"));

    let (_, session) = send(&app, empty_request(Method::GET, &format!("/sessions/{}", id))).await;
    assert_eq!(session["usage"]["used"], 0);
}
