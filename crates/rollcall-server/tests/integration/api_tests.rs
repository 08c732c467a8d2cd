use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use crate::integration::common::{
    MAX_DOCUMENT_BYTES, MEET_URL, meeting_html, message, send_json, setup_test_app, upload,
};

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app();

    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["document"], "detached");
    assert_eq!(json["monitor"], "idle");
    assert_eq!(json["revision"], 0);
}

#[tokio::test]
async fn get_participants_without_document_is_a_failure() {
    let app = setup_test_app();

    let (status, json) = message(&app.router, "GET_PARTICIPANTS").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "No meeting document attached");
    assert!(json.get("participants").is_none());
}

#[tokio::test]
async fn upload_then_get_participants() {
    let app = setup_test_app();
    let html = meeting_html(&[
        "Alice Johnson",
        "Bob Smith (You)",
        "mute",
        "erw-zqba-yqt",
        "1. Carol Davis",
    ]);

    let (status, json) = upload(&app.router, MEET_URL, &html).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["revision"], 1);
    assert_eq!(json["meeting_page"], true);

    let (status, json) = message(&app.router, "GET_PARTICIPANTS").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({"participants": ["Alice Johnson", "Bob Smith", "Carol Davis"]})
    );
}

#[tokio::test]
async fn empty_panel_is_not_a_failure() {
    let app = setup_test_app();
    upload(&app.router, MEET_URL, &meeting_html(&[])).await;

    let (status, json) = message(&app.router, "GET_PARTICIPANTS").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"participants": []}));
}

#[tokio::test]
async fn invalid_page_url_returns_400() {
    let app = setup_test_app();

    let (status, json) = upload(&app.router, "not a url", "<html></html>").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "parse_error");
    assert!(!app.state.document.is_attached());
}

#[tokio::test]
async fn oversized_document_returns_413() {
    let app = setup_test_app();
    let html = "x".repeat(MAX_DOCUMENT_BYTES + 1);
    let body = json!({ "url": MEET_URL, "html": html }).to_string();

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/v1/document")
        .header("content-type", "application/json")
        .header("content-length", body.len())
        .body(Body::from(body))
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(!app.state.document.is_attached());
}

#[tokio::test]
async fn unknown_message_type_is_rejected() {
    let app = setup_test_app();

    let (status, _) = message(&app.router, "SPIN_THE_WHEEL").await;

    assert!(status.is_client_error());
}

#[tokio::test]
async fn start_and_stop_monitoring() {
    let app = setup_test_app();
    upload(&app.router, MEET_URL, &meeting_html(&["Alice Johnson"])).await;

    let (status, json) = message(&app.router, "START_MONITORING").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"success": true}));

    let (_, health) = send_json(&app.router, Method::GET, "/health", json!(null)).await;
    assert_eq!(health["monitor"], "observing");
    assert_eq!(health["document"], "attached");

    let (_, json) = message(&app.router, "STOP_MONITORING").await;
    assert_eq!(json, json!({"success": true}));
    let (_, health) = send_json(&app.router, Method::GET, "/health", json!(null)).await;
    assert_eq!(health["monitor"], "idle");
}

#[tokio::test]
async fn events_stream_pushes_participant_updates() {
    let app = setup_test_app();
    upload(&app.router, MEET_URL, &meeting_html(&["Alice Johnson"])).await;

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/v1/events").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );
    let mut body = response.into_body();

    message(&app.router, "START_MONITORING").await;

    let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
        .await
        .expect("no event within timeout")
        .unwrap()
        .unwrap();
    let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();

    assert!(text.contains("event: PARTICIPANTS_UPDATED"));
    assert!(text.contains(r#""participants":["Alice Johnson"]"#));

    // A new capture is a mutation: the monitor pushes again.
    upload(&app.router, MEET_URL, &meeting_html(&["Alice Johnson", "Dana Lee"])).await;
    let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
        .await
        .expect("no second event within timeout")
        .unwrap()
        .unwrap();
    let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
    assert!(text.contains(r#""participants":["Alice Johnson","Dana Lee"]"#));

    message(&app.router, "STOP_MONITORING").await;
}
