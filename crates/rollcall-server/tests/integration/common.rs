use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use rollcall_core::MonitorConfig;
use rollcall_server::routes;
use rollcall_server::state::AppState;

pub const MEET_URL: &str = "https://meet.google.com/abc-defg-hij";
pub const MAX_DOCUMENT_BYTES: usize = 64 * 1024;

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

/// Build the app with a short debounce so monitor tests finish quickly.
pub fn setup_test_app() -> TestApp {
    let config = MonitorConfig::default()
        .with_debounce(Duration::from_millis(10))
        .with_settle_delay(Duration::ZERO);
    let state = Arc::new(AppState::new(config));
    TestApp {
        router: routes::router(Arc::clone(&state), MAX_DOCUMENT_BYTES),
        state,
    }
}

/// A minimal meeting page with the people panel open.
pub fn meeting_html(names: &[&str]) -> String {
    let items: String = names
        .iter()
        .map(|n| format!(r#"<div role="listitem">{n}</div>"#))
        .collect();
    format!(
        r#"<html><body>
<div role="toolbar"><button>Leave call</button></div>
<aside role="complementary">
  <div>Add people</div>
  <div role="list" aria-label="Participants">{items}</div>
</aside>
</body></html>"#
    )
}

/// Send a JSON request and decode the JSON response.
pub async fn send_json(
    router: &Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

pub async fn upload(router: &Router, url: &str, html: &str) -> (StatusCode, serde_json::Value) {
    send_json(
        router,
        Method::PUT,
        "/v1/document",
        serde_json::json!({ "url": url, "html": html }),
    )
    .await
}

pub async fn message(router: &Router, kind: &str) -> (StatusCode, serde_json::Value) {
    send_json(router, Method::POST, "/v1/messages", serde_json::json!({ "type": kind })).await
}
