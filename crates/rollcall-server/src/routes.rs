use std::convert::Infallible;
use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::routing::{get, post, put};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tower_http::limit::RequestBodyLimitLayer;
use url::Url;

use rollcall_client::parse_html;
use rollcall_core::{AppError, DocumentHost, Request, Response};

use crate::dto::{DocumentAccepted, DocumentUpload, HealthResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// Build the full router with all routes.
///
/// `max_document_bytes` caps the body of `PUT /v1/document`; other routes
/// keep axum's default limit.
pub fn router(state: Arc<AppState>, max_document_bytes: usize) -> Router {
    let api = Router::new()
        .route("/v1/messages", post(message))
        .route("/v1/events", get(events))
        .route(
            "/v1/document",
            put(put_document)
                .layer::<_, Infallible>(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(max_document_bytes)),
        );

    let public = Router::new().route("/health", get(health));

    public.merge(api).with_state(state)
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Answer one control message. Protocol-level failures (no page attached)
/// are returned in the body as `{ "success": false, "error": ... }`.
pub async fn message(
    State(state): State<Arc<AppState>>,
    axum::Json(request): axum::Json<Request>,
) -> axum::Json<Response> {
    axum::Json(state.channel.handle(request))
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Stream `PARTICIPANTS_UPDATED` pushes as server-sent events.
pub async fn events(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rx = state.notifier.subscribe();
    tracing::debug!(subscribers = state.notifier.subscriber_count(), "Event stream opened");

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(data) => Some(Ok::<_, Infallible>(
                SseEvent::default().event(event.name()).data(data),
            )),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode event");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::debug!(skipped, "Event stream lagged");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Replace the live document with an uploaded capture.
pub async fn put_document(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<DocumentUpload>,
) -> Result<impl IntoResponse, ApiError> {
    Url::parse(&body.url)
        .map_err(|e| AppError::ParseError(format!("Invalid page URL '{}': {e}", body.url)))?;

    let snapshot = parse_html(&body.html);
    let elements = snapshot.len();
    let revision = state.document.replace(body.url, snapshot);

    let response = DocumentAccepted {
        revision,
        elements,
        meeting_page: state.document.is_meeting_page(),
    };

    Ok((StatusCode::ACCEPTED, axum::Json(response)))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy",
        document: if state.document.is_attached() {
            "attached"
        } else {
            "detached"
        },
        monitor: state.monitor().state().as_str(),
        revision: state.document.revision(),
    };

    (StatusCode::OK, axum::Json(response))
}
