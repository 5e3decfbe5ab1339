//! System handlers: health, OpenAPI, events.

use super::HealthResponse;
use crate::api::AppState;
use crate::types::Event;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{
        IntoResponse,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

/// GET /health - Health check
///
/// Reports the summarizer as unavailable without failing the check; ingestion
/// just skips candidates until it comes back.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let newsroom = &state.newsroom;
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        summarizer: newsroom.summarizer_name().to_string(),
        summarizer_available: newsroom.summarizer_available().await,
        broadcaster: newsroom.broadcaster_name().to_string(),
    };
    (StatusCode::OK, Json(response))
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/api/v1/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI 3 specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}

/// GET /events - Server-sent events stream
///
/// Each SSE message is named after the event type and carries the event as
/// JSON. A client that falls behind gets an `error` message with the number
/// of skipped events.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "system",
    responses(
        (status = 200, description = "Server-sent events stream (text/event-stream)", content_type = "text/event-stream")
    )
)]
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let stream = BroadcastStream::new(state.newsroom.subscribe());

    let sse_stream = stream.filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json_data) => Some(Ok(SseEvent::default()
                .event(event_name(&event))
                .data(json_data))),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize event to JSON");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "SSE client lagged");
            Some(Ok(SseEvent::default().event("error").data(format!(
                r#"{{"error":"lagged","skipped":{}}}"#,
                skipped
            ))))
        }
    });

    Sse::new(sse_stream).keep_alive(KeepAlive::default())
}

/// SSE event name, matching the `type` tag of the JSON payload
pub(crate) fn event_name(event: &Event) -> &'static str {
    match event {
        Event::Ingested { .. } => "ingested",
        Event::Approved { .. } => "approved",
        Event::Rejected { .. } => "rejected",
        Event::Edited { .. } => "edited",
        Event::Streaming { .. } => "streaming",
        Event::Streamed { .. } => "streamed",
        Event::Requeued { .. } => "requeued",
        Event::Failed { .. } => "failed",
        Event::Released { .. } => "released",
        Event::Recovered { .. } => "recovered",
        Event::CycleComplete { .. } => "cycle_complete",
        Event::Fault { .. } => "fault",
        Event::Shutdown => "shutdown",
    }
}
