use super::*;
use crate::api::routes::{HealthResponse, event_name};
use crate::types::{Event, ItemId};

#[tokio::test]
async fn health_reports_backends() {
    let (_newsroom, app, _dir) = create_test_app().await;

    let response = send(&app, "GET", "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let health: HealthResponse = json_body(response).await;
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(health.summarizer, "echo");
    assert!(health.summarizer_available);
    assert_eq!(health.broadcaster, "recording");
}

#[tokio::test]
async fn openapi_json_is_served() {
    let (_newsroom, app, _dir) = create_test_app().await;

    let response = send(&app, "GET", "/openapi.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let doc: serde_json::Value = json_body(response).await;
    assert!(doc["openapi"].as_str().unwrap().starts_with("3."));
    assert_eq!(doc["info"]["title"], "newscast REST API");
}

#[tokio::test]
async fn swagger_ui_is_mounted_when_enabled() {
    let (newsroom, app, _dir) = create_test_app().await;

    let response = send(&app, "GET", "/swagger-ui", None).await;
    assert_ne!(response.status(), StatusCode::NOT_FOUND);

    let mut config = (*newsroom.get_config()).clone();
    config.server.api.swagger_ui = false;
    let app = create_router(newsroom, Arc::new(config));
    let response = send(&app, "GET", "/swagger-ui", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sse_stream_delivers_events() {
    let (newsroom, app, _dir) = create_test_app().await;

    let request = Request::builder()
        .uri("/events")
        .header("Accept", "text/event-stream")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(content_type.contains("text/event-stream"), "{content_type}");

    newsroom.emit_event(Event::Approved { id: ItemId(7) });

    let mut body = response.into_body().into_data_stream();
    let chunk = tokio::time::timeout(Duration::from_secs(2), async {
        use futures::StreamExt;
        body.next().await
    })
    .await
    .unwrap()
    .unwrap()
    .unwrap();
    let text = String::from_utf8(chunk.to_vec()).unwrap();

    assert!(text.contains("event: approved"), "{text}");
    assert!(text.contains(r#""type":"approved""#), "{text}");
    assert!(text.contains(r#""id":7"#), "{text}");
}

#[test]
fn event_names_match_serde_tags() {
    let events = [
        Event::Approved { id: ItemId(1) },
        Event::Streamed { id: ItemId(1) },
        Event::CycleComplete {
            fetched: 1,
            inserted: 1,
            duplicates: 0,
            failed: 0,
        },
        Event::Fault {
            component: "broadcast".into(),
            error: "disk".into(),
        },
        Event::Shutdown,
    ];

    for event in events {
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event_name(&event));
    }
}
