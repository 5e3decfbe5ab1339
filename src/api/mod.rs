//! REST API server module
//!
//! Operator surface over the newsroom: review pending items, inspect the
//! broadcast queue, and follow pipeline events live.

use crate::{Config, Newsroom, Result};
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Path prefix every route is served under
pub const API_PREFIX: &str = "/api/v1";

/// Create the API router with all route definitions
///
/// Paths are relative; [`start_api_server`] mounts the router under
/// [`API_PREFIX`].
///
/// # Routes
///
/// ## Items
/// - `GET /items?state=&limit=` - List items, optionally by state
/// - `GET /items/:id` - Get single item
/// - `PATCH /items/:id` - Edit headline and summary
/// - `POST /items/:id/approve` - Approve a pending item
/// - `POST /items/:id/reject` - Reject a pending item
///
/// ## Queue
/// - `GET /queue` - Approved items in dispatch order
/// - `GET /stats` - Item counts per state
///
/// ## System
/// - `GET /health` - Health check, including summarizer availability
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
/// - `GET /events` - Server-sent events stream
pub fn create_router(newsroom: Arc<Newsroom>, config: Arc<Config>) -> Router {
    let state = AppState::new(newsroom, config.clone());

    let router = Router::new()
        // Items
        .route("/items", get(routes::list_items))
        .route(
            "/items/:id",
            get(routes::get_item).patch(routes::edit_item),
        )
        .route("/items/:id/approve", post(routes::approve_item))
        .route("/items/:id/reject", post(routes::reject_item))
        // Queue
        .route("/queue", get(routes::get_queue))
        .route("/stats", get(routes::get_stats))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/events", get(routes::event_stream));

    // Swagger UI reads the document from our own /openapi.json route
    let router = if config.server.api.swagger_ui {
        router.merge(
            SwaggerUi::new("/swagger-ui")
                .url(format!("{}/openapi.json", API_PREFIX), ApiDoc::openapi()),
        )
    } else {
        router
    };

    let router = router.with_state(state);

    let router = match &config.server.api.api_key {
        Some(key) => router.layer(middleware::from_fn_with_state(
            Arc::<str>::from(key.as_str()),
            auth::require_api_key,
        )),
        None => router,
    };

    if config.server.api.cors_enabled {
        router.layer(build_cors_layer(&config.server.api.cors_origins))
    } else {
        router
    }
}

/// Build a CORS layer for the configured origins
///
/// An empty list or `"*"` allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer.allow_origin(AllowOrigin::list(allowed))
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until the server stops, either due to an error or because the task
/// is aborted.
pub async fn start_api_server(newsroom: Arc<Newsroom>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.server.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = Router::new()
        .nest(API_PREFIX, create_router(newsroom, config))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
