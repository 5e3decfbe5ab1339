//! OpenAPI documentation and schema generation

use utoipa::OpenApi;

/// OpenAPI documentation for the newscast REST API
///
/// Served at `/api/v1/openapi.json`, and through Swagger UI at
/// `/api/v1/swagger-ui` when enabled.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "newscast REST API",
        version = "0.1.0",
        description = "Review and broadcast control for the newscast news ticker",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080/api/v1", description = "Local development server")
    ),
    paths(
        // Items
        crate::api::routes::list_items,
        crate::api::routes::get_item,
        crate::api::routes::edit_item,
        crate::api::routes::approve_item,
        crate::api::routes::reject_item,

        // Queue
        crate::api::routes::get_queue,
        crate::api::routes::get_stats,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        crate::types::NewsItem,
        crate::types::ItemState,
        crate::types::StateCounts,
        crate::types::Event,

        crate::api::routes::ListItemsQuery,
        crate::api::routes::EditItemRequest,
        crate::api::routes::HealthResponse,

        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "items", description = "Review - list, edit, approve and reject items"),
        (name = "queue", description = "Broadcast queue and per-state counts"),
        (name = "system", description = "Health, OpenAPI document, live events"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Declares the `X-Api-Key` header scheme
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "api_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-Api-Key"),
                    ),
                ),
            );
        }
    }
}
