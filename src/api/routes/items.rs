//! Item handlers: review commands, queue and counts.

use super::{EditItemRequest, ListItemsQuery};
use crate::api::AppState;
use crate::api::error_response::bad_request;
use crate::types::{ItemId, ItemState};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// GET /items - List items
#[utoipa::path(
    get,
    path = "/api/v1/items",
    tag = "items",
    params(ListItemsQuery),
    responses(
        (status = 200, description = "Matching items", body = Vec<crate::types::NewsItem>),
        (status = 400, description = "Unknown state or negative limit", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListItemsQuery>,
) -> Response {
    let filter = match query.state.as_deref().map(str::parse::<ItemState>) {
        None => None,
        Some(Ok(item_state)) => Some(item_state),
        Some(Err(e)) => return bad_request(e.to_string()),
    };
    if query.limit.is_some_and(|limit| limit < 0) {
        return bad_request("limit must not be negative");
    }

    match state
        .newsroom
        .review()
        .list_by_state(filter, query.limit)
        .await
    {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /items/:id - Get single item
#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    tag = "items",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item", body = crate::types::NewsItem),
        (status = 404, description = "Item not found", body = crate::error::ApiError)
    )
)]
pub async fn get_item(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.newsroom.review().get(ItemId(id)).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// PATCH /items/:id - Edit headline and summary
#[utoipa::path(
    patch,
    path = "/api/v1/items/{id}",
    tag = "items",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    request_body = EditItemRequest,
    responses(
        (status = 200, description = "Edited item", body = crate::types::NewsItem),
        (status = 400, description = "Blank headline or summary", body = crate::error::ApiError),
        (status = 404, description = "Item not found", body = crate::error::ApiError),
        (status = 409, description = "Item is no longer editable", body = crate::error::ApiError)
    )
)]
pub async fn edit_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<EditItemRequest>,
) -> Response {
    let headline = request.headline.trim();
    let summary = request.summary.trim();
    if headline.is_empty() {
        return bad_request("headline must not be empty");
    }
    if summary.is_empty() {
        return bad_request("summary must not be empty");
    }

    match state
        .newsroom
        .review()
        .edit(ItemId(id), headline, summary)
        .await
    {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /items/:id/approve - Approve a pending item
#[utoipa::path(
    post,
    path = "/api/v1/items/{id}/approve",
    tag = "items",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Approved item with its queue position", body = crate::types::NewsItem),
        (status = 404, description = "Item not found", body = crate::error::ApiError),
        (status = 409, description = "Item is not pending", body = crate::error::ApiError)
    )
)]
pub async fn approve_item(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.newsroom.review().approve(ItemId(id)).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /items/:id/reject - Reject a pending item
#[utoipa::path(
    post,
    path = "/api/v1/items/{id}/reject",
    tag = "items",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Rejected item", body = crate::types::NewsItem),
        (status = 404, description = "Item not found", body = crate::error::ApiError),
        (status = 409, description = "Item is not pending", body = crate::error::ApiError)
    )
)]
pub async fn reject_item(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.newsroom.review().reject(ItemId(id)).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /queue - Approved items in dispatch order
#[utoipa::path(
    get,
    path = "/api/v1/queue",
    tag = "queue",
    responses(
        (status = 200, description = "Approved items, next to stream first", body = Vec<crate::types::NewsItem>),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn get_queue(State(state): State<AppState>) -> Response {
    match state.newsroom.review().queue().await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /stats - Item counts per state
#[utoipa::path(
    get,
    path = "/api/v1/stats",
    tag = "queue",
    responses(
        (status = 200, description = "Counts per state", body = crate::types::StateCounts),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn get_stats(State(state): State<AppState>) -> Response {
    match state.newsroom.review().stats().await {
        Ok(counts) => (StatusCode::OK, Json(counts)).into_response(),
        Err(e) => e.into_response(),
    }
}
