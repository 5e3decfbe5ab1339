//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`items`] - Item review, queue and counts
//! - [`system`] - Health, events, OpenAPI

use serde::{Deserialize, Serialize};

mod items;
mod system;

pub use items::*;
pub use system::*;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Query parameters for GET /items
#[derive(Debug, Default, Deserialize, Serialize, utoipa::IntoParams, utoipa::ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListItemsQuery {
    /// Only items in this state: pending, approved, rejected, streaming, streamed or failed
    pub state: Option<String>,
    /// Maximum number of items to return
    pub limit: Option<i64>,
}

/// Request body for PATCH /items/:id
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct EditItemRequest {
    /// Replacement headline, must not be blank
    pub headline: String,
    /// Replacement summary, must not be blank
    pub summary: String,
}

/// Response for GET /health
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// Always "ok" when the server answers
    pub status: String,
    /// Crate version
    pub version: String,
    /// Configured summarizer backend
    pub summarizer: String,
    /// Whether the summarizer backend is reachable right now
    pub summarizer_available: bool,
    /// Configured broadcaster backend
    pub broadcaster: String,
}
