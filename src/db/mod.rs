//! Database layer for newscast
//!
//! Handles SQLite persistence for news items and runtime state.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`items`] - Item store: inserts, state transitions, queue claims, edits
//! - [`state`] - Runtime state (shutdown tracking)
//!
//! Every mutation is a single SQL statement, so each one is atomic for the row
//! it touches and SQLite serializes concurrent writers.

use sqlx::sqlite::SqlitePool;

mod items;
mod migrations;
mod state;

pub use crate::types::{ItemId, ItemState, NewsItem, StateCounts};

/// New item to be inserted into the store
#[derive(Debug, Clone)]
pub struct NewItem {
    /// Link to the original article
    pub source_url: String,
    /// Name of the feed the item came from
    pub source_name: String,
    /// Title as published by the source
    pub raw_title: String,
    /// Cleaned article text
    pub raw_content: String,
    /// Generated headline
    pub headline: String,
    /// Generated summary
    pub summary: String,
    /// Fingerprint from [`crate::dedup::dedup_key`]
    pub dedup_key: String,
}

/// Database handle for newscast
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
