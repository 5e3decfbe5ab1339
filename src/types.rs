//! Core types for newscast

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Unique identifier for a news item
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl ItemId {
    /// Create a new ItemId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ItemId> for i64 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl PartialEq<i64> for ItemId {
    fn eq(&self, other: &i64) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

// Implement sqlx Type, Encode, and Decode for database operations
impl sqlx::Type<sqlx::Sqlite> for ItemId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for ItemId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for ItemId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <i64 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// Lifecycle state of a news item
///
/// Legal transitions:
///
/// ```text
/// pending   -> approved | rejected
/// approved  -> streaming
/// streaming -> streamed | failed | approved
/// ```
///
/// Nothing re-enters `pending`. `rejected`, `streamed` and `failed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    /// Summarized and waiting for review
    Pending,
    /// Approved by an operator, queued for broadcast
    Approved,
    /// Rejected by an operator
    Rejected,
    /// Claimed by the broadcast scheduler, render in progress
    Streaming,
    /// Successfully broadcast
    Streamed,
    /// Broadcast failed permanently or ran out of retries
    Failed,
}

impl ItemState {
    /// Every state, in lifecycle order
    pub const ALL: [ItemState; 6] = [
        ItemState::Pending,
        ItemState::Approved,
        ItemState::Rejected,
        ItemState::Streaming,
        ItemState::Streamed,
        ItemState::Failed,
    ];

    /// Database and wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemState::Pending => "pending",
            ItemState::Approved => "approved",
            ItemState::Rejected => "rejected",
            ItemState::Streaming => "streaming",
            ItemState::Streamed => "streamed",
            ItemState::Failed => "failed",
        }
    }

    /// Whether `self -> to` is an edge of the lifecycle graph
    pub fn can_transition_to(&self, to: ItemState) -> bool {
        use ItemState::*;
        matches!(
            (self, to),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Approved, Streaming)
                | (Streaming, Streamed)
                | (Streaming, Failed)
                | (Streaming, Approved)
        )
    }

    /// Headline and summary may only change before the item is claimed
    pub fn is_editable(&self) -> bool {
        matches!(self, ItemState::Pending | ItemState::Approved)
    }

    /// Terminal states have no outgoing edges
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ItemState::Rejected | ItemState::Streamed | ItemState::Failed
        )
    }
}

impl std::fmt::Display for ItemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known [`ItemState`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown item state '{0}'")]
pub struct ParseStateError(pub String);

impl std::str::FromStr for ItemState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| ParseStateError(s.to_string()))
    }
}

// States are stored as TEXT so the database stays readable with the sqlite3 CLI
impl sqlx::Type<sqlx::Sqlite> for ItemState {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for ItemState {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.as_str().to_string(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for ItemState {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let text = <String as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(text.parse::<ItemState>()?)
    }
}

/// A news item as stored in the item store
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct NewsItem {
    /// Unique item ID
    #[schema(value_type = i64)]
    pub id: ItemId,
    /// Link to the original article
    pub source_url: String,
    /// Name of the feed the item came from
    pub source_name: String,
    /// Title as published by the source
    pub raw_title: String,
    /// Cleaned article text as published by the source
    pub raw_content: String,
    /// Broadcast headline
    pub headline: String,
    /// Broadcast summary
    pub summary: String,
    /// Current lifecycle state
    pub state: ItemState,
    /// Fingerprint of the normalized source URL and title
    pub dedup_key: String,
    /// Failed dispatch attempts
    pub retry_count: i64,
    /// Error from the most recent failed attempt
    pub last_error: Option<String>,
    /// Queue position, assigned on approval
    pub approval_seq: Option<i64>,
    /// Unix timestamp when the item was ingested
    pub created_at: i64,
    /// Unix timestamp of the last transition or edit
    pub updated_at: i64,
    /// Unix timestamp when the item was approved
    pub approved_at: Option<i64>,
    /// Unix timestamp when the item finished streaming
    pub streamed_at: Option<i64>,
}

/// Number of items in each state
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StateCounts {
    /// Items waiting for review
    pub pending: i64,
    /// Items queued for broadcast
    pub approved: i64,
    /// Items rejected by an operator
    pub rejected: i64,
    /// Items currently being rendered
    pub streaming: i64,
    /// Items broadcast successfully
    pub streamed: i64,
    /// Items that failed permanently
    pub failed: i64,
}

impl StateCounts {
    /// Mutable counter for a state
    pub fn slot_mut(&mut self, state: ItemState) -> &mut i64 {
        match state {
            ItemState::Pending => &mut self.pending,
            ItemState::Approved => &mut self.approved,
            ItemState::Rejected => &mut self.rejected,
            ItemState::Streaming => &mut self.streaming,
            ItemState::Streamed => &mut self.streamed,
            ItemState::Failed => &mut self.failed,
        }
    }

    /// Total number of items across all states
    pub fn total(&self) -> i64 {
        self.pending + self.approved + self.rejected + self.streaming + self.streamed + self.failed
    }
}

/// Event emitted as items move through the pipeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// New item summarized and stored as pending
    Ingested {
        /// Item ID
        #[schema(value_type = i64)]
        id: ItemId,
        /// Generated headline
        headline: String,
        /// Feed name
        source: String,
    },

    /// Item approved and queued
    Approved {
        /// Item ID
        #[schema(value_type = i64)]
        id: ItemId,
    },

    /// Item rejected
    Rejected {
        /// Item ID
        #[schema(value_type = i64)]
        id: ItemId,
    },

    /// Headline or summary changed by an operator
    Edited {
        /// Item ID
        #[schema(value_type = i64)]
        id: ItemId,
    },

    /// Item claimed by the broadcast scheduler
    Streaming {
        /// Item ID
        #[schema(value_type = i64)]
        id: ItemId,
        /// Headline being broadcast
        headline: String,
    },

    /// Item broadcast successfully
    Streamed {
        /// Item ID
        #[schema(value_type = i64)]
        id: ItemId,
    },

    /// Render failed transiently; item returned to the queue
    Requeued {
        /// Item ID
        #[schema(value_type = i64)]
        id: ItemId,
        /// Attempts so far
        retry_count: i64,
        /// Render error message
        error: String,
    },

    /// Render failed permanently or retries exhausted
    Failed {
        /// Item ID
        #[schema(value_type = i64)]
        id: ItemId,
        /// Attempts made
        retry_count: i64,
        /// Render error message
        error: String,
    },

    /// Shutdown interrupted a render; claim returned to the queue
    Released {
        /// Item ID
        #[schema(value_type = i64)]
        id: ItemId,
    },

    /// Item found in `streaming` at startup and returned to the queue
    Recovered {
        /// Item ID
        #[schema(value_type = i64)]
        id: ItemId,
    },

    /// Ingestion cycle finished
    CycleComplete {
        /// Candidates returned by all feeds
        fetched: usize,
        /// New items stored
        inserted: usize,
        /// Candidates skipped as already known
        duplicates: usize,
        /// Candidates skipped because summarization failed
        failed: usize,
    },

    /// A pipeline loop stopped on a store error
    Fault {
        /// Component that stopped
        component: String,
        /// Error message
        error: String,
    },

    /// Newsroom is shutting down
    Shutdown,
}
