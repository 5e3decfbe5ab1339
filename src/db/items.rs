//! Item store: inserts, compare-and-swap state transitions, queue claims and edits.

use crate::error::{DatabaseError, ItemError};
use crate::types::{ItemId, ItemState, NewsItem, StateCounts};
use crate::{Error, Result};

use super::{Database, NewItem};

fn query_failed(context: &str, e: sqlx::Error) -> Error {
    Error::Database(DatabaseError::QueryFailed(format!("{}: {}", context, e)))
}

impl Database {
    /// Insert a freshly summarized item in state `pending`
    ///
    /// Fails with [`ItemError::DuplicateKey`] when a non-rejected item already
    /// carries the same dedup key. The check is a partial unique index, so two
    /// concurrent inserts cannot both succeed.
    pub async fn insert_item(&self, item: &NewItem) -> Result<ItemId> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO news_items (
                source_url, source_name, raw_title, raw_content,
                headline, summary, state, dedup_key, retry_count,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, 'pending', ?, 0, ?, ?)
            "#,
        )
        .bind(&item.source_url)
        .bind(&item.source_name)
        .bind(&item.raw_title)
        .bind(&item.raw_content)
        .bind(&item.headline)
        .bind(&item.summary)
        .bind(&item.dedup_key)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(ItemId(done.last_insert_rowid())),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(Error::Item(ItemError::DuplicateKey {
                    dedup_key: item.dedup_key.clone(),
                }))
            }
            Err(e) => Err(query_failed("Failed to insert item", e)),
        }
    }

    /// Get an item by ID
    pub async fn get_item(&self, id: ItemId) -> Result<Option<NewsItem>> {
        sqlx::query_as::<_, NewsItem>("SELECT * FROM news_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to get item", e))
    }

    /// List items, optionally filtered by state
    ///
    /// Approved items come back in dispatch order (approval sequence, then id).
    /// Everything else is newest first. `None` for `limit` returns every row.
    pub async fn list_items(
        &self,
        state: Option<ItemState>,
        limit: Option<i64>,
    ) -> Result<Vec<NewsItem>> {
        let order = match state {
            Some(ItemState::Approved) => "approval_seq ASC, id ASC",
            _ => "created_at DESC, id DESC",
        };
        let filter = if state.is_some() { "WHERE state = ?" } else { "" };
        let sql = format!("SELECT * FROM news_items {filter} ORDER BY {order} LIMIT ?");

        let mut query = sqlx::query_as::<_, NewsItem>(&sql);
        if let Some(state) = state {
            query = query.bind(state);
        }
        query
            .bind(limit.unwrap_or(-1))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to list items", e))
    }

    /// Whether any item, including a rejected one, has this dedup key
    pub async fn dedup_key_seen(&self, dedup_key: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM news_items WHERE dedup_key = ?)",
        )
        .bind(dedup_key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to check dedup key", e))
    }

    /// Move an item to `to` if its current state is one of `from`
    ///
    /// This is a single compare-and-swap statement: of several concurrent
    /// callers racing on the same item, exactly one succeeds. Every requested
    /// edge must belong to the lifecycle graph. The pending→approved edge
    /// assigns the next approval sequence number, and streaming→streamed
    /// stamps `streamed_at`.
    pub async fn transition(
        &self,
        id: ItemId,
        from: &[ItemState],
        to: ItemState,
    ) -> Result<NewsItem> {
        // Refused without touching the row; the error carries the real state
        if from.is_empty() || from.iter().any(|state| !state.can_transition_to(to)) {
            return Err(self.explain_miss(id, to).await);
        }

        let now = chrono::Utc::now().timestamp();
        let placeholders = vec!["?"; from.len()].join(", ");
        let sql = format!(
            r#"
            UPDATE news_items SET
                state = ?,
                updated_at = ?,
                approval_seq = CASE WHEN state = 'pending' AND ? = 'approved'
                    THEN (SELECT COALESCE(MAX(approval_seq), 0) + 1 FROM news_items)
                    ELSE approval_seq END,
                approved_at = CASE WHEN state = 'pending' AND ? = 'approved'
                    THEN ? ELSE approved_at END,
                streamed_at = CASE WHEN ? = 'streamed' THEN ? ELSE streamed_at END
            WHERE id = ? AND state IN ({placeholders})
            RETURNING *
            "#
        );

        let mut query = sqlx::query_as::<_, NewsItem>(&sql)
            .bind(to)
            .bind(now)
            .bind(to)
            .bind(to)
            .bind(now)
            .bind(to)
            .bind(now)
            .bind(id);
        for state in from {
            query = query.bind(*state);
        }

        let updated = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to transition item", e))?;

        match updated {
            Some(item) => Ok(item),
            None => Err(self.explain_miss(id, to).await),
        }
    }

    /// Build the error for a guarded update that matched no row
    async fn explain_miss(&self, id: ItemId, to: ItemState) -> Error {
        match self.get_item(id).await {
            Ok(Some(item)) => Error::Item(ItemError::InvalidTransition {
                id: id.get(),
                current_state: item.state.to_string(),
                requested_state: to.to_string(),
            }),
            Ok(None) => Error::Item(ItemError::NotFound { id: id.get() }),
            Err(e) => e,
        }
    }

    /// Head of the approved queue, without claiming it
    pub async fn next_approved(&self) -> Result<Option<NewsItem>> {
        sqlx::query_as::<_, NewsItem>(
            r#"
            SELECT * FROM news_items
            WHERE state = 'approved'
            ORDER BY approval_seq ASC, id ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to peek approved queue", e))
    }

    /// Atomically take the head of the approved queue and move it to `streaming`
    ///
    /// Returns `None` when nothing is approved.
    pub async fn claim_next_approved(&self) -> Result<Option<NewsItem>> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query_as::<_, NewsItem>(
            r#"
            UPDATE news_items SET state = 'streaming', updated_at = ?
            WHERE id = (
                SELECT id FROM news_items
                WHERE state = 'approved'
                ORDER BY approval_seq ASC, id ASC
                LIMIT 1
            )
            AND state = 'approved'
            RETURNING *
            "#,
        )
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to claim next approved item", e))
    }

    /// Record a failed render attempt for a claimed item
    ///
    /// Increments `retry_count` and stores the error. The item goes to
    /// `failed` when the failure is permanent or the new count reaches
    /// `ceiling`, otherwise back to `approved` with its queue position intact.
    pub async fn record_render_failure(
        &self,
        id: ItemId,
        error: &str,
        transient: bool,
        ceiling: u32,
    ) -> Result<NewsItem> {
        let now = chrono::Utc::now().timestamp();
        let updated = sqlx::query_as::<_, NewsItem>(
            r#"
            UPDATE news_items SET
                retry_count = retry_count + 1,
                last_error = ?,
                updated_at = ?,
                state = CASE WHEN ? = 0 OR retry_count + 1 >= ?
                    THEN 'failed' ELSE 'approved' END
            WHERE id = ? AND state = 'streaming'
            RETURNING *
            "#,
        )
        .bind(error)
        .bind(now)
        .bind(transient)
        .bind(i64::from(ceiling))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to record render failure", e))?;

        match updated {
            Some(item) => Ok(item),
            None => Err(self.explain_miss(id, ItemState::Failed).await),
        }
    }

    /// Return a claimed item to the queue without counting an attempt
    pub async fn release_claim(&self, id: ItemId) -> Result<NewsItem> {
        self.transition(id, &[ItemState::Streaming], ItemState::Approved)
            .await
    }

    /// Move every `streaming` item back to `approved`
    ///
    /// Run once at startup: nothing can be mid-render before the scheduler
    /// starts, so any `streaming` row was left behind by a crash.
    pub async fn recover_streaming(&self) -> Result<Vec<ItemId>> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query_scalar::<_, ItemId>(
            r#"
            UPDATE news_items SET state = 'approved', updated_at = ?
            WHERE state = 'streaming'
            RETURNING id
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to recover streaming items", e))
    }

    /// Replace headline and summary of an item that has not been claimed yet
    pub async fn edit_item(&self, id: ItemId, headline: &str, summary: &str) -> Result<NewsItem> {
        let now = chrono::Utc::now().timestamp();
        let updated = sqlx::query_as::<_, NewsItem>(
            r#"
            UPDATE news_items SET headline = ?, summary = ?, updated_at = ?
            WHERE id = ? AND state IN ('pending', 'approved')
            RETURNING *
            "#,
        )
        .bind(headline)
        .bind(summary)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to edit item", e))?;

        if let Some(item) = updated {
            return Ok(item);
        }

        match self.get_item(id).await? {
            Some(item) => Err(Error::Item(ItemError::InvalidState {
                id: id.get(),
                operation: "edit".to_string(),
                current_state: item.state.to_string(),
            })),
            None => Err(Error::Item(ItemError::NotFound { id: id.get() })),
        }
    }

    /// Number of items in each state
    pub async fn count_by_state(&self) -> Result<StateCounts> {
        let rows = sqlx::query_as::<_, (ItemState, i64)>(
            "SELECT state, COUNT(*) FROM news_items GROUP BY state",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to count items", e))?;

        let mut counts = StateCounts::default();
        for (state, count) in rows {
            *counts.slot_mut(state) = count;
        }
        Ok(counts)
    }
}
