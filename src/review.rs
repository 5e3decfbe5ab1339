//! Review gate: operator commands on pending and approved items
//!
//! Every command is a single guarded store operation. Store errors are
//! returned unchanged, so a caller sees `InvalidTransition`, `InvalidState`
//! or `NotFound` exactly as the store reported them.

use crate::db::Database;
use crate::error::{Error, ItemError, Result};
use crate::types::{Event, ItemId, ItemState, NewsItem, StateCounts};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// Operator-facing commands over the item store
#[derive(Clone)]
pub struct ReviewGate {
    db: Arc<Database>,
    event_tx: broadcast::Sender<Event>,
}

impl ReviewGate {
    /// Create a review gate over `db`, announcing changes on `event_tx`
    pub fn new(db: Arc<Database>, event_tx: broadcast::Sender<Event>) -> Self {
        Self { db, event_tx }
    }

    /// Approve a pending item, appending it to the broadcast queue
    ///
    /// # Errors
    /// `InvalidTransition` if the item is not pending, `NotFound` if it does not exist
    pub async fn approve(&self, id: ItemId) -> Result<NewsItem> {
        let item = self
            .db
            .transition(id, &[ItemState::Pending], ItemState::Approved)
            .await?;
        info!(item_id = %id, approval_seq = ?item.approval_seq, "item approved");
        self.event_tx.send(Event::Approved { id }).ok();
        Ok(item)
    }

    /// Reject a pending item
    ///
    /// # Errors
    /// `InvalidTransition` if the item is not pending, `NotFound` if it does not exist
    pub async fn reject(&self, id: ItemId) -> Result<NewsItem> {
        let item = self
            .db
            .transition(id, &[ItemState::Pending], ItemState::Rejected)
            .await?;
        info!(item_id = %id, "item rejected");
        self.event_tx.send(Event::Rejected { id }).ok();
        Ok(item)
    }

    /// Replace headline and summary of a pending or approved item
    ///
    /// Editing an approved item keeps its queue position.
    ///
    /// # Errors
    /// `InvalidState` if the item is already claimed or terminal
    pub async fn edit(&self, id: ItemId, headline: &str, summary: &str) -> Result<NewsItem> {
        let item = self.db.edit_item(id, headline, summary).await?;
        info!(item_id = %id, state = %item.state, "item edited");
        self.event_tx.send(Event::Edited { id }).ok();
        Ok(item)
    }

    /// Items in `state`, or all items when `None`
    ///
    /// Approved items come back in dispatch order, everything else newest first.
    pub async fn list_by_state(
        &self,
        state: Option<ItemState>,
        limit: Option<i64>,
    ) -> Result<Vec<NewsItem>> {
        self.db.list_items(state, limit).await
    }

    /// Approved items in the order the scheduler will claim them
    pub async fn queue(&self) -> Result<Vec<NewsItem>> {
        self.db.list_items(Some(ItemState::Approved), None).await
    }

    /// A single item
    ///
    /// # Errors
    /// `NotFound` if no item has this id
    pub async fn get(&self, id: ItemId) -> Result<NewsItem> {
        self.db
            .get_item(id)
            .await?
            .ok_or(Error::Item(ItemError::NotFound { id: id.get() }))
    }

    /// Item counts per state
    pub async fn stats(&self) -> Result<StateCounts> {
        self.db.count_by_state().await
    }
}
