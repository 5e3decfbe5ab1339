//! Broadcast scheduler: the single sequential dispatch loop
//!
//! Every `display_seconds` the scheduler claims the head of the approved
//! queue, hands it to the [`Broadcaster`], and resolves the item's state from
//! the outcome:
//!
//! - success: `streaming -> streamed`
//! - transient failure or render timeout: `streaming -> approved` while
//!   `retry_count` stays below the ceiling, otherwise `streaming -> failed`
//! - permanent failure: `streaming -> failed`
//!
//! Renders never overlap. A render that outlasts the cadence delays the next
//! tick instead of running alongside it, so a requeued item is eligible again
//! on the following tick at the earliest.
//!
//! On shutdown no new item is claimed. A render in flight gets
//! `shutdown_grace` to finish; after that its claim is released back to
//! `approved` without counting an attempt.

use crate::broadcaster::{Broadcaster, RenderError};
use crate::config::ScheduleConfig;
use crate::db::Database;
use crate::error::Result;
use crate::types::{Event, ItemId, ItemState, NewsItem};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What a single scheduler tick did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing was approved, or shutdown was already requested
    Idle,
    /// Item rendered successfully
    Streamed(ItemId),
    /// Render failed transiently, item is back in the queue
    Requeued(ItemId),
    /// Render failed permanently or retries are exhausted
    Failed(ItemId),
    /// Shutdown interrupted the render, claim returned to the queue
    Released(ItemId),
}

/// Sequential dispatch loop over the approved queue
pub struct BroadcastScheduler {
    db: Arc<Database>,
    broadcaster: Arc<dyn Broadcaster>,
    event_tx: broadcast::Sender<Event>,
    schedule: ScheduleConfig,
    cancel: CancellationToken,
}

impl BroadcastScheduler {
    /// Create a scheduler
    ///
    /// # Parameters
    /// - `db`: item store shared with the producer and the review gate
    /// - `broadcaster`: output for claimed items
    /// - `event_tx`: event bus, write-only from here
    /// - `schedule`: cadence, retry ceiling and timeouts
    /// - `cancel`: stops the loop when cancelled
    pub fn new(
        db: Arc<Database>,
        broadcaster: Arc<dyn Broadcaster>,
        event_tx: broadcast::Sender<Event>,
        schedule: ScheduleConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            db,
            broadcaster,
            event_tx,
            schedule,
            cancel,
        }
    }

    /// Run until cancelled
    ///
    /// The first tick fires immediately. Returns `Err` only for store
    /// failures, which stop the loop; broadcaster failures never do.
    pub async fn run(self) -> Result<()> {
        let cadence = Duration::from_secs(self.schedule.display_seconds);
        info!(
            broadcaster = self.broadcaster.name(),
            display_seconds = self.schedule.display_seconds,
            retry_ceiling = self.schedule.retry_ceiling,
            "broadcast scheduler started"
        );

        self.run_with_cadence(cadence).await
    }

    /// Loop body with an explicit cadence, so tests can run sub-second ticks
    pub(crate) async fn run_with_cadence(&self, cadence: Duration) -> Result<()> {
        let mut interval = tokio::time::interval(cadence);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = interval.tick() => {
                    self.tick().await?;
                }
            }
        }

        info!("broadcast scheduler stopped");
        Ok(())
    }

    /// Claim and dispatch at most one item
    pub async fn tick(&self) -> Result<TickOutcome> {
        if self.cancel.is_cancelled() {
            return Ok(TickOutcome::Idle);
        }

        let Some(item) = self.db.claim_next_approved().await? else {
            debug!("approved queue empty");
            return Ok(TickOutcome::Idle);
        };

        info!(
            item_id = %item.id,
            headline = %item.headline,
            attempt = item.retry_count + 1,
            "streaming item"
        );
        self.emit(Event::Streaming {
            id: item.id,
            headline: item.headline.clone(),
        });

        match self.render(&item).await {
            Some(outcome) => self.resolve(&item, outcome).await,
            None => {
                self.db.release_claim(item.id).await?;
                warn!(
                    item_id = %item.id,
                    grace = ?self.schedule.shutdown_grace,
                    "render still running after shutdown grace, claim released"
                );
                self.emit(Event::Released { id: item.id });
                Ok(TickOutcome::Released(item.id))
            }
        }
    }

    /// Run the broadcaster under the render timeout
    ///
    /// Returns `None` when shutdown interrupted the render and the grace
    /// period ran out. The render future is dropped in that case.
    async fn render(&self, item: &NewsItem) -> Option<std::result::Result<(), RenderError>> {
        let timeout = self.schedule.render_timeout;
        let render = tokio::time::timeout(timeout, self.broadcaster.stream(item));
        tokio::pin!(render);

        let finished = tokio::select! {
            biased;
            result = &mut render => Some(result),
            _ = self.cancel.cancelled() => None,
        };

        let result = match finished {
            Some(result) => result,
            None => {
                info!(
                    item_id = %item.id,
                    grace = ?self.schedule.shutdown_grace,
                    "shutdown requested mid-render, waiting for it to finish"
                );
                tokio::time::timeout(self.schedule.shutdown_grace, &mut render)
                    .await
                    .ok()?
            }
        };

        Some(result.unwrap_or_else(|_| {
            Err(RenderError::transient(format!(
                "render timed out after {}s",
                timeout.as_secs_f64()
            )))
        }))
    }

    /// Record the render outcome in the store
    async fn resolve(
        &self,
        item: &NewsItem,
        outcome: std::result::Result<(), RenderError>,
    ) -> Result<TickOutcome> {
        match outcome {
            Ok(()) => {
                self.db
                    .transition(item.id, &[ItemState::Streaming], ItemState::Streamed)
                    .await?;
                info!(item_id = %item.id, "item streamed");
                self.emit(Event::Streamed { id: item.id });
                Ok(TickOutcome::Streamed(item.id))
            }
            Err(e) => {
                let after = self
                    .db
                    .record_render_failure(
                        item.id,
                        &e.message,
                        e.transient,
                        self.schedule.retry_ceiling,
                    )
                    .await?;

                if after.state == ItemState::Failed {
                    warn!(
                        item_id = %item.id,
                        retry_count = after.retry_count,
                        transient = e.transient,
                        error = %e,
                        "render failed, item marked failed"
                    );
                    self.emit(Event::Failed {
                        id: item.id,
                        retry_count: after.retry_count,
                        error: e.message,
                    });
                    Ok(TickOutcome::Failed(item.id))
                } else {
                    warn!(
                        item_id = %item.id,
                        retry_count = after.retry_count,
                        error = %e,
                        "render failed, item requeued"
                    );
                    self.emit(Event::Requeued {
                        id: item.id,
                        retry_count: after.retry_count,
                        error: e.message,
                    });
                    Ok(TickOutcome::Requeued(item.id))
                }
            }
        }
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}
