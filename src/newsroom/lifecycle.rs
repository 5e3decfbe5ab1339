//! Startup and shutdown coordination.

use crate::error::{Error, Result};
use crate::types::Event;
use std::time::Duration;

use super::Newsroom;

/// Extra time allowed for the loops to exit after the render grace period
const SHUTDOWN_SLACK: Duration = Duration::from_secs(5);

impl Newsroom {
    /// Recover from the previous run and start both loops
    ///
    /// Startup sequence:
    /// 1. Detect an unclean previous shutdown
    /// 2. Move every `streaming` item back to `approved` (a render cannot be
    ///    in flight before the scheduler runs, so these are crash leftovers)
    /// 3. Mark this run as started
    /// 4. Spawn the ingestion producer and the broadcast scheduler
    ///
    /// # Errors
    ///
    /// Returns an error if recovery fails, or if called after shutdown.
    pub async fn start(&self) -> Result<()> {
        // Held until both loops are spawned, so concurrent callers cannot
        // both recover and both start a scheduler
        let mut handles = self.tasks.handles.lock().await;

        if self.tasks.shutdown.is_cancelled() {
            return Err(Error::ShuttingDown);
        }
        if !handles.is_empty() {
            tracing::warn!("Newsroom already started");
            return Ok(());
        }

        // 1. Detect unclean shutdown
        if self.db.was_unclean_shutdown().await? {
            tracing::warn!("Previous run did not shut down cleanly");
        }

        // 2. Crash recovery
        let recovered = self.db.recover_streaming().await?;
        if !recovered.is_empty() {
            tracing::warn!(
                count = recovered.len(),
                "Returned interrupted items to the approved queue"
            );
        }
        for id in recovered {
            tracing::info!(item_id = %id, "Recovered interrupted item");
            self.emit_event(Event::Recovered { id });
        }

        // 3. Mark that we're running (for unclean shutdown detection)
        self.db.set_clean_start().await?;

        // 4. Background loops
        handles.extend(self.start_ingestion());
        handles.push(self.start_broadcast_scheduler());

        Ok(())
    }

    /// Gracefully shut down the newsroom
    ///
    /// Shutdown sequence:
    /// 1. Cancel both loops; nothing new is fetched or claimed
    /// 2. Wait for the loops to exit. An in-flight render gets
    ///    `schedule.shutdown_grace`, after which the scheduler releases its claim
    /// 3. Mark clean shutdown in the database
    /// 4. Emit the shutdown event
    ///
    /// Safe to call more than once.
    ///
    /// # Errors
    ///
    /// Returns an error only if the clean-shutdown marker cannot be written.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        // 1. Stop both loops
        self.tasks.shutdown.cancel();
        tracing::info!("Signaled shutdown to background loops");

        // 2. Wait for the loops to exit
        let handles: Vec<_> = std::mem::take(&mut *self.tasks.handles.lock().await);
        let abort_handles: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();
        let wait = self.config.schedule.shutdown_grace + SHUTDOWN_SLACK;

        match tokio::time::timeout(wait, futures::future::join_all(handles)).await {
            Ok(results) => {
                for result in results {
                    if let Err(e) = result {
                        tracing::warn!(error = %e, "Background loop panicked");
                    }
                }
                tracing::info!("Background loops stopped");
            }
            Err(_) => {
                tracing::warn!("Timeout waiting for background loops, aborting them");
                for handle in abort_handles {
                    handle.abort();
                }
            }
        }

        // 3. Mark clean shutdown in database
        self.db.set_clean_shutdown().await?;
        tracing::info!("Marked clean shutdown in database");

        // 4. Emit shutdown event
        self.emit_event(Event::Shutdown);

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }
}
