//! Background loop starters: ingestion producer and broadcast scheduler.

use crate::broadcast_scheduler::BroadcastScheduler;
use crate::error::Result;
use crate::ingestion::IngestionProducer;
use crate::types::Event;
use std::future::Future;
use tokio::task::JoinHandle;

use super::Newsroom;

impl Newsroom {
    /// Start the ingestion producer background task
    ///
    /// Returns `None` when no feeds are configured.
    pub(crate) fn start_ingestion(&self) -> Option<JoinHandle<()>> {
        if self.collaborators.feeds.is_empty() {
            tracing::info!("No feeds configured, skipping ingestion producer");
            return None;
        }

        let producer = IngestionProducer::new(
            self.db.clone(),
            self.collaborators.feeds.clone(),
            self.collaborators.summarizer.clone(),
            self.event_tx.clone(),
            self.config.ingest.clone(),
            self.tasks.shutdown.child_token(),
        );

        let handle = self.spawn_loop("ingestion", producer.run());
        tracing::info!("Ingestion producer background task started");
        Some(handle)
    }

    /// Start the broadcast scheduler background task
    pub(crate) fn start_broadcast_scheduler(&self) -> JoinHandle<()> {
        let scheduler = BroadcastScheduler::new(
            self.db.clone(),
            self.collaborators.broadcaster.clone(),
            self.event_tx.clone(),
            self.config.schedule.clone(),
            self.tasks.shutdown.child_token(),
        );

        let handle = self.spawn_loop("broadcast", scheduler.run());
        tracing::info!("Broadcast scheduler background task started");
        handle
    }

    /// Spawn a loop
    ///
    /// A loop that returns `Err` has hit a store failure. The fault is
    /// announced as an event and trips the fault token, which makes
    /// [`crate::run_with_shutdown`] shut the newsroom down and report it.
    fn spawn_loop<F>(&self, component: &'static str, body: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let newsroom = self.clone();
        tokio::spawn(async move {
            if let Err(e) = body.await {
                tracing::error!(component, error = %e, "background loop failed");
                newsroom.record_fault(component, &e.to_string());
            }
        })
    }

    /// Announce a fault and trip the fault token
    ///
    /// Only the first fault is kept as the reason.
    pub(crate) fn record_fault(&self, component: &str, error: &str) {
        self.tasks
            .fault_reason
            .set(format!("{} loop failed: {}", component, error))
            .ok();
        self.emit_event(Event::Fault {
            component: component.to_string(),
            error: error.to_string(),
        });
        self.tasks.fault.cancel();
    }

    /// Wait until a background loop fails, returning the reason
    pub async fn wait_for_fault(&self) -> String {
        self.tasks.fault.cancelled().await;
        self.tasks
            .fault_reason
            .get()
            .cloned()
            .unwrap_or_else(|| "background loop failed".to_string())
    }
}
