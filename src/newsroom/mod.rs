//! The newsroom: wires the item store, the two loops and the review gate together.
//!
//! The `Newsroom` struct and its methods are organized by domain:
//! - [`services`] - Spawning the ingestion producer and broadcast scheduler
//! - [`lifecycle`] - Startup recovery and graceful shutdown

mod lifecycle;
mod services;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::broadcaster::{self, Broadcaster};
use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::feed::{RssSourceFeed, SourceFeed};
use crate::review::ReviewGate;
use crate::summarizer::{self, Summarizer};
use crate::types::Event;
use std::sync::{Arc, OnceLock};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Pluggable collaborators of the two loops
#[derive(Clone)]
pub struct Collaborators {
    /// News sources polled by the ingestion producer
    pub feeds: Vec<Arc<dyn SourceFeed>>,
    /// Turns a raw article into headline and summary
    pub summarizer: Arc<dyn Summarizer>,
    /// Output for approved items
    pub broadcaster: Arc<dyn Broadcaster>,
}

impl Collaborators {
    /// Build the collaborators described by the configuration
    ///
    /// Disabled feeds are skipped.
    ///
    /// # Errors
    /// Returns error if a backend cannot be constructed (missing broadcast
    /// command, HTTP client failure)
    pub fn from_config(config: &Config) -> Result<Self> {
        let ingest = &config.ingest;
        let mut feeds: Vec<Arc<dyn SourceFeed>> = Vec::with_capacity(ingest.feeds.len());
        for feed in ingest.feeds.iter().filter(|f| f.enabled) {
            feeds.push(Arc::new(RssSourceFeed::new(
                feed,
                ingest.max_items_per_feed,
                ingest.max_content_chars,
                ingest.retry.clone(),
            )?));
        }

        Ok(Self {
            feeds,
            summarizer: summarizer::from_config(&config.summarizer)?,
            broadcaster: broadcaster::from_config(&config.broadcaster)?,
        })
    }
}

/// Background task bookkeeping
#[derive(Clone)]
pub(crate) struct TaskState {
    /// Cancelled on shutdown; both loops stop claiming new work
    pub(crate) shutdown: CancellationToken,
    /// Cancelled when a loop dies on a store failure
    pub(crate) fault: CancellationToken,
    /// Description of the first fault
    pub(crate) fault_reason: Arc<OnceLock<String>>,
    /// Handles of the spawned loops, drained on shutdown
    pub(crate) handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

/// Main newscast instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Newsroom {
    /// Item store, shared by both loops and the review gate
    /// Public for integration tests to inspect item state
    pub db: Arc<Database>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Feeds, summarizer and broadcaster
    pub(crate) collaborators: Collaborators,
    /// Operator commands
    pub(crate) review: ReviewGate,
    /// Loop handles and cancellation
    pub(crate) tasks: TaskState,
}

impl Newsroom {
    /// Create a newsroom with the collaborators described by `config`
    ///
    /// Opens (or creates) the database and runs migrations. Loops are not
    /// started until [`start`](Self::start) is called.
    pub async fn new(config: Config) -> Result<Self> {
        let collaborators = Collaborators::from_config(&config)?;
        Self::with_collaborators(config, collaborators).await
    }

    /// Create a newsroom with explicit collaborators
    ///
    /// Used by embedders with their own feed or output, and by tests.
    pub async fn with_collaborators(config: Config, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;

        let db = Arc::new(Database::new(&config.persistence.database_path).await?);

        // Create broadcast channel with buffer size of 1000 events
        let (event_tx, _rx) = broadcast::channel(1000);

        tracing::info!(
            feeds = collaborators.feeds.len(),
            summarizer = collaborators.summarizer.name(),
            broadcaster = collaborators.broadcaster.name(),
            "Newsroom initialized"
        );

        Ok(Self {
            review: ReviewGate::new(db.clone(), event_tx.clone()),
            db,
            event_tx,
            config: Arc::new(config),
            collaborators,
            tasks: TaskState {
                shutdown: CancellationToken::new(),
                fault: CancellationToken::new(),
                fault_reason: Arc::new(OnceLock::new()),
                handles: Arc::new(Mutex::new(Vec::new())),
            },
        })
    }

    /// Subscribe to pipeline events
    ///
    /// Each subscriber receives all events independently. A subscriber that
    /// falls more than 1000 events behind gets `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Operator commands: approve, reject, edit, list
    pub fn review(&self) -> &ReviewGate {
        &self.review
    }

    /// Whether the summarizer backend is reachable
    pub async fn summarizer_available(&self) -> bool {
        self.collaborators.summarizer.is_available().await
    }

    /// Name of the configured summarizer backend
    pub fn summarizer_name(&self) -> &'static str {
        self.collaborators.summarizer.name()
    }

    /// Name of the configured broadcaster backend
    pub fn broadcaster_name(&self) -> &'static str {
        self.collaborators.broadcaster.name()
    }

    /// Emit an event to all subscribers
    ///
    /// Dropped silently when nobody is listening.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Spawn the REST API server in a background task
    pub fn spawn_api_server(self: &Arc<Self>) -> JoinHandle<Result<()>> {
        let newsroom = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(newsroom, config).await })
    }
}
