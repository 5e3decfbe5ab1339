//! # newscast
//!
//! News item lifecycle and streaming scheduler for a live news ticker.
//!
//! Stories flow through a small state machine persisted in SQLite:
//!
//! ```text
//! pending ──approve──▶ approved ──claim──▶ streaming ──▶ streamed
//!    │                    ▲                    │
//!    └──reject──▶ rejected └────requeue────────┴──▶ failed
//! ```
//!
//! - The **ingestion producer** polls feeds, drops stories it has seen
//!   before, summarizes the rest and stores them as `pending`.
//! - The **review gate** lets an operator approve, reject or edit items.
//! - The **broadcast scheduler** claims one approved item per tick, oldest
//!   approval first, and hands it to the broadcaster.
//!
//! The two loops never talk to each other; they coordinate only through the
//! item store.
//!
//! ## Quick Start
//!
//! ```no_run
//! use newscast::{Config, Newsroom, run_with_shutdown};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let newsroom = Newsroom::new(Config::default()).await?;
//!
//!     // Follow the pipeline
//!     let mut events = newsroom.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     // Start both loops, stop on SIGTERM/SIGINT
//!     run_with_shutdown(newsroom).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Broadcast scheduler loop
pub mod broadcast_scheduler;
/// Broadcast outputs
pub mod broadcaster;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Story fingerprints for deduplication
pub mod dedup;
/// Error types
pub mod error;
/// News sources
pub mod feed;
/// Ingestion producer loop
pub mod ingestion;
/// Newsroom orchestration (decomposed into focused submodules)
pub mod newsroom;
/// Retry logic with exponential backoff
pub mod retry;
/// Operator review commands
pub mod review;
/// Headline and summary generation
pub mod summarizer;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use broadcast_scheduler::{BroadcastScheduler, TickOutcome};
pub use broadcaster::{Broadcaster, RenderError};
pub use config::Config;
pub use db::Database;
pub use error::{ApiError, DatabaseError, Error, ErrorDetail, ItemError, Result, ToHttpStatus};
pub use feed::{Candidate, SourceFeed};
pub use ingestion::{CycleReport, IngestionProducer};
pub use newsroom::{Collaborators, Newsroom};
pub use review::ReviewGate;
pub use summarizer::{Summarizer, Summary};
pub use types::{Event, ItemId, ItemState, NewsItem, StateCounts};

/// Run the newsroom until a termination signal or a loop failure.
///
/// Starts both loops, then waits for whichever comes first:
/// - a termination signal: graceful shutdown, returns `Ok`
/// - a store failure in either loop: graceful shutdown, returns the failure
///   as `Err` so the process exits non-zero and a supervisor can restart it
///
/// Signals:
/// - **Unix:** SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(newsroom: Newsroom) -> Result<()> {
    run_until(&newsroom, wait_for_signal()).await
}

/// Like [`run_with_shutdown`], with a caller-provided stop condition.
pub async fn run_until<F>(newsroom: &Newsroom, stop: F) -> Result<()>
where
    F: std::future::Future<Output = ()>,
{
    newsroom.start().await?;

    tokio::select! {
        _ = stop => newsroom.shutdown().await,
        reason = newsroom.wait_for_fault() => {
            tracing::error!(reason = %reason, "Shutting down after background failure");
            if let Err(e) = newsroom.shutdown().await {
                tracing::error!(error = %e, "Error during shutdown after failure");
            }
            Err(Error::Other(reason))
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM signal"),
                _ = sigint.recv() => tracing::info!("Received SIGINT signal (Ctrl+C)"),
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C signal"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C signal"),
    }
}
