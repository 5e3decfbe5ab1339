//! Ingestion producer: periodic fetch, dedup, summarize, insert
//!
//! Runs one cycle every `fetch_interval_minutes`, the first immediately. A
//! cycle walks every feed in turn and every candidate in feed order, so at
//! most one summarizer call is outstanding at a time.
//!
//! Feed and summarizer failures are logged and skipped. Only a store failure
//! ends the loop.

use crate::config::IngestConfig;
use crate::db::{Database, NewItem};
use crate::dedup::dedup_key;
use crate::error::{Error, ItemError, Result};
use crate::feed::{Candidate, SourceFeed};
use crate::summarizer::Summarizer;
use crate::types::Event;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Counters for one ingestion cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Candidates returned by all feeds
    pub fetched: usize,
    /// New pending items
    pub inserted: usize,
    /// Candidates whose dedup key was already known
    pub duplicates: usize,
    /// Candidates dropped because summarization failed or timed out
    pub failed: usize,
    /// Feeds that could not be fetched this cycle
    pub feed_errors: usize,
}

/// Periodic producer of pending items
pub struct IngestionProducer {
    db: Arc<Database>,
    feeds: Vec<Arc<dyn SourceFeed>>,
    summarizer: Arc<dyn Summarizer>,
    event_tx: broadcast::Sender<Event>,
    config: IngestConfig,
    cancel: CancellationToken,
}

/// What happened to a single candidate
enum Ingested {
    Inserted,
    Duplicate,
    SummarizeFailed,
}

impl IngestionProducer {
    /// Create a producer
    pub fn new(
        db: Arc<Database>,
        feeds: Vec<Arc<dyn SourceFeed>>,
        summarizer: Arc<dyn Summarizer>,
        event_tx: broadcast::Sender<Event>,
        config: IngestConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            db,
            feeds,
            summarizer,
            event_tx,
            config,
            cancel,
        }
    }

    /// Run cycles until cancelled
    ///
    /// Returns `Err` if the store fails.
    pub async fn run(self) -> Result<()> {
        let cadence = self.config.fetch_interval();
        info!(
            feeds = self.feeds.len(),
            summarizer = self.summarizer.name(),
            fetch_interval_minutes = self.config.fetch_interval_minutes,
            "ingestion producer started"
        );

        let mut interval = tokio::time::interval(cadence);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = interval.tick() => {
                    self.run_cycle().await?;
                }
            }
        }

        info!("ingestion producer stopped");
        Ok(())
    }

    /// Fetch every feed once and ingest what is new
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        for feed in &self.feeds {
            if self.cancel.is_cancelled() {
                break;
            }

            let candidates = match feed.fetch_candidates().await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(feed = feed.name(), error = %e, "feed fetch failed, skipping this cycle");
                    report.feed_errors += 1;
                    continue;
                }
            };

            debug!(feed = feed.name(), count = candidates.len(), "fetched candidates");
            report.fetched += candidates.len();

            for candidate in &candidates {
                if self.cancel.is_cancelled() {
                    debug!("shutdown requested, ending ingestion cycle early");
                    break;
                }

                match self.ingest(candidate).await? {
                    Ingested::Inserted => report.inserted += 1,
                    Ingested::Duplicate => report.duplicates += 1,
                    Ingested::SummarizeFailed => report.failed += 1,
                }
            }
        }

        info!(
            fetched = report.fetched,
            inserted = report.inserted,
            duplicates = report.duplicates,
            failed = report.failed,
            feed_errors = report.feed_errors,
            "ingestion cycle complete"
        );
        self.emit(Event::CycleComplete {
            fetched: report.fetched,
            inserted: report.inserted,
            duplicates: report.duplicates,
            failed: report.failed,
        });

        Ok(report)
    }

    async fn ingest(&self, candidate: &Candidate) -> Result<Ingested> {
        let key = dedup_key(&candidate.source_url, &candidate.title);

        if self.db.dedup_key_seen(&key).await? {
            debug!(url = %candidate.source_url, "already ingested");
            return Ok(Ingested::Duplicate);
        }

        let summarized = tokio::time::timeout(
            self.config.summarize_timeout,
            self.summarizer.summarize(&candidate.title, &candidate.content),
        )
        .await;

        let summary = match summarized {
            Ok(Ok(summary)) => summary,
            Ok(Err(e)) => {
                warn!(url = %candidate.source_url, error = %e, "summarization failed, skipping candidate");
                return Ok(Ingested::SummarizeFailed);
            }
            Err(_) => {
                warn!(
                    url = %candidate.source_url,
                    timeout = ?self.config.summarize_timeout,
                    "summarization timed out, skipping candidate"
                );
                return Ok(Ingested::SummarizeFailed);
            }
        };

        let item = NewItem {
            source_url: candidate.source_url.clone(),
            source_name: candidate.source_name.clone(),
            raw_title: candidate.title.clone(),
            raw_content: candidate.content.clone(),
            headline: summary.headline,
            summary: summary.summary,
            dedup_key: key,
        };

        match self.db.insert_item(&item).await {
            Ok(id) => {
                info!(item_id = %id, source = %item.source_name, headline = %item.headline, "item ingested");
                self.emit(Event::Ingested {
                    id,
                    headline: item.headline,
                    source: item.source_name,
                });
                Ok(Ingested::Inserted)
            }
            // Lost a race with another insert of the same story
            Err(Error::Item(ItemError::DuplicateKey { .. })) => Ok(Ingested::Duplicate),
            Err(e) => Err(e),
        }
    }

    fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}
