//! Shared test helpers for creating Newsroom instances in tests.

use crate::broadcaster::{Broadcaster, RenderError};
use crate::config::Config;
use crate::db::NewItem;
use crate::dedup::dedup_key;
use crate::error::Result;
use crate::feed::{Candidate, SourceFeed};
use crate::newsroom::{Collaborators, Newsroom};
use crate::summarizer::{Summarizer, Summary};
use crate::types::{ItemId, ItemState, NewsItem};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

/// Feed that returns the same candidates every cycle
pub(crate) struct StaticFeed(pub(crate) Vec<Candidate>);

#[async_trait]
impl SourceFeed for StaticFeed {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_candidates(&self) -> Result<Vec<Candidate>> {
        Ok(self.0.clone())
    }
}

/// Summarizer that upper-cases the title and echoes the content
pub(crate) struct EchoSummarizer {
    pub(crate) available: bool,
}

#[async_trait]
impl Summarizer for EchoSummarizer {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn summarize(&self, title: &str, content: &str) -> Result<Summary> {
        Ok(Summary {
            headline: title.to_uppercase(),
            summary: content.to_string(),
        })
    }

    async fn is_available(&self) -> bool {
        self.available
    }
}

/// Broadcaster that records every streamed item id
#[derive(Default)]
pub(crate) struct RecordingBroadcaster {
    pub(crate) streamed: Mutex<Vec<ItemId>>,
    pub(crate) delay: Duration,
}

#[async_trait]
impl Broadcaster for RecordingBroadcaster {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn stream(&self, item: &NewsItem) -> std::result::Result<(), RenderError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.streamed.lock().unwrap().push(item.id);
        Ok(())
    }
}

/// Candidate for `slug` on a fixed example site
pub(crate) fn candidate(slug: &str) -> Candidate {
    Candidate {
        source_name: "Example News".to_string(),
        source_url: format!("https://news.example.com/{slug}"),
        title: format!("Story {slug}"),
        content: format!("Full text of {slug}."),
        published_at: None,
    }
}

/// Config pointing at a database inside `dir`, with fast test cadences
pub(crate) fn test_config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.persistence.database_path = dir.join("test.db");
    config.ingest.feeds = vec![];
    config.schedule.display_seconds = 1;
    config.schedule.shutdown_grace = Duration::from_millis(200);
    config
}

/// Helper to create a test Newsroom with the given collaborators.
/// Returns the newsroom and the tempdir (which must be kept alive).
pub(crate) async fn create_test_newsroom_with(
    collaborators: Collaborators,
) -> (Newsroom, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let config = test_config(temp_dir.path());
    let newsroom = Newsroom::with_collaborators(config, collaborators)
        .await
        .unwrap();
    (newsroom, temp_dir)
}

/// Helper to create a test Newsroom with no feeds and in-memory collaborators.
pub(crate) async fn create_test_newsroom() -> (Newsroom, tempfile::TempDir) {
    create_test_newsroom_with(Collaborators {
        feeds: vec![],
        summarizer: Arc::new(EchoSummarizer { available: true }),
        broadcaster: Arc::new(RecordingBroadcaster::default()),
    })
    .await
}

/// Insert a pending item directly into the store
pub(crate) async fn insert_pending(newsroom: &Newsroom, slug: &str) -> ItemId {
    let c = candidate(slug);
    newsroom
        .db
        .insert_item(&NewItem {
            dedup_key: dedup_key(&c.source_url, &c.title),
            source_url: c.source_url,
            source_name: c.source_name,
            raw_title: c.title.clone(),
            raw_content: c.content,
            headline: c.title,
            summary: format!("Summary of {slug}."),
        })
        .await
        .unwrap()
}

/// Insert an item and force it into `state` through legal transitions
pub(crate) async fn insert_in_state(newsroom: &Newsroom, slug: &str, state: ItemState) -> ItemId {
    let id = insert_pending(newsroom, slug).await;
    let db = &newsroom.db;
    match state {
        ItemState::Pending => {}
        ItemState::Rejected => {
            db.transition(id, &[ItemState::Pending], ItemState::Rejected)
                .await
                .unwrap();
        }
        ItemState::Approved | ItemState::Streaming | ItemState::Streamed | ItemState::Failed => {
            db.transition(id, &[ItemState::Pending], ItemState::Approved)
                .await
                .unwrap();
            if state != ItemState::Approved {
                db.transition(id, &[ItemState::Approved], ItemState::Streaming)
                    .await
                    .unwrap();
            }
            if matches!(state, ItemState::Streamed | ItemState::Failed) {
                db.transition(id, &[ItemState::Streaming], state)
                    .await
                    .unwrap();
            }
        }
    }
    id
}
