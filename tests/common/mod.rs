//! Common test utilities for newscast integration tests
//!
//! Scripted collaborators that let a test decide what every feed fetch,
//! summarizer call and render returns.

#![allow(dead_code)]

use async_trait::async_trait;
use newscast::config::Config;
use newscast::{
    Broadcaster, Candidate, Collaborators, Error, Event, NewsItem, Newsroom, RenderError, Result,
    SourceFeed, Summarizer, Summary,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// Feed whose candidates can be replaced between cycles
#[derive(Clone, Default)]
pub struct MockFeed {
    candidates: Arc<Mutex<Vec<Candidate>>>,
}

impl MockFeed {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates: Arc::new(Mutex::new(candidates)),
        }
    }

    pub fn set(&self, candidates: Vec<Candidate>) {
        *self.candidates.lock().unwrap() = candidates;
    }
}

#[async_trait]
impl SourceFeed for MockFeed {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_candidates(&self) -> Result<Vec<Candidate>> {
        Ok(self.candidates.lock().unwrap().clone())
    }
}

/// Summarizer that prefixes the title, or fails for titles it was told to
#[derive(Clone, Default)]
pub struct MockSummarizer {
    failing_titles: Arc<Mutex<Vec<String>>>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockSummarizer {
    pub fn fail_with(self, title: &str) -> Self {
        self.failing_titles.lock().unwrap().push(title.to_string());
        self
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn summarize(&self, title: &str, content: &str) -> Result<Summary> {
        self.calls.lock().unwrap().push(title.to_string());
        if self.failing_titles.lock().unwrap().iter().any(|t| t == title) {
            return Err(Error::Summarize(format!("model refused '{title}'")));
        }
        Ok(Summary {
            headline: format!("BREAKING: {title}"),
            summary: content.to_string(),
        })
    }

    async fn is_available(&self) -> bool {
        true
    }
}

/// One render as seen by the broadcaster
#[derive(Clone, Debug)]
pub struct RenderCall {
    pub title: String,
    pub started: Instant,
    pub finished: Instant,
}

/// Broadcaster with per-title scripted outcomes
///
/// Titles without a script (or with an exhausted one) render successfully.
#[derive(Clone, Default)]
pub struct MockBroadcaster {
    scripts: Arc<Mutex<HashMap<String, VecDeque<std::result::Result<(), RenderError>>>>>,
    delay: Duration,
    pub calls: Arc<Mutex<Vec<RenderCall>>>,
}

impl MockBroadcaster {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn script(self, title: &str, outcomes: Vec<std::result::Result<(), RenderError>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(title.to_string(), outcomes.into());
        self
    }

    pub fn rendered_titles(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.title.clone())
            .collect()
    }
}

#[async_trait]
impl Broadcaster for MockBroadcaster {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn stream(&self, item: &NewsItem) -> std::result::Result<(), RenderError> {
        let started = Instant::now();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.calls.lock().unwrap().push(RenderCall {
            title: item.raw_title.clone(),
            started,
            finished: Instant::now(),
        });

        self.scripts
            .lock()
            .unwrap()
            .get_mut(&item.raw_title)
            .and_then(|outcomes| outcomes.pop_front())
            .unwrap_or(Ok(()))
    }
}

/// Candidate titled `title` at `url`
pub fn candidate(url: &str, title: &str) -> Candidate {
    Candidate {
        source_name: "Wire".to_string(),
        source_url: url.to_string(),
        title: title.to_string(),
        content: format!("{title}. More details follow."),
        published_at: None,
    }
}

/// Config with a database inside `dir`, no configured feeds and fast cadences
pub fn test_config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.persistence.database_path = dir.join("newscast.db");
    config.ingest.feeds = vec![];
    config.schedule.display_seconds = 1;
    config.schedule.shutdown_grace = Duration::from_millis(200);
    config
}

/// Newsroom over `dir` with the given mocks
pub async fn create_newsroom(
    dir: &std::path::Path,
    feeds: Vec<Arc<dyn SourceFeed>>,
    broadcaster: MockBroadcaster,
) -> Newsroom {
    Newsroom::with_collaborators(
        test_config(dir),
        Collaborators {
            feeds,
            summarizer: Arc::new(MockSummarizer::default()),
            broadcaster: Arc::new(broadcaster),
        },
    )
    .await
    .unwrap()
}

/// Wait up to `timeout` for an event matching `pred`
pub async fn wait_for_event<F>(
    events: &mut broadcast::Receiver<Event>,
    timeout: Duration,
    mut pred: F,
) -> Option<Event>
where
    F: FnMut(&Event) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(event) if pred(&event) => return Some(event),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .await
    .ok()
    .flatten()
}
