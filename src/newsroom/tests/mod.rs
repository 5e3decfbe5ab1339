use super::test_helpers::*;
use super::*;
use crate::error::Error;
use crate::types::{ItemId, ItemState};
use std::time::Duration;


/// Poll `check` every 20ms until it holds or 5s pass
async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

async fn state_of(newsroom: &Newsroom, id: ItemId) -> ItemState {
    newsroom.db.get_item(id).await.unwrap().unwrap().state
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.schedule.display_seconds = 0;

    let result = Newsroom::with_collaborators(
        config,
        Collaborators {
            feeds: vec![],
            summarizer: Arc::new(EchoSummarizer { available: true }),
            broadcaster: Arc::new(RecordingBroadcaster::default()),
        },
    )
    .await;

    assert!(matches!(result, Err(Error::Config { .. })));
}

#[tokio::test]
async fn collaborators_from_default_config() {
    let collaborators = Collaborators::from_config(&Config::default()).unwrap();
    assert_eq!(collaborators.feeds.len(), Config::default().ingest.feeds.len());
    assert_eq!(collaborators.summarizer.name(), "ollama");
    assert_eq!(collaborators.broadcaster.name(), "log");
}

#[tokio::test]
async fn disabled_feeds_are_skipped() {
    let mut config = Config::default();
    for feed in config.ingest.feeds.iter_mut().skip(1) {
        feed.enabled = false;
    }
    let collaborators = Collaborators::from_config(&config).unwrap();
    assert_eq!(collaborators.feeds.len(), 1);
}

#[tokio::test]
async fn review_gate_shares_the_event_bus() {
    let (newsroom, _dir) = create_test_newsroom().await;
    let mut events = newsroom.subscribe();
    let id = insert_pending(&newsroom, "a").await;

    newsroom.review().approve(id).await.unwrap();
    assert_eq!(events.recv().await.unwrap(), Event::Approved { id });
}

#[tokio::test]
async fn summarizer_availability_is_reported() {
    let (newsroom, _dir) = create_test_newsroom_with(Collaborators {
        feeds: vec![],
        summarizer: Arc::new(EchoSummarizer { available: false }),
        broadcaster: Arc::new(RecordingBroadcaster::default()),
    })
    .await;

    assert!(!newsroom.summarizer_available().await);
    assert_eq!(newsroom.summarizer_name(), "echo");
    assert_eq!(newsroom.broadcaster_name(), "recording");
}
