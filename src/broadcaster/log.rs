//! Broadcaster that only logs

use super::{Broadcaster, RenderError};
use crate::types::NewsItem;
use async_trait::async_trait;

/// Logs each item at `info` and reports success
///
/// Useful for running the pipeline without a video transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogBroadcaster;

impl LogBroadcaster {
    /// Create a new log broadcaster
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Broadcaster for LogBroadcaster {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn stream(&self, item: &NewsItem) -> Result<(), RenderError> {
        tracing::info!(
            item_id = %item.id,
            source = %item.source_name,
            headline = %item.headline,
            "on air"
        );
        Ok(())
    }
}
