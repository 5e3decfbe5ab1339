//! Summarization: turn a raw article into a broadcast headline and summary
//!
//! The [`Summarizer`] trait is the seam between ingestion and whatever model
//! produces the text. Two implementations ship with the crate:
//!
//! - [`OllamaSummarizer`]: a local LLM via the Ollama HTTP API
//! - [`ExtractiveSummarizer`]: first sentences of the article, no model needed
//!
//! [`FallbackSummarizer`] chains the two so a model outage degrades output
//! quality instead of stalling ingestion.

mod extractive;
mod ollama;

pub use extractive::ExtractiveSummarizer;
pub use ollama::OllamaSummarizer;

use crate::config::{SummarizerBackend, SummarizerConfig};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Longest headline stored for an item, in characters
pub const MAX_HEADLINE_CHARS: usize = 100;

/// Longest summary stored for an item, in characters
pub const MAX_SUMMARY_CHARS: usize = 500;

/// Generated broadcast text for one article
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    /// Short headline
    pub headline: String,
    /// Two or three sentence summary
    pub summary: String,
}

/// Trait for summarization backends
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Human-readable name for logging
    fn name(&self) -> &'static str;

    /// Produce a headline and summary for an article
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Summarize`] or a network error when no usable
    /// text could be produced. The caller skips the candidate.
    async fn summarize(&self, title: &str, content: &str) -> Result<Summary>;

    /// Whether the backend can currently serve requests
    async fn is_available(&self) -> bool;
}

/// Tries `primary`, then `fallback` when the primary fails
pub struct FallbackSummarizer {
    primary: Arc<dyn Summarizer>,
    fallback: Arc<dyn Summarizer>,
}

impl FallbackSummarizer {
    /// Chain two summarizers
    pub fn new(primary: Arc<dyn Summarizer>, fallback: Arc<dyn Summarizer>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl Summarizer for FallbackSummarizer {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn summarize(&self, title: &str, content: &str) -> Result<Summary> {
        match self.primary.summarize(title, content).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                tracing::warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %e,
                    "summarizer failed, using fallback"
                );
                self.fallback.summarize(title, content).await
            }
        }
    }

    async fn is_available(&self) -> bool {
        self.primary.is_available().await || self.fallback.is_available().await
    }
}

/// Build the summarizer described by the configuration
///
/// # Errors
/// Returns error if the HTTP client for the Ollama backend cannot be created
pub fn from_config(config: &SummarizerConfig) -> Result<Arc<dyn Summarizer>> {
    match config.backend {
        SummarizerBackend::Extractive => Ok(Arc::new(ExtractiveSummarizer::new())),
        SummarizerBackend::Ollama => {
            let ollama: Arc<dyn Summarizer> = Arc::new(OllamaSummarizer::new(config)?);
            if config.fallback_extractive {
                Ok(Arc::new(FallbackSummarizer::new(
                    ollama,
                    Arc::new(ExtractiveSummarizer::new()),
                )))
            } else {
                Ok(ollama)
            }
        }
    }
}
