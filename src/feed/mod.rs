//! News sources: the [`SourceFeed`] capability and its RSS/Atom implementation.
//!
//! A feed hands the ingestion producer a batch of [`Candidate`]s per cycle. It
//! does no deduplication of its own; the producer checks every candidate
//! against the item store.

use crate::config::{FeedConfig, RetryConfig};
use crate::error::{Error, Result};
use crate::retry::with_retry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

/// A story offered by a feed, before summarization
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    /// Feed display name
    pub source_name: String,
    /// Link to the original article
    pub source_url: String,
    /// Title as published
    pub title: String,
    /// Article description with markup removed
    pub content: String,
    /// Publication date, when the feed provides one
    pub published_at: Option<DateTime<Utc>>,
}

/// A source of news candidates
#[async_trait]
pub trait SourceFeed: Send + Sync {
    /// Display name, used in logs and stored on every item
    fn name(&self) -> &str;

    /// Fetch the current batch of candidates
    ///
    /// Errors skip this feed for one cycle; they never stop ingestion.
    async fn fetch_candidates(&self) -> Result<Vec<Candidate>>;
}

/// RSS 2.0 / Atom feed fetched over HTTP
pub struct RssSourceFeed {
    http_client: reqwest::Client,
    name: String,
    url: String,
    max_items: usize,
    max_content_chars: usize,
    retry: RetryConfig,
}

impl RssSourceFeed {
    /// Create a feed reader
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(
        feed: &FeedConfig,
        max_items: usize,
        max_content_chars: usize,
        retry: RetryConfig,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("newscast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            name: feed.name.clone(),
            url: feed.url.clone(),
            max_items,
            max_content_chars,
            retry,
        })
    }

    /// Fetch the feed body, failing on non-2xx responses
    async fn fetch_body(&self) -> Result<String> {
        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Fetch(format!("timeout fetching {}: {}", self.url, e))
                } else {
                    Error::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!(
                "HTTP {} from {}",
                status.as_u16(),
                self.url
            )));
        }

        Ok(response.text().await?)
    }

    /// Turn a feed document into candidates, RSS first with Atom as fallback
    pub fn parse(&self, content: &str) -> Result<Vec<Candidate>> {
        let entries = match parse_as_rss(content) {
            Ok(entries) => entries,
            Err(rss_err) => {
                debug!(feed = %self.name, error = %rss_err, "not RSS, trying Atom");
                parse_as_atom(content).map_err(|atom_err| {
                    Error::Fetch(format!(
                        "{} is neither RSS ({}) nor Atom ({})",
                        self.url, rss_err, atom_err
                    ))
                })?
            }
        };

        Ok(entries
            .into_iter()
            .take(self.max_items)
            .filter_map(|entry| {
                // Entries without a link cannot be deduplicated or attributed
                let link = entry.link.filter(|l| !l.trim().is_empty())?;
                let title = entry
                    .title
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| "Untitled".to_string());
                let content = clean_html(entry.description.as_deref().unwrap_or(""));

                Some(Candidate {
                    source_name: self.name.clone(),
                    source_url: link.trim().to_string(),
                    title: clean_html(&title),
                    content: truncate_chars(&content, self.max_content_chars),
                    published_at: entry.published_at,
                })
            })
            .collect())
    }
}

#[async_trait]
impl SourceFeed for RssSourceFeed {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_candidates(&self) -> Result<Vec<Candidate>> {
        debug!(feed = %self.name, url = %self.url, "fetching feed");
        let body = with_retry(&self.retry, || self.fetch_body()).await?;
        let candidates = self.parse(&body)?;
        debug!(feed = %self.name, count = candidates.len(), "parsed feed");
        Ok(candidates)
    }
}

/// Feed entry, independent of the syndication format
struct FeedEntry {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    published_at: Option<DateTime<Utc>>,
}

fn parse_as_rss(content: &str) -> Result<Vec<FeedEntry>> {
    let channel = content
        .parse::<rss::Channel>()
        .map_err(|e| Error::Fetch(format!("RSS parse error: {}", e)))?;

    Ok(channel
        .items()
        .iter()
        .map(|item| FeedEntry {
            title: item.title().map(str::to_string),
            link: item.link().map(str::to_string),
            description: item
                .description()
                .or_else(|| item.content())
                .map(str::to_string),
            published_at: item.pub_date().and_then(|date| {
                DateTime::parse_from_rfc2822(date)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            }),
        })
        .collect())
}

fn parse_as_atom(content: &str) -> Result<Vec<FeedEntry>> {
    let feed = atom_syndication::Feed::read_from(content.as_bytes())
        .map_err(|e| Error::Fetch(format!("Atom parse error: {}", e)))?;

    Ok(feed
        .entries()
        .iter()
        .map(|entry| {
            // Prefer the alternate link, as that is the article itself
            let link = entry
                .links()
                .iter()
                .find(|link| link.rel() == "alternate")
                .or_else(|| entry.links().first())
                .map(|link| link.href().to_string());

            let description = entry.summary().map(|s| s.as_str().to_string()).or_else(|| {
                entry
                    .content()
                    .and_then(|c| c.value().map(|v| v.to_string()))
            });

            FeedEntry {
                title: Some(entry.title().as_str().to_string()),
                link,
                description,
                published_at: entry
                    .published()
                    .or_else(|| Some(entry.updated()))
                    .and_then(|dt| {
                        DateTime::parse_from_rfc3339(&dt.to_rfc3339())
                            .ok()
                            .map(|dt| dt.with_timezone(&Utc))
                    }),
            }
        })
        .collect())
}

static TAG_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<[^>]*>").ok());
static NUMERIC_ENTITY_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").ok());

/// Strip markup, decode common entities and collapse whitespace
pub fn clean_html(text: &str) -> String {
    let without_tags = match TAG_RE.as_ref() {
        Some(re) => re.replace_all(text, " ").into_owned(),
        None => text.to_string(),
    };

    let decoded = match NUMERIC_ENTITY_RE.as_ref() {
        Some(re) => re
            .replace_all(&without_tags, |caps: &regex::Captures<'_>| {
                let code = &caps[1];
                let parsed = match code.strip_prefix('x') {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => code.parse::<u32>().ok(),
                };
                parsed
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_default()
            })
            .into_owned(),
        None => without_tags,
    };

    let decoded = decoded
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&rsquo;", "'")
        .replace("&lsquo;", "'")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&hellip;", "...")
        // Last, so "&amp;lt;" decodes to "&lt;" and not "<"
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max` characters without splitting a code point
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
