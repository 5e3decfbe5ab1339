//! Extractive summarizer: the article's own first sentences

use super::{MAX_HEADLINE_CHARS, MAX_SUMMARY_CHARS, Summarizer, Summary};
use crate::error::Result;
use crate::feed::truncate_chars;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

/// Sentences taken from the start of the article
const SUMMARY_SENTENCES: usize = 2;

// Lead-ins that feeds put in front of the real text
static PREFIX_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(executive\s+summary|summary|overview|abstract|description|tl;?dr)\b\s*[:\-]?\s*")
        .ok()
});

/// Summarizer that needs no model
///
/// The headline is the original title. The summary is the first two
/// sentences of the content, or the title when the content is empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractiveSummarizer;

impl ExtractiveSummarizer {
    /// Create a new extractive summarizer
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Summarizer for ExtractiveSummarizer {
    fn name(&self) -> &'static str {
        "extractive"
    }

    async fn summarize(&self, title: &str, content: &str) -> Result<Summary> {
        let headline = truncate_chars(title.trim(), MAX_HEADLINE_CHARS);

        let body = strip_summary_prefix(content);
        let lead = first_sentences(&body, SUMMARY_SENTENCES);
        let summary = if lead.is_empty() {
            headline.clone()
        } else {
            truncate_chars(&lead, MAX_SUMMARY_CHARS)
        };

        Ok(Summary { headline, summary })
    }

    async fn is_available(&self) -> bool {
        true
    }
}

fn strip_summary_prefix(text: &str) -> String {
    match PREFIX_RE.as_ref() {
        Some(re) => re.replace(text, "").trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// First `count` sentences, each ending at `.`, `!` or `?` followed by
/// whitespace or end of text
fn first_sentences(text: &str, count: usize) -> String {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = chars.peek().is_none_or(|(_, next)| next.is_whitespace());
        if at_boundary {
            let end = i + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
            if sentences.len() == count {
                break;
            }
        }
    }

    if sentences.len() < count {
        let rest = text[start..].trim();
        if !rest.is_empty() {
            sentences.push(rest);
        }
    }

    let mut joined = sentences.join(" ");
    if !joined.is_empty() && !joined.ends_with(['.', '!', '?']) {
        joined.push('.');
    }
    joined
}
