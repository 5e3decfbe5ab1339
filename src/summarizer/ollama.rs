//! Ollama-backed summarizer
//!
//! Sends one non-streaming `/api/generate` request per article and reads the
//! `HEADLINE:` and `SUMMARY:` lines out of the model's reply.

use super::{MAX_HEADLINE_CHARS, MAX_SUMMARY_CHARS, Summarizer, Summary};
use crate::config::SummarizerConfig;
use crate::error::{Error, Result};
use crate::feed::truncate_chars;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROMPT_TEMPLATE: &str = "\
You write copy for a live news ticker covering information security.
Read the article below and reply with exactly two labelled lines:

HEADLINE: a punchy headline of at most 80 characters
SUMMARY: two or three plain sentences stating what happened and why it matters to defenders

Do not add any other text.

Title: {title}

Article: {content}
";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Summarizer backed by a local Ollama server
pub struct OllamaSummarizer {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OllamaSummarizer {
    /// Create a summarizer for the configured endpoint and model
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: &SummarizerConfig) -> Result<Self> {
        // The ingestion producer bounds each call with its own timeout
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn prompt(title: &str, content: &str) -> String {
        PROMPT_TEMPLATE
            .replace("{title}", title)
            .replace("{content}", content)
    }
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn summarize(&self, title: &str, content: &str) -> Result<Summary> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: Self::prompt(title, content),
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.endpoint))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Summarize(format!(
                "ollama returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: GenerateResponse = response.json().await?;
        parse_response(&body.response, title)
    }

    async fn is_available(&self) -> bool {
        let result = self
            .http_client
            .get(format!("{}/api/tags", self.endpoint))
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        match result {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(endpoint = %self.endpoint, error = %e, "ollama not reachable");
                false
            }
        }
    }
}

/// Extract headline and summary from the model's reply
///
/// Labels are matched case-insensitively at the start of a line. Lines after
/// `SUMMARY:` are joined into the summary. Without a headline the original
/// title is used; without a summary the whole reply is.
pub(crate) fn parse_response(text: &str, original_title: &str) -> Result<Summary> {
    let mut headline: Option<String> = None;
    let mut summary_lines: Vec<&str> = Vec::new();
    let mut in_summary = false;

    for line in text.lines().map(str::trim) {
        if let Some(rest) = strip_label(line, "HEADLINE:") {
            headline = Some(rest.to_string());
            in_summary = false;
        } else if let Some(rest) = strip_label(line, "SUMMARY:") {
            in_summary = true;
            if !rest.is_empty() {
                summary_lines.push(rest);
            }
        } else if in_summary && !line.is_empty() {
            summary_lines.push(line);
        }
    }

    let headline = headline
        .map(|h| h.trim_matches(|c: char| c == '"' || c == '*').trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| original_title.trim().to_string());

    let mut summary = summary_lines.join(" ");
    if summary.is_empty() {
        summary = text.split_whitespace().collect::<Vec<_>>().join(" ");
    }
    if summary.is_empty() {
        return Err(Error::Summarize("model returned an empty response".into()));
    }

    Ok(Summary {
        headline: truncate_chars(&headline, MAX_HEADLINE_CHARS),
        summary: truncate_chars(&summary, MAX_SUMMARY_CHARS),
    })
}

fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    if head.eq_ignore_ascii_case(label) {
        Some(line[label.len()..].trim())
    } else {
        None
    }
}
