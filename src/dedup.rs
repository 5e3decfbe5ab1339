//! Deduplication keys for ingested stories
//!
//! A story is identified by its source URL and its original title. Both are
//! normalized first so that tracking parameters, `www.` prefixes, trailing
//! slashes and punctuation changes do not produce a new key.

use sha2::{Digest, Sha256};
use url::Url;

/// Compute the dedup key for a story: lowercase hex SHA-256 over the
/// normalized URL and title
pub fn dedup_key(source_url: &str, raw_title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_url(source_url).as_bytes());
    hasher.update(b"\n");
    hasher.update(normalize_title(raw_title).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Normalize a URL for comparison
///
/// The scheme is ignored, the host is lowercased with any leading `www.`
/// removed, the fragment and `utm_*` query parameters are dropped, and
/// trailing slashes are trimmed. Unparseable input falls back to trimmed
/// lowercase text.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let parsed = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(_) => return trimmed.to_lowercase(),
    };

    let host = match parsed.host_str() {
        Some(host) => host.to_lowercase(),
        None => return trimmed.to_lowercase(),
    };
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

    let mut normalized = host;
    if let Some(port) = parsed.port() {
        normalized.push(':');
        normalized.push_str(&port.to_string());
    }
    normalized.push_str(parsed.path().trim_end_matches('/'));

    let query: Vec<String> = parsed
        .query_pairs()
        .filter(|(key, _)| !key.to_ascii_lowercase().starts_with("utm_"))
        .map(|(key, value)| {
            if value.is_empty() {
                key.into_owned()
            } else {
                format!("{key}={value}")
            }
        })
        .collect();
    if !query.is_empty() {
        normalized.push('?');
        normalized.push_str(&query.join("&"));
    }

    normalized
}

/// Normalize a title for comparison: lowercase, punctuation to spaces,
/// whitespace collapsed
pub fn normalize_title(raw: &str) -> String {
    let mapped: String = raw
        .chars()
        .flat_map(|c| {
            let keep = c.is_alphanumeric();
            c.to_lowercase()
                .map(move |lower| if keep { lower } else { ' ' })
        })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}
