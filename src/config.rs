//! Configuration types for newscast

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Main configuration for newscast
///
/// Fields are organized into logical sub-configs:
/// - [`schedule`](ScheduleConfig) - broadcast cadence and retry policy
/// - [`ingest`](IngestConfig) - feeds, fetch cadence, summarize timeout
/// - [`summarizer`](SummarizerConfig) - summarization backend
/// - [`broadcaster`](BroadcasterConfig) - output backend
/// - [`persistence`](PersistenceConfig) - database location
/// - [`server`](ServerIntegrationConfig) - REST API
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Broadcast scheduling settings
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Ingestion settings
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Summarizer backend settings
    #[serde(default)]
    pub summarizer: SummarizerConfig,

    /// Broadcaster backend settings
    #[serde(default)]
    pub broadcaster: BroadcasterConfig,

    /// Data storage settings
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// API and external server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Load a JSON configuration file
    ///
    /// Missing fields take their defaults, so an empty object `{}` is a valid file.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;

        let config: Config = serde_json::from_str(&content).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
            key: None,
        })?;

        Ok(config)
    }

    /// Check the configuration for values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.schedule.display_seconds == 0 {
            return Err(config_error(
                "display_seconds must be greater than zero",
                "schedule.display_seconds",
            ));
        }
        if self.schedule.display_seconds > MAX_DISPLAY_SECONDS {
            return Err(config_error(
                &format!("display_seconds must be at most {}", MAX_DISPLAY_SECONDS),
                "schedule.display_seconds",
            ));
        }
        if self.schedule.retry_ceiling == 0 {
            return Err(config_error(
                "retry_ceiling must be at least 1",
                "schedule.retry_ceiling",
            ));
        }
        if self.schedule.render_timeout.is_zero() {
            return Err(config_error(
                "render_timeout must be greater than zero",
                "schedule.render_timeout",
            ));
        }
        if self.ingest.fetch_interval_minutes == 0 {
            return Err(config_error(
                "fetch_interval_minutes must be greater than zero",
                "ingest.fetch_interval_minutes",
            ));
        }
        if self.ingest.fetch_interval_minutes > MAX_FETCH_INTERVAL_MINUTES {
            return Err(config_error(
                &format!(
                    "fetch_interval_minutes must be at most {}",
                    MAX_FETCH_INTERVAL_MINUTES
                ),
                "ingest.fetch_interval_minutes",
            ));
        }
        if self.ingest.summarize_timeout.is_zero() {
            return Err(config_error(
                "summarize_timeout must be greater than zero",
                "ingest.summarize_timeout",
            ));
        }
        for feed in &self.ingest.feeds {
            if let Err(e) = url::Url::parse(&feed.url) {
                return Err(config_error(
                    &format!("feed '{}' has an invalid url: {}", feed.name, e),
                    "ingest.feeds",
                ));
            }
        }
        if self.summarizer.backend == SummarizerBackend::Ollama
            && url::Url::parse(&self.summarizer.endpoint).is_err()
        {
            return Err(config_error(
                "summarizer endpoint is not a valid url",
                "summarizer.endpoint",
            ));
        }
        if self.broadcaster.backend == BroadcasterBackend::Command
            && self.broadcaster.command.is_none()
        {
            return Err(config_error(
                "command backend requires broadcaster.command",
                "broadcaster.command",
            ));
        }
        Ok(())
    }

    /// Interval between broadcast ticks
    pub fn display_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.display_seconds)
    }

    /// Interval between ingestion cycles
    pub fn fetch_interval(&self) -> Duration {
        self.ingest.fetch_interval()
    }
}

/// Longest accepted broadcast cadence: one day
pub const MAX_DISPLAY_SECONDS: u64 = 24 * 60 * 60;

/// Longest accepted fetch interval: one week
pub const MAX_FETCH_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

fn config_error(message: &str, key: &str) -> Error {
    Error::Config {
        message: message.to_string(),
        key: Some(key.to_string()),
    }
}

/// Broadcast scheduling configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ScheduleConfig {
    /// Seconds between broadcast ticks; one item is claimed per tick (default: 30)
    #[serde(default = "default_display_seconds")]
    pub display_seconds: u64,

    /// Failed dispatch attempts before an item is terminally failed (default: 3)
    #[serde(default = "default_retry_ceiling")]
    pub retry_ceiling: u32,

    /// Upper bound on a single render; a timeout counts as a transient failure (default: 60 seconds)
    #[serde(default = "default_render_timeout", with = "duration_serde")]
    pub render_timeout: Duration,

    /// How long an in-flight render may run after shutdown is requested (default: 10 seconds)
    #[serde(default = "default_shutdown_grace", with = "duration_serde")]
    pub shutdown_grace: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            display_seconds: default_display_seconds(),
            retry_ceiling: default_retry_ceiling(),
            render_timeout: default_render_timeout(),
            shutdown_grace: default_shutdown_grace(),
        }
    }
}

/// Ingestion configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct IngestConfig {
    /// Minutes between fetch cycles (default: 5)
    #[serde(default = "default_fetch_interval_minutes")]
    pub fetch_interval_minutes: u64,

    /// Per-candidate summarizer timeout (default: 60 seconds)
    #[serde(default = "default_summarize_timeout", with = "duration_serde")]
    pub summarize_timeout: Duration,

    /// Most recent entries taken from each feed per cycle (default: 10)
    #[serde(default = "default_max_items_per_feed")]
    pub max_items_per_feed: usize,

    /// Raw content is truncated to this many characters (default: 1000)
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,

    /// News sources
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedConfig>,

    /// Retry policy for feed fetches
    #[serde(default)]
    pub retry: RetryConfig,
}

impl IngestConfig {
    /// Interval between ingestion cycles
    ///
    /// Saturates instead of overflowing for values `validate` would reject.
    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval_minutes.saturating_mul(60))
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            fetch_interval_minutes: default_fetch_interval_minutes(),
            summarize_timeout: default_summarize_timeout(),
            max_items_per_feed: default_max_items_per_feed(),
            max_content_chars: default_max_content_chars(),
            feeds: default_feeds(),
            retry: RetryConfig::default(),
        }
    }
}

/// RSS or Atom news source
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FeedConfig {
    /// Display name, stored on every item from this feed
    pub name: String,

    /// Feed URL (RSS or Atom)
    pub url: String,

    /// Whether feed is active
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Retry configuration for transient fetch failures
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 2)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 2 seconds)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Which summarizer implementation to use
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SummarizerBackend {
    /// Ollama `/api/generate` (default)
    #[default]
    Ollama,
    /// First sentences of the source text, no model required
    Extractive,
}

/// Summarizer configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SummarizerConfig {
    /// Backend selection (default: ollama)
    #[serde(default)]
    pub backend: SummarizerBackend,

    /// Ollama base URL (default: "http://localhost:11434")
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    /// Model name (default: "llama3:8b")
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Sampling temperature (default: 0.7)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Token budget for one response (default: 300)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Fall back to the extractive summarizer when the model call fails (default: false)
    #[serde(default)]
    pub fallback_extractive: bool,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            backend: SummarizerBackend::default(),
            endpoint: default_ollama_endpoint(),
            model: default_ollama_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            fallback_extractive: false,
        }
    }
}

/// Which broadcaster implementation to use
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BroadcasterBackend {
    /// Log each item instead of streaming it (default)
    #[default]
    Log,
    /// Run an external program per item
    Command,
}

/// Broadcaster configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct BroadcasterConfig {
    /// Backend selection (default: log)
    #[serde(default)]
    pub backend: BroadcasterBackend,

    /// Program to run for the command backend; bare names are looked up in PATH
    #[serde(default)]
    pub command: Option<PathBuf>,

    /// Extra arguments passed to the program
    #[serde(default)]
    pub args: Vec<String>,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PersistenceConfig {
    /// Database path (default: "./newscast.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8080)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Optional API key for authentication
    #[serde(default)]
    pub api_key: Option<String>,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_key: None,
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

fn default_display_seconds() -> u64 {
    30
}

fn default_retry_ceiling() -> u32 {
    3
}

fn default_render_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_shutdown_grace() -> Duration {
    Duration::from_secs(10)
}

fn default_fetch_interval_minutes() -> u64 {
    5
}

fn default_summarize_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_max_items_per_feed() -> usize {
    10
}

fn default_max_content_chars() -> usize {
    1000
}

fn default_feeds() -> Vec<FeedConfig> {
    [
        ("BleepingComputer", "https://www.bleepingcomputer.com/feed/"),
        ("The Hacker News", "https://feeds.feedburner.com/TheHackersNews"),
        ("Krebs on Security", "https://krebsonsecurity.com/feed/"),
        ("Dark Reading", "https://www.darkreading.com/rss.xml"),
        ("SecurityWeek", "https://www.securityweek.com/feed"),
    ]
    .into_iter()
    .map(|(name, url)| FeedConfig {
        name: name.to_string(),
        url: url.to_string(),
        enabled: true,
    })
    .collect()
}

fn default_max_attempts() -> u32 {
    2
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3:8b".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    300
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./newscast.db")
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
