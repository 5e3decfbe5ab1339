//! newscast daemon
//!
//! Loads configuration, starts the REST API and both loops, and runs until
//! SIGTERM/SIGINT. Exits non-zero if a loop dies on a store failure.

use clap::Parser;
use newscast::config::{BroadcasterBackend, SummarizerBackend};
use newscast::{Config, Newsroom, run_with_shutdown};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "newscast", version, about = "Ingest, review and stream news items")]
struct Cli {
    /// JSON configuration file; built-in defaults when omitted
    #[arg(long, short, env = "NEWSCAST_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, env = "NEWSCAST_DATABASE")]
    database: Option<PathBuf>,

    /// REST API bind address
    #[arg(long, env = "NEWSCAST_BIND")]
    bind: Option<SocketAddr>,

    /// API key required on every request
    #[arg(long, env = "NEWSCAST_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Ollama base URL
    #[arg(long, env = "OLLAMA_URL")]
    ollama_url: Option<String>,

    /// Ollama model name
    #[arg(long, env = "OLLAMA_MODEL")]
    ollama_model: Option<String>,

    /// Use the extractive summarizer instead of a model
    #[arg(long)]
    extractive: bool,

    /// Seconds each item stays on air
    #[arg(long, env = "NEWSCAST_DISPLAY_SECONDS")]
    display_seconds: Option<u64>,

    /// Program run once per item; replaces the log broadcaster
    #[arg(long, env = "NEWSCAST_BROADCAST_COMMAND")]
    broadcast_command: Option<PathBuf>,

    /// Do not start the REST API
    #[arg(long)]
    no_api: bool,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(path) = self.database {
            config.persistence.database_path = path;
        }
        if let Some(bind) = self.bind {
            config.server.api.bind_address = bind;
        }
        if let Some(key) = self.api_key {
            config.server.api.api_key = Some(key);
        }
        if let Some(url) = self.ollama_url {
            config.summarizer.endpoint = url;
        }
        if let Some(model) = self.ollama_model {
            config.summarizer.model = model;
        }
        if self.extractive {
            config.summarizer.backend = SummarizerBackend::Extractive;
        }
        if let Some(seconds) = self.display_seconds {
            config.schedule.display_seconds = seconds;
        }
        if let Some(command) = self.broadcast_command {
            config.broadcaster.backend = BroadcasterBackend::Command;
            config.broadcaster.command = Some(command);
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newscast=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // No-op when there is no .env file
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let no_api = cli.no_api;

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path).await?,
        None => Config::default(),
    };
    cli.apply(&mut config);

    tracing::info!(
        database = %config.persistence.database_path.display(),
        feeds = config.ingest.feeds.len(),
        display_seconds = config.schedule.display_seconds,
        "Starting newscast"
    );

    let newsroom = Newsroom::new(config).await?;

    if !no_api {
        let api = Arc::new(newsroom.clone()).spawn_api_server();
        tokio::spawn(async move {
            match api.await {
                Ok(Err(e)) => tracing::error!(error = %e, "API server stopped"),
                Err(e) => tracing::error!(error = %e, "API server task panicked"),
                Ok(Ok(())) => {}
            }
        });
    }

    run_with_shutdown(newsroom).await?;
    Ok(())
}
