//! Broadcaster that runs an external program per item

use super::{Broadcaster, RenderError};
use crate::types::NewsItem;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// `EX_TEMPFAIL` from sysexits.h: the program asks to be retried later
pub const EXIT_TEMPFAIL: i32 = 75;

/// Runs a program once per item
///
/// The item is written to the program's stdin as JSON and its main fields are
/// also exported as `NEWSCAST_*` environment variables:
///
/// | Variable | Value |
/// |---|---|
/// | `NEWSCAST_ITEM_ID` | item id |
/// | `NEWSCAST_HEADLINE` | headline |
/// | `NEWSCAST_SUMMARY` | summary |
/// | `NEWSCAST_SOURCE` | feed name |
/// | `NEWSCAST_SOURCE_URL` | article link |
/// | `NEWSCAST_ATTEMPT` | 1 for the first attempt, 2 for the first retry, ... |
///
/// Exit code 0 is success. Exit code 75, death by signal, or a failure to
/// start the program are transient. Any other exit code is permanent.
///
/// The child is killed if the scheduler abandons the render (timeout or
/// shutdown).
pub struct CommandBroadcaster {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandBroadcaster {
    /// Create a broadcaster for an explicit program path
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
        }
    }

    /// Look up `name` in PATH
    ///
    /// Returns `None` if no such program is found.
    pub fn from_path(name: &str) -> Option<Self> {
        which::which(name).ok().map(Self::new)
    }

    /// Arguments passed to the program on every run
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Program that will be run
    pub fn program(&self) -> &PathBuf {
        &self.program
    }
}

#[async_trait]
impl Broadcaster for CommandBroadcaster {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn stream(&self, item: &NewsItem) -> Result<(), RenderError> {
        let payload = serde_json::to_vec(item)
            .map_err(|e| RenderError::permanent(format!("failed to encode item: {}", e)))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env("NEWSCAST_ITEM_ID", item.id.to_string())
            .env("NEWSCAST_HEADLINE", &item.headline)
            .env("NEWSCAST_SUMMARY", &item.summary)
            .env("NEWSCAST_SOURCE", &item.source_name)
            .env("NEWSCAST_SOURCE_URL", &item.source_url)
            .env("NEWSCAST_ATTEMPT", (item.retry_count + 1).to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                RenderError::transient(format!(
                    "failed to start {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A program that ignores stdin may exit before reading it
            if let Err(e) = stdin.write_all(&payload).await {
                tracing::debug!(item_id = %item.id, error = %e, "broadcast command closed stdin early");
            }
            drop(stdin);
        }

        let output = child.wait_with_output().await.map_err(|e| {
            RenderError::transient(format!(
                "failed to wait for {}: {}",
                self.program.display(),
                e
            ))
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("").trim();

        match output.status.code() {
            Some(0) => Ok(()),
            Some(EXIT_TEMPFAIL) => Err(RenderError::transient(describe(
                "asked to retry (exit 75)",
                detail,
            ))),
            Some(code) => Err(RenderError::permanent(describe(
                &format!("exited with status {}", code),
                detail,
            ))),
            None => Err(RenderError::transient(describe("terminated by signal", detail))),
        }
    }
}

fn describe(what: &str, detail: &str) -> String {
    if detail.is_empty() {
        format!("broadcast command {}", what)
    } else {
        format!("broadcast command {}: {}", what, detail)
    }
}
