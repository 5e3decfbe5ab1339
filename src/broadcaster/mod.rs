//! Broadcast output: the [`Broadcaster`] capability and its implementations
//!
//! A broadcaster receives one claimed item at a time and reports either
//! success or a [`RenderError`]. Whether the error is transient decides if the
//! scheduler requeues the item or fails it.
//!
//! Implementations:
//! - [`LogBroadcaster`]: logs the item (dry run, development)
//! - [`CommandBroadcaster`]: runs an external program per item, e.g. a script
//!   that renders a frame and pushes it to the video transport

mod command;
mod log;

pub use command::CommandBroadcaster;
pub use self::log::LogBroadcaster;

use crate::config::{BroadcasterBackend, BroadcasterConfig};
use crate::error::{Error, Result};
use crate::types::NewsItem;
use async_trait::async_trait;
use std::sync::Arc;

/// Failure reported by a broadcaster
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RenderError {
    /// Human-readable failure description
    pub message: String,
    /// Whether retrying the same item may succeed
    pub transient: bool,
}

impl RenderError {
    /// A failure worth retrying (encoder busy, connection dropped, timeout)
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: true,
        }
    }

    /// A failure that will repeat for this item
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: false,
        }
    }
}

/// Trait for broadcast outputs
///
/// `stream` may take as long as the render needs; the scheduler bounds it
/// with its own timeout and never calls it concurrently.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Human-readable name for logging
    fn name(&self) -> &'static str;

    /// Stream one item to the output
    async fn stream(&self, item: &NewsItem) -> std::result::Result<(), RenderError>;
}

/// Build the broadcaster described by the configuration
///
/// # Errors
/// Returns error if the command backend is selected without a resolvable program
pub fn from_config(config: &BroadcasterConfig) -> Result<Arc<dyn Broadcaster>> {
    match config.backend {
        BroadcasterBackend::Log => Ok(Arc::new(LogBroadcaster::new())),
        BroadcasterBackend::Command => {
            let program = config.command.as_ref().ok_or_else(|| Error::Config {
                message: "command backend requires a program".to_string(),
                key: Some("broadcaster.command".to_string()),
            })?;

            let broadcaster = if program.components().count() > 1 {
                CommandBroadcaster::new(program.clone())
            } else {
                let name = program.to_string_lossy();
                CommandBroadcaster::from_path(&name).ok_or_else(|| {
                    Error::ExternalTool(format!("broadcast command '{}' not found in PATH", name))
                })?
            };

            Ok(Arc::new(broadcaster.with_args(config.args.clone())))
        }
    }
}
