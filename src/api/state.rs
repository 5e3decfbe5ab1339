//! Application state for the API server

use crate::{Config, Newsroom};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned per request; both fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    /// The running newsroom
    pub newsroom: Arc<Newsroom>,

    /// Configuration, read-only
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(newsroom: Arc<Newsroom>, config: Arc<Config>) -> Self {
        Self { newsroom, config }
    }
}
