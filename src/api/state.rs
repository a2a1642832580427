//! Application state for the API server

use crate::{Config, Orchestrator};
use std::sync::Arc;

/// Shared state handed to every route handler
///
/// Cloned per request; only the `Arc` is copied.
#[derive(Clone)]
pub struct AppState {
    /// Runs enhance requests
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    /// The service configuration
    pub fn config(&self) -> &Config {
        self.orchestrator.config()
    }
}
