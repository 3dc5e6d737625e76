//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use portfolio_copilot_core::ports::UpdatePublisher;
use portfolio_copilot_core::{DialogueEngine, ToolCallingLoop};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Serves `/copilot`.
    pub dialogue: DialogueEngine,
    /// Serves `/agent`.
    pub agent: ToolCallingLoop,
    /// Serves `/update_content`.
    pub publisher: Arc<dyn UpdatePublisher>,
}
