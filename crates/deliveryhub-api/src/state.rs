//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use deliveryhub_core::config::AppConfig;
use deliveryhub_realtime::HubHandle;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. Cloning is cheap:
/// the config is `Arc`-wrapped and the hub handle is a channel sender.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Client for the realtime hub sequencer
    pub hub: HubHandle,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Creates the state for a running hub.
    pub fn new(config: AppConfig, hub: HubHandle) -> Self {
        Self {
            config: Arc::new(config),
            hub,
            started_at: Instant::now(),
        }
    }
}
