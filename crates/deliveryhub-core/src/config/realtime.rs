//! Real-time hub configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Who receives `restaurant-order-update` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestaurantScope {
    /// Every connected participant.
    #[default]
    Broadcast,
    /// Only connections that sent `watch-restaurant` for that restaurant.
    Subscribers,
}

/// Real-time (WebSocket) hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Per-connection outbound queue capacity. Pushes beyond it are dropped
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// Capacity of the hub's inbound command queue
    #[serde(default = "default_command_buffer")]
    pub command_buffer_size: usize,
    /// Largest accepted inbound frame in bytes
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
    /// Routing policy for restaurant order updates
    #[serde(default)]
    pub restaurant_scope: RestaurantScope,
    /// Evict agent presence older than this many seconds (0 disables expiry)
    #[serde(default)]
    pub stale_presence_seconds: u64,
    /// How often the stale presence sweep runs, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl RealtimeConfig {
    /// Presence TTL, or `None` when expiry is disabled.
    pub fn stale_presence_ttl(&self) -> Option<Duration> {
        (self.stale_presence_seconds > 0).then(|| Duration::from_secs(self.stale_presence_seconds))
    }

    /// Interval between stale presence sweeps.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds.max(1))
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_size: default_outbound_buffer(),
            command_buffer_size: default_command_buffer(),
            max_message_bytes: default_max_message_bytes(),
            restaurant_scope: RestaurantScope::default(),
            stale_presence_seconds: 0,
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_command_buffer() -> usize {
    1024
}

fn default_max_message_bytes() -> usize {
    65_536
}

fn default_sweep_interval() -> u64 {
    30
}
