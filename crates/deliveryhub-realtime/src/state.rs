//! Mutable hub state, owned exclusively by the sequencer task.

use crate::connection::pool::ConnectionPool;
use crate::presence::tracker::PresenceTracker;
use crate::subscription::restaurant::RestaurantSubscriptions;
use crate::subscription::tracker::SubscriptionTracker;

/// Everything the hub mutates while processing events.
#[derive(Debug, Default)]
pub struct HubState {
    /// Live connections
    pub pool: ConnectionPool,
    /// Agent presence
    pub presence: PresenceTracker,
    /// Order watchers
    pub orders: SubscriptionTracker,
    /// Restaurant followers
    pub restaurants: RestaurantSubscriptions,
}

impl HubState {
    /// Creates empty hub state.
    pub fn new() -> Self {
        Self::default()
    }
}
