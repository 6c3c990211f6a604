//! Periodic stale presence sweep.

use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use crate::server::HubHandle;

/// Asks the hub to evict stale presence every `interval`.
///
/// The eviction itself runs inside the sequencer; this loop only ticks.
/// Ends once the hub stops accepting commands.
pub async fn run_sweeper(hub: HubHandle, interval: Duration) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        if hub.sweep().await.is_err() {
            break;
        }
    }

    debug!("Presence sweep loop ended");
}
