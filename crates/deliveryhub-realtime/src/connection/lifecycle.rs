//! Connection lifecycle: wiring new connections into the hub and purging
//! every registry entry of a closed one.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use deliveryhub_core::types::{AgentId, ConnectionId, OrderId, RestaurantId};

use crate::metrics::HubMetrics;
use crate::state::HubState;

use super::handle::ConnectionHandle;

/// What a disconnect removed from the registries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisconnectReport {
    /// Agents whose presence was dropped
    pub agents: Vec<AgentId>,
    /// Orders that lost their watcher
    pub orders: Vec<OrderId>,
    /// Restaurants the connection stopped following
    pub restaurants: Vec<RestaurantId>,
}

/// Reacts to transport connect/disconnect events.
#[derive(Debug)]
pub struct ConnectionLifecycleManager {
    metrics: Arc<HubMetrics>,
}

impl ConnectionLifecycleManager {
    /// Creates a new lifecycle manager.
    pub fn new(metrics: Arc<HubMetrics>) -> Self {
        Self { metrics }
    }

    /// Registers a freshly opened connection. No registry entry exists for
    /// it until its first position report or subscription.
    pub fn connect(&self, state: &mut HubState, handle: ConnectionHandle) {
        let conn_id = handle.id;
        if let Some(mut stale) = state.pool.add(handle) {
            warn!(conn_id = %conn_id, "Connection ID reused, replacing stale handle");
            stale.mark_closed();
        } else {
            self.metrics.connection_opened();
        }

        info!(
            conn_id = %conn_id,
            connections = state.pool.connection_count(),
            "Connection registered"
        );
    }

    /// Moves a connection from `Connected` to `Active`.
    pub fn activate(&self, state: &mut HubState, conn_id: ConnectionId) {
        if let Some(handle) = state.pool.get_mut(&conn_id) {
            if handle.activate() {
                debug!(conn_id = %conn_id, "Connection active");
            }
        }
    }

    /// Removes a connection and every registry entry it owned.
    ///
    /// Runs the tracker cleanups unconditionally, so it is safe to call for
    /// connections that never became active or were already removed.
    pub fn disconnect(&self, state: &mut HubState, conn_id: ConnectionId) -> DisconnectReport {
        if let Some(mut handle) = state.pool.remove(&conn_id) {
            handle.mark_closed();
            self.metrics.connection_closed();
        }

        let report = DisconnectReport {
            agents: state
                .presence
                .remove(conn_id)
                .into_iter()
                .map(|p| p.agent_id)
                .collect(),
            orders: state.orders.remove(conn_id),
            restaurants: state.restaurants.remove(conn_id),
        };

        info!(
            conn_id = %conn_id,
            agents = report.agents.len(),
            orders = report.orders.len(),
            restaurants = report.restaurants.len(),
            "Connection unregistered"
        );

        report
    }

    /// Disconnects every connection (hub shutdown).
    pub fn close_all(&self, state: &mut HubState) -> usize {
        let ids: Vec<ConnectionId> = state.pool.iter().map(|h| h.id).collect();
        for conn_id in &ids {
            self.disconnect(state, *conn_id);
        }
        info!(count = ids.len(), "All connections closed");
        ids.len()
    }
}
