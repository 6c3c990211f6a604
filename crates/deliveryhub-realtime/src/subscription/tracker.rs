//! Subscription tracker: which connection is watching which order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use deliveryhub_core::error::AppError;
use deliveryhub_core::result::AppResult;
use deliveryhub_core::types::{ConnectionId, OrderId};

use crate::registry::ConnectionRegistry;

/// A customer connection watching one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWatch {
    /// Watched order
    pub order_id: OrderId,
    /// Watching connection
    pub connection_id: ConnectionId,
    /// When the watch was (re)established
    pub subscribed_at: DateTime<Utc>,
}

/// Tracks the single watcher of each order.
///
/// A later subscription for the same order replaces the earlier watcher.
/// One connection may watch several orders.
#[derive(Debug, Default)]
pub struct SubscriptionTracker {
    /// Order ID → watching connection + subscription time
    watches: ConnectionRegistry<OrderId, DateTime<Utc>>,
}

impl SubscriptionTracker {
    /// Creates a new subscription tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `connection_id` the watcher of `order_id`.
    ///
    /// Returns the displaced watcher, if a different connection held it.
    pub fn subscribe(
        &mut self,
        order_id: OrderId,
        connection_id: ConnectionId,
        at: DateTime<Utc>,
    ) -> AppResult<Option<ConnectionId>> {
        if order_id.is_blank() {
            return Err(AppError::validation("orderId must not be empty"));
        }

        let displaced = self
            .watches
            .upsert(order_id.clone(), connection_id, at)
            .map(|prev| prev.connection_id)
            .filter(|prev| *prev != connection_id);

        if let Some(prev) = displaced {
            debug!(
                order_id = %order_id,
                old_conn_id = %prev,
                conn_id = %connection_id,
                "Order watcher replaced"
            );
        }

        Ok(displaced)
    }

    /// Removes every watch held by a connection.
    pub fn remove(&mut self, connection_id: ConnectionId) -> Vec<OrderId> {
        self.watches
            .remove_connection(connection_id)
            .into_iter()
            .map(|(order_id, _)| order_id)
            .collect()
    }

    /// Returns the watcher of an order.
    pub fn find(&self, order_id: &OrderId) -> Option<ConnectionId> {
        self.watches.connection_for(order_id)
    }

    /// Returns the full watch record of an order.
    pub fn watch(&self, order_id: &OrderId) -> Option<OrderWatch> {
        self.watches.get(order_id).map(|r| OrderWatch {
            order_id: order_id.clone(),
            connection_id: r.connection_id,
            subscribed_at: r.value,
        })
    }

    /// Orders watched by a connection.
    pub fn orders_for(&self, connection_id: ConnectionId) -> Vec<OrderId> {
        self.watches.keys_for(connection_id)
    }

    /// Number of watched orders.
    pub fn len(&self) -> usize {
        self.watches.len()
    }

    /// Whether no order is watched.
    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }
}
