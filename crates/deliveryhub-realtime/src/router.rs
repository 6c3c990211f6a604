//! Event fan-out: decides which connection(s) receive which outbound message.
//!
//! The router mutates the trackers and returns a list of deliveries. It never
//! touches a socket; the hub resolves recipients against the connection pool
//! and pushes afterwards.

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use deliveryhub_core::config::RestaurantScope;
use deliveryhub_core::error::AppError;
use deliveryhub_core::result::AppResult;
use deliveryhub_core::types::ConnectionId;

use crate::message::builder;
use crate::message::types::{
    AgentLocationUpdate, InboundMessage, OrderStatusUpdate, OutboundMessage, PaymentUpdate,
    TrackOrder,
};
use crate::presence::tracker::PositionReport;
use crate::state::HubState;

/// Who a delivery is addressed to.
#[derive(Debug, Clone, PartialEq)]
pub enum Recipient {
    /// A single connection.
    Connection(ConnectionId),
    /// An explicit set of connections.
    Connections(Vec<ConnectionId>),
    /// Every live connection.
    Everyone,
}

/// One outbound message and its recipients.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Target connection(s)
    pub recipient: Recipient,
    /// Message to push
    pub message: OutboundMessage,
}

impl Delivery {
    fn unicast(connection_id: ConnectionId, message: OutboundMessage) -> Self {
        Self {
            recipient: Recipient::Connection(connection_id),
            message,
        }
    }

    fn broadcast(message: OutboundMessage) -> Self {
        Self {
            recipient: Recipient::Everyone,
            message,
        }
    }
}

/// Routes decoded inbound events to the trackers and computes recipients.
#[derive(Debug, Clone)]
pub struct EventRouter {
    restaurant_scope: RestaurantScope,
}

impl EventRouter {
    /// Creates a router with the given restaurant update policy.
    pub fn new(restaurant_scope: RestaurantScope) -> Self {
        Self { restaurant_scope }
    }

    /// Applies one inbound event and returns the pushes it produces.
    ///
    /// `origin` is the connection the event arrived on, or `None` for events
    /// injected over HTTP. Missing recipients are never an error.
    pub fn route(
        &self,
        state: &mut HubState,
        origin: Option<ConnectionId>,
        event: InboundMessage,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Delivery>> {
        let event_name = event.event_name();
        let deliveries = match event {
            InboundMessage::AgentLocationUpdate(update) => {
                let origin = require_origin(origin, event_name)?;
                self.on_position(state, origin, update, now)?
            }
            InboundMessage::TrackOrder(track) => {
                let origin = require_origin(origin, event_name)?;
                self.on_track(state, origin, track, now)?
            }
            InboundMessage::OrderStatusUpdate(update) => self.on_status(state, update, now),
            InboundMessage::PaymentUpdate(update) => self.on_payment(update, now),
            InboundMessage::WatchRestaurant(watch) => {
                let origin = require_origin(origin, event_name)?;
                if state.restaurants.subscribe(watch.restaurant_id.clone(), origin) {
                    debug!(
                        conn_id = %origin,
                        restaurant_id = %watch.restaurant_id,
                        "Restaurant watched"
                    );
                }
                Vec::new()
            }
            InboundMessage::UnwatchRestaurant(watch) => {
                let origin = require_origin(origin, event_name)?;
                state.restaurants.unsubscribe(&watch.restaurant_id, origin);
                Vec::new()
            }
        };

        trace!(event = event_name, pushes = deliveries.len(), "Event routed");
        Ok(deliveries)
    }

    fn on_position(
        &self,
        state: &mut HubState,
        origin: ConnectionId,
        update: AgentLocationUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Delivery>> {
        let position = update.position();
        let presence = state.presence.report_position(
            PositionReport {
                agent_id: update.agent_id,
                order_id: update.order_id,
                position,
            },
            origin,
            now,
        )?;

        let Some(order_id) = presence.active_order_id else {
            return Ok(Vec::new());
        };
        let Some(watcher) = state.orders.find(&order_id) else {
            trace!(order_id = %order_id, "No watcher for order, position not forwarded");
            return Ok(Vec::new());
        };

        Ok(vec![Delivery::unicast(
            watcher,
            builder::build_location_update(order_id, position, now),
        )])
    }

    fn on_track(
        &self,
        state: &mut HubState,
        origin: ConnectionId,
        track: TrackOrder,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Delivery>> {
        let order_id = track.order_id;
        state.orders.subscribe(order_id.clone(), origin, now)?;
        debug!(
            conn_id = %origin,
            order_id = %order_id,
            customer_id = ?track.customer_id,
            "Order tracking started"
        );

        // Catch-up: last known position of the agent delivering this order.
        let catch_up = state.presence.find_by_order(&order_id).map(|presence| {
            Delivery::unicast(
                origin,
                builder::build_location_update(order_id, presence.position, presence.last_update),
            )
        });

        Ok(catch_up.into_iter().collect())
    }

    fn on_status(
        &self,
        state: &HubState,
        update: OrderStatusUpdate,
        now: DateTime<Utc>,
    ) -> Vec<Delivery> {
        let mut deliveries = Vec::with_capacity(2);

        if let Some(watcher) = state.orders.find(&update.order_id) {
            deliveries.push(Delivery::unicast(
                watcher,
                builder::build_status_changed(update.order_id.clone(), &update.status, now),
            ));
        }

        let restaurant_update = builder::build_restaurant_update(
            update.order_id,
            &update.status,
            update.restaurant_id.clone(),
            now,
        );

        match self.restaurant_scope {
            RestaurantScope::Broadcast => deliveries.push(Delivery::broadcast(restaurant_update)),
            RestaurantScope::Subscribers => {
                let subscribers = update
                    .restaurant_id
                    .as_ref()
                    .map(|id| state.restaurants.subscribers(id))
                    .unwrap_or_default();
                if !subscribers.is_empty() {
                    deliveries.push(Delivery {
                        recipient: Recipient::Connections(subscribers),
                        message: restaurant_update,
                    });
                }
            }
        }

        deliveries
    }

    fn on_payment(&self, update: PaymentUpdate, now: DateTime<Utc>) -> Vec<Delivery> {
        vec![Delivery::broadcast(builder::build_payment_changed(
            update.order_id,
            &update.payment_status,
            now,
        ))]
    }
}

fn require_origin(origin: Option<ConnectionId>, event_name: &str) -> AppResult<ConnectionId> {
    origin.ok_or_else(|| {
        AppError::validation(format!("{event_name} must be sent over a WebSocket connection"))
    })
}
