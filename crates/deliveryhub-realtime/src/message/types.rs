//! Inbound and outbound WebSocket message type definitions.
//!
//! Every frame is a JSON object `{"event": "<kebab-case name>", "data": {...}}`
//! with camelCase payload fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use deliveryhub_core::types::{AgentId, CustomerId, OrderId, Position, RestaurantId};

/// Messages sent by clients (or the upstream order service) to the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum InboundMessage {
    /// Agent position report.
    AgentLocationUpdate(AgentLocationUpdate),
    /// Customer starts watching an order.
    TrackOrder(TrackOrder),
    /// Order status changed.
    OrderStatusUpdate(OrderStatusUpdate),
    /// Payment status changed.
    PaymentUpdate(PaymentUpdate),
    /// Connection follows a restaurant's order updates.
    WatchRestaurant(RestaurantWatch),
    /// Connection stops following a restaurant.
    UnwatchRestaurant(RestaurantWatch),
}

impl InboundMessage {
    /// Wire name of the event.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::AgentLocationUpdate(_) => "agent-location-update",
            Self::TrackOrder(_) => "track-order",
            Self::OrderStatusUpdate(_) => "order-status-update",
            Self::PaymentUpdate(_) => "payment-update",
            Self::WatchRestaurant(_) => "watch-restaurant",
            Self::UnwatchRestaurant(_) => "unwatch-restaurant",
        }
    }

    /// Whether handling the event needs an originating connection.
    pub fn requires_connection(&self) -> bool {
        matches!(
            self,
            Self::AgentLocationUpdate(_)
                | Self::TrackOrder(_)
                | Self::WatchRestaurant(_)
                | Self::UnwatchRestaurant(_)
        )
    }
}

impl Validate for InboundMessage {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::AgentLocationUpdate(m) => m.validate(),
            Self::TrackOrder(m) => m.validate(),
            Self::OrderStatusUpdate(m) => m.validate(),
            Self::PaymentUpdate(m) => m.validate(),
            Self::WatchRestaurant(m) | Self::UnwatchRestaurant(m) => m.validate(),
        }
    }
}

/// `agent-location-update` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AgentLocationUpdate {
    /// Reporting agent
    #[validate(custom(function = "not_blank"))]
    pub agent_id: AgentId,
    /// Order being delivered, if any
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub order_id: Option<OrderId>,
    /// Latitude
    #[validate(custom(function = "finite"))]
    pub latitude: f64,
    /// Longitude
    #[validate(custom(function = "finite"))]
    pub longitude: f64,
}

impl AgentLocationUpdate {
    /// Reported coordinates.
    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }
}

/// `track-order` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrackOrder {
    /// Order to watch
    #[validate(custom(function = "not_blank"))]
    pub order_id: OrderId,
    /// Customer doing the watching (informational)
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
}

/// `order-status-update` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusUpdate {
    /// Order whose status changed
    #[validate(custom(function = "not_blank"))]
    pub order_id: OrderId,
    /// New status, in the order service's vocabulary
    #[validate(length(min = 1))]
    pub status: String,
    /// Restaurant preparing the order
    #[serde(default)]
    pub restaurant_id: Option<RestaurantId>,
    /// Customer who placed the order (informational)
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
}

/// `payment-update` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdate {
    /// Order whose payment changed
    #[validate(custom(function = "not_blank"))]
    pub order_id: OrderId,
    /// New payment status
    #[validate(length(min = 1))]
    pub payment_status: String,
}

/// `watch-restaurant` / `unwatch-restaurant` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantWatch {
    /// Restaurant to follow
    #[validate(custom(function = "not_blank"))]
    pub restaurant_id: RestaurantId,
}

/// Messages pushed by the hub to connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum OutboundMessage {
    /// Agent position for a watched order (unicast to the watcher).
    DeliveryLocationUpdate {
        /// Latitude
        latitude: f64,
        /// Longitude
        longitude: f64,
        /// Watched order
        order_id: OrderId,
        /// When the hub emitted the update
        timestamp: DateTime<Utc>,
    },
    /// Order status change (unicast to the watcher).
    OrderStatusChanged {
        /// Order ID
        order_id: OrderId,
        /// New status
        status: String,
        /// Timestamp
        timestamp: DateTime<Utc>,
    },
    /// Order status change for restaurant dashboards.
    RestaurantOrderUpdate {
        /// Order ID
        order_id: OrderId,
        /// New status
        status: String,
        /// Restaurant, when the status event named one
        restaurant_id: Option<RestaurantId>,
        /// Timestamp
        timestamp: DateTime<Utc>,
    },
    /// Payment status change (broadcast).
    PaymentStatusChanged {
        /// Order ID
        order_id: OrderId,
        /// New payment status
        payment_status: String,
        /// Timestamp
        timestamp: DateTime<Utc>,
    },
    /// Rejected inbound frame.
    Error {
        /// Error code
        code: String,
        /// Error description
        message: String,
    },
}

impl OutboundMessage {
    /// Wire name of the event.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::DeliveryLocationUpdate { .. } => "delivery-location-update",
            Self::OrderStatusChanged { .. } => "order-status-changed",
            Self::RestaurantOrderUpdate { .. } => "restaurant-order-update",
            Self::PaymentStatusChanged { .. } => "payment-status-changed",
            Self::Error { .. } => "error",
        }
    }
}

fn not_blank<K: AsRef<str>>(value: &K) -> Result<(), ValidationError> {
    if value.as_ref().trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn finite(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::new("not_finite"));
    }
    Ok(())
}
