//! Builder helpers for constructing outbound messages.

use chrono::{DateTime, Utc};

use deliveryhub_core::types::{OrderId, Position, RestaurantId};

use super::types::OutboundMessage;

/// Error code sent back for frames the hub could not decode.
pub const INVALID_MESSAGE: &str = "INVALID_MESSAGE";

/// Build a delivery location update for an order's watcher
pub fn build_location_update(
    order_id: OrderId,
    position: Position,
    timestamp: DateTime<Utc>,
) -> OutboundMessage {
    OutboundMessage::DeliveryLocationUpdate {
        latitude: position.latitude,
        longitude: position.longitude,
        order_id,
        timestamp,
    }
}

/// Build an order status changed event
pub fn build_status_changed(
    order_id: OrderId,
    status: &str,
    timestamp: DateTime<Utc>,
) -> OutboundMessage {
    OutboundMessage::OrderStatusChanged {
        order_id,
        status: status.to_string(),
        timestamp,
    }
}

/// Build a restaurant order update event
pub fn build_restaurant_update(
    order_id: OrderId,
    status: &str,
    restaurant_id: Option<RestaurantId>,
    timestamp: DateTime<Utc>,
) -> OutboundMessage {
    OutboundMessage::RestaurantOrderUpdate {
        order_id,
        status: status.to_string(),
        restaurant_id,
        timestamp,
    }
}

/// Build a payment status changed event
pub fn build_payment_changed(
    order_id: OrderId,
    payment_status: &str,
    timestamp: DateTime<Utc>,
) -> OutboundMessage {
    OutboundMessage::PaymentStatusChanged {
        order_id,
        payment_status: payment_status.to_string(),
        timestamp,
    }
}

/// Build an error message
pub fn build_error(code: &str, message: &str) -> OutboundMessage {
    OutboundMessage::Error {
        code: code.to_string(),
        message: message.to_string(),
    }
}
