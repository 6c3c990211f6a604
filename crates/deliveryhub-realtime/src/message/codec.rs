//! JSON encoding and decoding of WebSocket frames.

use validator::Validate;

use deliveryhub_core::error::AppError;
use deliveryhub_core::result::AppResult;

use super::types::{InboundMessage, OutboundMessage};

/// Checks frame-level limits before parsing.
pub fn validate_frame(raw: &str, max_bytes: usize) -> AppResult<()> {
    if raw.len() > max_bytes {
        return Err(AppError::validation(format!(
            "Message exceeds maximum size of {max_bytes} bytes"
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty message"));
    }

    Ok(())
}

/// Decodes and validates an inbound frame.
pub fn decode_inbound(raw: &str, max_bytes: usize) -> AppResult<InboundMessage> {
    validate_frame(raw, max_bytes)?;
    let message: InboundMessage = serde_json::from_str(raw)?;
    message.validate()?;
    Ok(message)
}

/// Serializes an outbound message to a JSON text frame.
pub fn encode_outbound(message: &OutboundMessage) -> AppResult<String> {
    Ok(serde_json::to_string(message)?)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use deliveryhub_core::error::ErrorKind;
    use deliveryhub_core::types::{AgentId, OrderId, Position, RestaurantId};

    use super::*;
    use crate::message::builder;

    const MAX: usize = 65_536;

    #[test]
    fn test_decode_agent_location_update() {
        let raw = r#"{"event":"agent-location-update","data":{"agentId":"A1","orderId":"O1","latitude":3.86,"longitude":11.52}}"#;
        let InboundMessage::AgentLocationUpdate(update) = decode_inbound(raw, MAX).expect("valid")
        else {
            panic!("wrong variant");
        };
        assert_eq!(update.agent_id, AgentId::from("A1"));
        assert_eq!(update.order_id, Some(OrderId::from("O1")));
        assert_eq!(update.position(), Position::new(3.86, 11.52));
    }

    #[test]
    fn test_decode_optional_fields_may_be_missing() {
        let raw = r#"{"event":"agent-location-update","data":{"agentId":"A1","latitude":1,"longitude":2}}"#;
        assert!(decode_inbound(raw, MAX).is_ok());

        let raw = r#"{"event":"order-status-update","data":{"orderId":"O1","status":"preparing"}}"#;
        let InboundMessage::OrderStatusUpdate(update) = decode_inbound(raw, MAX).expect("valid")
        else {
            panic!("wrong variant");
        };
        assert_eq!(update.restaurant_id, None);
    }

    #[test]
    fn test_decode_rejects_malformed_payloads() {
        let cases = [
            // not JSON
            "agent-location-update",
            // unknown event
            r#"{"event":"teleport","data":{}}"#,
            // missing required field
            r#"{"event":"track-order","data":{"customerId":"C1"}}"#,
            // non-numeric coordinates
            r#"{"event":"agent-location-update","data":{"agentId":"A1","latitude":"north","longitude":2}}"#,
            // empty id
            r#"{"event":"agent-location-update","data":{"agentId":"","latitude":1,"longitude":2}}"#,
            // empty status
            r#"{"event":"payment-update","data":{"orderId":"O1","paymentStatus":""}}"#,
            // blank frame
            "   ",
        ];

        for raw in cases {
            let err = decode_inbound(raw, MAX).expect_err(raw);
            assert!(err.is_decode_failure(), "{raw}: {err}");
        }
    }

    #[test]
    fn test_decode_rejects_oversized_frame() {
        let raw = r#"{"event":"track-order","data":{"orderId":"O1"}}"#;
        let err = decode_inbound(raw, 8).expect_err("too large");
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_encode_location_update_shape() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let msg = builder::build_location_update(OrderId::from("O1"), Position::new(3.86, 11.52), ts);

        let value: serde_json::Value =
            serde_json::from_str(&encode_outbound(&msg).expect("encode")).expect("json");
        assert_eq!(
            value,
            json!({
                "event": "delivery-location-update",
                "data": {
                    "latitude": 3.86,
                    "longitude": 11.52,
                    "orderId": "O1",
                    "timestamp": "2026-01-02T03:04:05Z"
                }
            })
        );
    }

    #[test]
    fn test_encode_restaurant_update_shape() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let msg = builder::build_restaurant_update(
            OrderId::from("O1"),
            "ready",
            Some(RestaurantId::from("R9")),
            ts,
        );

        let value: serde_json::Value =
            serde_json::from_str(&encode_outbound(&msg).expect("encode")).expect("json");
        assert_eq!(value["event"], "restaurant-order-update");
        assert_eq!(value["data"]["restaurantId"], "R9");
        assert_eq!(value["data"]["status"], "ready");
    }
}
