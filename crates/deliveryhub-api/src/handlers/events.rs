//! Event ingest for the upstream order service.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::info;

use deliveryhub_core::result::AppResult;
use deliveryhub_realtime::message::codec;

use crate::dto::response::{ApiResponse, PublishResponse};
use crate::state::AppState;

/// POST /api/events
///
/// Accepts the same `{"event", "data"}` envelope as the WebSocket and routes
/// it with no originating connection. Only status and payment events make
/// sense here; connection-bound events are rejected with 400.
pub async fn publish_event(
    State(state): State<AppState>,
    body: String,
) -> AppResult<(StatusCode, Json<ApiResponse<PublishResponse>>)> {
    let event = codec::decode_inbound(&body, state.config.realtime.max_message_bytes)?;
    let event_name = event.event_name();

    let delivered = state.hub.publish(event).await?;
    info!(event = event_name, delivered, "Event ingested");

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::ok(PublishResponse {
            event: event_name.to_string(),
            delivered,
        })),
    ))
}
