//! Individual connection handle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use deliveryhub_core::types::ConnectionId;

use crate::message::types::OutboundMessage;

/// Where a connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Registered, but has not reported a position or subscribed yet.
    Connected,
    /// Owns at least one registry entry or has subscribed.
    Active,
    /// Closed. Terminal.
    Disconnected,
}

/// Result of pushing a message into a connection's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Queued for the writer task.
    Queued,
    /// Queue full, message dropped.
    Full,
    /// Writer gone or connection closed, message dropped.
    Closed,
}

/// A handle to a single transport connection.
///
/// Holds the sender side of the connection's outbound queue. The transport
/// task owns the receiver and writes whatever arrives to the socket.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Sender for outbound messages
    sender: mpsc::Sender<OutboundMessage>,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    /// Lifecycle state
    state: ConnectionState,
}

impl ConnectionHandle {
    /// Create a new connection handle
    pub fn new(id: ConnectionId, sender: mpsc::Sender<OutboundMessage>) -> Self {
        Self {
            id,
            sender,
            connected_at: Utc::now(),
            state: ConnectionState::Connected,
        }
    }

    /// Push an outbound message without waiting.
    pub fn push(&self, msg: OutboundMessage) -> PushOutcome {
        if self.state == ConnectionState::Disconnected {
            return PushOutcome::Closed;
        }
        match self.sender.try_send(msg) {
            Ok(()) => PushOutcome::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Send buffer full, dropping message");
                PushOutcome::Full
            }
            Err(mpsc::error::TrySendError::Closed(_)) => PushOutcome::Closed,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Connected → Active. Returns `true` on the transition itself.
    pub fn activate(&mut self) -> bool {
        if self.state == ConnectionState::Connected {
            self.state = ConnectionState::Active;
            return true;
        }
        false
    }

    /// Mark the connection as closed
    pub fn mark_closed(&mut self) {
        self.state = ConnectionState::Disconnected;
    }
}
