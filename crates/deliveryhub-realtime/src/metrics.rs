//! Hub metrics counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Hub-level metrics counters.
#[derive(Debug, Default)]
pub struct HubMetrics {
    /// Total connections established
    connections_total: AtomicU64,
    /// Connections currently open
    connections_active: AtomicU64,
    /// Inbound frames received
    messages_received: AtomicU64,
    /// Outbound messages queued
    pushes_sent: AtomicU64,
    /// Outbound messages dropped (unknown, full, or closed recipient)
    pushes_dropped: AtomicU64,
    /// Inbound frames rejected as malformed
    decode_failures: AtomicU64,
    /// Agent presences evicted by the stale sweep
    presence_evictions: AtomicU64,
}

impl HubMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an opened connection
    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a closed connection
    pub fn connection_closed(&self) {
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Record an inbound frame
    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a queued push
    pub fn push_sent(&self) {
        self.pushes_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a dropped push
    pub fn push_dropped(&self) {
        self.pushes_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a malformed inbound frame
    pub fn decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record stale presence evictions
    pub fn presence_evicted(&self, count: u64) {
        self.presence_evictions.fetch_add(count, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            pushes_sent: self.pushes_sent.load(Ordering::Relaxed),
            pushes_dropped: self.pushes_dropped.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            presence_evictions: self.presence_evictions.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Connections ever established
    pub connections_total: u64,
    /// Currently open connections
    pub connections_active: u64,
    /// Inbound frames received
    pub messages_received: u64,
    /// Outbound messages queued
    pub pushes_sent: u64,
    /// Outbound messages dropped
    pub pushes_dropped: u64,
    /// Malformed inbound frames
    pub decode_failures: u64,
    /// Stale presences evicted
    pub presence_evictions: u64,
}
