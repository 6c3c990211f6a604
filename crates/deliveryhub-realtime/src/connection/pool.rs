//! Connection pool: every live connection known to the hub.

use std::collections::HashMap;

use deliveryhub_core::types::ConnectionId;

use super::handle::ConnectionHandle;

/// Pool of all live connections, owned by the hub sequencer.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    /// Connection ID → connection handle
    by_id: HashMap<ConnectionId, ConnectionHandle>,
}

impl ConnectionPool {
    /// Creates a new empty connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection. Returns the handle it replaced, if any.
    pub fn add(&mut self, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        self.by_id.insert(handle.id, handle)
    }

    /// Removes a connection from the pool.
    pub fn remove(&mut self, conn_id: &ConnectionId) -> Option<ConnectionHandle> {
        self.by_id.remove(conn_id)
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<&ConnectionHandle> {
        self.by_id.get(conn_id)
    }

    /// Gets a specific connection by ID, mutably.
    pub fn get_mut(&mut self, conn_id: &ConnectionId) -> Option<&mut ConnectionHandle> {
        self.by_id.get_mut(conn_id)
    }

    /// Whether a connection is in the pool.
    pub fn contains(&self, conn_id: &ConnectionId) -> bool {
        self.by_id.contains_key(conn_id)
    }

    /// Iterates over all connection handles.
    pub fn iter(&self) -> impl Iterator<Item = &ConnectionHandle> {
        self.by_id.values()
    }

    /// Returns total number of live connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }
}
