//! Connection registry: logical key → owning connection, plus the reverse
//! index connection → keys.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use deliveryhub_core::types::ConnectionId;

/// A value registered under a key, together with the connection that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration<V> {
    /// Connection currently representing the key
    pub connection_id: ConnectionId,
    /// Tracker-specific payload
    pub value: V,
}

/// Maps each key to exactly one connection.
///
/// The reverse index always mirrors `by_key`: a connection appears in
/// `by_connection` only while it owns at least one key.
#[derive(Debug)]
pub struct ConnectionRegistry<K, V> {
    by_key: HashMap<K, Registration<V>>,
    by_connection: HashMap<ConnectionId, HashSet<K>>,
}

impl<K, V> ConnectionRegistry<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            by_key: HashMap::new(),
            by_connection: HashMap::new(),
        }
    }

    /// Registers `value` under `key` for `connection_id`, replacing whatever
    /// was there. Returns the previous registration.
    pub fn upsert(
        &mut self,
        key: K,
        connection_id: ConnectionId,
        value: V,
    ) -> Option<Registration<V>> {
        let previous = self.by_key.insert(
            key.clone(),
            Registration {
                connection_id,
                value,
            },
        );

        if let Some(prev) = &previous {
            if prev.connection_id != connection_id {
                self.unlink(prev.connection_id, &key);
            }
        }

        self.by_connection
            .entry(connection_id)
            .or_default()
            .insert(key);

        previous
    }

    /// Looks up the registration for a key.
    pub fn get(&self, key: &K) -> Option<&Registration<V>> {
        self.by_key.get(key)
    }

    /// Returns the connection owning a key.
    pub fn connection_for(&self, key: &K) -> Option<ConnectionId> {
        self.by_key.get(key).map(|r| r.connection_id)
    }

    /// Removes a single key.
    pub fn remove(&mut self, key: &K) -> Option<Registration<V>> {
        let removed = self.by_key.remove(key)?;
        self.unlink(removed.connection_id, key);
        Some(removed)
    }

    /// Removes every key owned by a connection.
    pub fn remove_connection(&mut self, connection_id: ConnectionId) -> Vec<(K, V)> {
        let Some(keys) = self.by_connection.remove(&connection_id) else {
            return Vec::new();
        };

        keys.into_iter()
            .filter_map(|key| self.by_key.remove(&key).map(|reg| (key, reg.value)))
            .collect()
    }

    /// Keys currently owned by a connection.
    pub fn keys_for(&self, connection_id: ConnectionId) -> Vec<K> {
        self.by_connection
            .get(&connection_id)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Iterates over all registrations.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Registration<V>)> {
        self.by_key.iter()
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Number of distinct connections owning at least one key.
    pub fn connection_count(&self) -> usize {
        self.by_connection.len()
    }

    fn unlink(&mut self, connection_id: ConnectionId, key: &K) {
        if let Entry::Occupied(mut keys) = self.by_connection.entry(connection_id) {
            keys.get_mut().remove(key);
            if keys.get().is_empty() {
                keys.remove();
            }
        }
    }
}

impl<K, V> Default for ConnectionRegistry<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
