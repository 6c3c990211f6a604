//! Restaurant subscriptions: any number of connections per restaurant.
//!
//! Only consulted when restaurant updates are scoped to subscribers.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use deliveryhub_core::types::{ConnectionId, RestaurantId};

/// Tracks which connections follow which restaurants (with reverse index).
#[derive(Debug, Default)]
pub struct RestaurantSubscriptions {
    /// Restaurant ID → subscribed connections
    channels: HashMap<RestaurantId, HashSet<ConnectionId>>,
    /// Connection ID → followed restaurants
    by_connection: HashMap<ConnectionId, HashSet<RestaurantId>>,
}

impl RestaurantSubscriptions {
    /// Creates an empty subscription set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscriber. Returns `false` if it was already subscribed.
    pub fn subscribe(&mut self, restaurant_id: RestaurantId, connection_id: ConnectionId) -> bool {
        self.by_connection
            .entry(connection_id)
            .or_default()
            .insert(restaurant_id.clone());
        self.channels
            .entry(restaurant_id)
            .or_default()
            .insert(connection_id)
    }

    /// Removes one subscription.
    pub fn unsubscribe(&mut self, restaurant_id: &RestaurantId, connection_id: ConnectionId) {
        self.detach(restaurant_id, connection_id);
        if let Entry::Occupied(mut restaurants) = self.by_connection.entry(connection_id) {
            restaurants.get_mut().remove(restaurant_id);
            if restaurants.get().is_empty() {
                restaurants.remove();
            }
        }
    }

    /// Removes every subscription of a connection.
    pub fn remove(&mut self, connection_id: ConnectionId) -> Vec<RestaurantId> {
        let restaurants = self
            .by_connection
            .remove(&connection_id)
            .unwrap_or_default();
        for restaurant_id in &restaurants {
            self.detach(restaurant_id, connection_id);
        }
        restaurants.into_iter().collect()
    }

    /// Returns all subscribers of a restaurant.
    pub fn subscribers(&self, restaurant_id: &RestaurantId) -> Vec<ConnectionId> {
        self.channels
            .get(restaurant_id)
            .map(|subs| subs.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Restaurants a connection follows.
    pub fn restaurants_for(&self, connection_id: ConnectionId) -> Vec<RestaurantId> {
        self.by_connection
            .get(&connection_id)
            .map(|restaurants| restaurants.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of restaurants with at least one subscriber.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no restaurant has subscribers.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    fn detach(&mut self, restaurant_id: &RestaurantId, connection_id: ConnectionId) {
        if let Some(subs) = self.channels.get_mut(restaurant_id) {
            subs.remove(&connection_id);
            if subs.is_empty() {
                self.channels.remove(restaurant_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_subscribers() {
        let mut subs = RestaurantSubscriptions::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let r = RestaurantId::from("R1");

        assert!(subs.subscribe(r.clone(), a));
        assert!(subs.subscribe(r.clone(), b));
        assert!(!subs.subscribe(r.clone(), b));

        let mut got = subs.subscribers(&r);
        got.sort();
        let mut want = vec![a, b];
        want.sort();
        assert_eq!(got, want);
    }

    #[test]
    fn test_remove_connection_cleans_empty_channels() {
        let mut subs = RestaurantSubscriptions::new();
        let a = ConnectionId::new();

        subs.subscribe(RestaurantId::from("R1"), a);
        subs.subscribe(RestaurantId::from("R2"), a);
        assert_eq!(subs.remove(a).len(), 2);
        assert!(subs.is_empty());
        assert!(subs.remove(a).is_empty());
    }

    #[test]
    fn test_unsubscribe_single() {
        let mut subs = RestaurantSubscriptions::new();
        let a = ConnectionId::new();
        let r1 = RestaurantId::from("R1");

        subs.subscribe(r1.clone(), a);
        subs.subscribe(RestaurantId::from("R2"), a);
        subs.unsubscribe(&r1, a);

        assert!(subs.subscribers(&r1).is_empty());
        assert_eq!(subs.remove(a), vec![RestaurantId::from("R2")]);
    }
}
