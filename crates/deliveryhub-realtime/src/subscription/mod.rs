//! Order watch and restaurant subscriptions.

pub mod restaurant;
pub mod tracker;

pub use restaurant::RestaurantSubscriptions;
pub use tracker::{OrderWatch, SubscriptionTracker};
