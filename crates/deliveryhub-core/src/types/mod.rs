//! Shared domain types.

pub mod geo;
pub mod id;

pub use geo::Position;
pub use id::{AgentId, ConnectionId, CustomerId, OrderId, RestaurantId};
