//! Delivery agent presence tracking.

pub mod sweep;
pub mod tracker;

pub use tracker::{AgentPresence, PositionReport, PresenceTracker};
