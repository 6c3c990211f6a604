//! # deliveryhub-realtime
//!
//! Real-time hub for DeliveryHub. Provides:
//!
//! - Connection registries keyed by agent or order, with reverse indices
//!   for constant-time disconnect cleanup
//! - Delivery agent presence tracking (last known position per agent)
//! - Order watch subscriptions (latest watcher wins) and optional
//!   restaurant subscriptions
//! - Event routing: position, order status, and payment fan-out
//! - A single sequencer task that serializes every registry mutation

pub mod connection;
pub mod message;
pub mod metrics;
pub mod presence;
pub mod registry;
pub mod router;
pub mod server;
pub mod state;
pub mod subscription;

pub use connection::lifecycle::ConnectionLifecycleManager;
pub use message::{InboundMessage, OutboundMessage};
pub use presence::tracker::PresenceTracker;
pub use registry::ConnectionRegistry;
pub use router::EventRouter;
pub use server::{ConnectionSummary, HubHandle, HubSnapshot, RealtimeHub};
pub use subscription::tracker::SubscriptionTracker;
