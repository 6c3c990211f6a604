//! WebSocket message types, builders, and the JSON codec.

pub mod builder;
pub mod codec;
pub mod types;

pub use types::{InboundMessage, OutboundMessage};
