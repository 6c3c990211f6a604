//! # deliveryhub-api
//!
//! HTTP API layer for DeliveryHub built on Axum.
//!
//! Provides the WebSocket upgrade that feeds the realtime hub, an event
//! ingest endpoint for the upstream order service, health and stats
//! endpoints, and the CORS/logging middleware stack.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server, serve};
pub use state::AppState;
