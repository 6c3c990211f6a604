//! # deliveryhub-core
//!
//! Core crate for DeliveryHub. Contains configuration schemas, typed
//! identifiers, the geographic position type, and the unified error system.
//!
//! This crate has **no** internal dependencies on other DeliveryHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
