//! Convenience result type alias for DeliveryHub.

use crate::error::AppError;

/// A specialized `Result` type for DeliveryHub operations.
pub type AppResult<T> = Result<T, AppError>;
