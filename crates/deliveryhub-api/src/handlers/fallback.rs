//! Fallback for unmatched routes.

use axum::http::{Method, Uri};

use deliveryhub_core::error::AppError;

/// Any route not mounted by the router.
pub async fn route_not_found(method: Method, uri: Uri) -> AppError {
    AppError::not_found(format!("No route for {method} {}", uri.path()))
}
