//! Utility module
//!
//! - Error and response types re-exported from `shared`
//! - Logging setup
//! - Validation helpers

pub mod logger;
pub mod validation;

use axum::Json;
use serde::Serialize;

// Re-export the unified API types
pub use shared::{ApiError, ApiResponse, ApiResult, PaginatedResponse};

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok(data))
}

/// Create a successful response with custom message
pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok_with_message(data, message))
}
