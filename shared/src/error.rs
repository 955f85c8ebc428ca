//! Unified error handling
//!
//! Application-wide error type and response mapping. Every variant maps
//! to an HTTP status and a stable `Exxxx` code; handlers build errors
//! through the lowercase constructors (`ApiError::not_found(...)`) and
//! return them with `?`.
//!
//! Anticipated access-control outcomes (plan restricted, limit reached)
//! are NOT errors — the entitlement evaluator returns those as values.
//! This type covers faults: bad input, missing resources, conflicting
//! writes, invalid state transitions, and system failures.

use crate::response::ApiResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// Standard API error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// Success
    Success,
    /// Validation error (400)
    Validation,
    /// Invalid request (400)
    Invalid,
    /// Authentication required (401)
    Unauthorized,
    /// Invalid token (401)
    InvalidToken,
    /// Token expired (401)
    TokenExpired,
    /// Permission denied (403)
    Forbidden,
    /// Resource not found (404)
    NotFound,
    /// Resource already exists (409)
    Conflict,
    /// Invalid lifecycle transition (422)
    InvalidState,
    /// Broken configuration (500)
    Configuration,
    /// Database error (500)
    Database,
    /// Internal server error (500)
    Internal,
}

impl ApiErrorCode {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,
            Self::Validation | Self::Invalid => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::InvalidToken | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::InvalidState => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Configuration | Self::Database | Self::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Success => "E0000",
            Self::Validation => "E0002",
            Self::NotFound => "E0003",
            Self::Conflict => "E0004",
            Self::InvalidState => "E0005",
            Self::Invalid => "E0006",
            Self::Forbidden => "E2001",
            Self::Unauthorized => "E3001",
            Self::InvalidToken => "E3002",
            Self::TokenExpired => "E3003",
            Self::Internal => "E9001",
            Self::Database => "E9002",
            Self::Configuration => "E9003",
        }
    }
}

/// Unified application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // ========== Authentication Errors ==========
    #[error("Authentication required")]
    Unauthorized,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    // ========== Business Logic Errors ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid state transition: {0}")]
    InvalidState(String),

    #[error("Invalid request: {0}")]
    Invalid(String),

    // ========== System Errors ==========
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    // ========== Helper Constructors ==========

    pub fn unauthorized() -> Self {
        Self::Unauthorized
    }

    pub fn token_expired() -> Self {
        Self::TokenExpired
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Uniform message for failed logins, to prevent username enumeration
    pub fn invalid_credentials() -> Self {
        Self::Invalid("Invalid email or password".to_string())
    }

    /// Classification code for this error
    pub fn error_code(&self) -> ApiErrorCode {
        match self {
            Self::Unauthorized => ApiErrorCode::Unauthorized,
            Self::TokenExpired => ApiErrorCode::TokenExpired,
            Self::InvalidToken(_) => ApiErrorCode::InvalidToken,
            Self::Forbidden(_) => ApiErrorCode::Forbidden,
            Self::NotFound(_) => ApiErrorCode::NotFound,
            Self::Conflict(_) => ApiErrorCode::Conflict,
            Self::Validation(_) => ApiErrorCode::Validation,
            Self::InvalidState(_) => ApiErrorCode::InvalidState,
            Self::Invalid(_) => ApiErrorCode::Invalid,
            Self::Configuration(_) => ApiErrorCode::Configuration,
            Self::Database(_) => ApiErrorCode::Database,
            Self::Internal(_) => ApiErrorCode::Internal,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.error_code();

        // Client-facing message; 5xx details stay in the logs
        let message = match &self {
            ApiError::Unauthorized => "Please sign in first".to_string(),
            ApiError::TokenExpired => "Token expired".to_string(),
            ApiError::InvalidToken(_) => "Invalid token".to_string(),
            ApiError::Forbidden(msg) => msg.clone(),
            ApiError::NotFound(resource) => format!("{resource} not found"),
            ApiError::Conflict(msg) => msg.clone(),
            ApiError::Validation(msg)
            | ApiError::InvalidState(msg)
            | ApiError::Invalid(msg) => msg.clone(),
            ApiError::Configuration(msg) => {
                error!(target: "config", error = %msg, "Configuration error");
                "Internal server error".to_string()
            }
            ApiError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                "Database error".to_string()
            }
            ApiError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                "Internal server error".to_string()
            }
        };

        let body = Json(ApiResponse::<()>::error(code.code(), message));
        (code.status_code(), body).into_response()
    }
}

impl From<crate::permissions::TableError> for ApiError {
    fn from(e: crate::permissions::TableError) -> Self {
        ApiError::Configuration(e.to_string())
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
