//! Repository Module
//!
//! CRUD operations over the SQLite tables. Handlers map [`RepoError`]
//! into the API error type at the boundary.

// Accounts
pub mod user;

// Catalog
pub mod movie;
pub mod rating;
pub mod review;
pub mod watchlist;

// Subscriptions
pub mod subscription;

// Engagement
pub mod moderation;
pub mod notification;

// Re-exports
pub use moderation::ModerationRepository;
pub use movie::MovieRepository;
pub use notification::NotificationRepository;
pub use rating::RatingRepository;
pub use review::ReviewRepository;
pub use subscription::SubscriptionRepository;
pub use user::UserRepository;
pub use watchlist::WatchlistRepository;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepoError::Duplicate(db.to_string())
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

impl From<RepoError> for shared::ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(what) => shared::ApiError::not_found(what),
            RepoError::Duplicate(what) => shared::ApiError::conflict(what),
            RepoError::Validation(msg) => shared::ApiError::validation(msg),
            RepoError::Database(msg) => shared::ApiError::database(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
