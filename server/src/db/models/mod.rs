//! Database models
//!
//! Row structs plus the Create/Update payloads the repositories accept.

pub mod moderation;
pub mod movie;
pub mod notification;
pub mod review;
pub mod subscription;
pub mod user;

// Re-exports
pub use moderation::{
    ContentReport, ContentReportCreate, ModerationAction, ModerationActionKind, ReportStatus,
};
pub use movie::{Movie, MovieCreate, MovieId, MovieStatus, MovieUpdate};
pub use notification::{Notification, NotificationCreate, NotificationKind, Priority};
pub use review::Review;
pub use subscription::Subscription;
pub use user::{RatingEntry, User, UserCreate, UserId, UserRole, UserUpdate, WatchlistEntry};
