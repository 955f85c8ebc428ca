//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserId;

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum NotificationKind {
    MovieRelease,
    SubscriptionUpdate,
    PaymentSuccess,
    PaymentFailed,
    AccountUpdate,
    SystemAnnouncement,
    Recommendation,
    WatchlistUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub priority: Priority,
    pub is_read: bool,
    pub related_movie_id: Option<i64>,
    pub related_subscription_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NotificationCreate {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub priority: Priority,
    pub related_movie_id: Option<i64>,
    pub related_subscription_id: Option<i64>,
}

impl NotificationCreate {
    pub fn new(
        user_id: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            priority: Priority::Medium,
            related_movie_id: None,
            related_subscription_id: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn about_movie(mut self, movie_id: i64) -> Self {
        self.related_movie_id = Some(movie_id);
        self
    }

    pub fn about_subscription(mut self, subscription_id: i64) -> Self {
        self.related_subscription_id = Some(subscription_id);
        self
    }
}
