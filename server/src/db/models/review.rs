//! Review model

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::user::UserId;

/// A written review, at most one per user per movie
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub user_id: UserId,
    pub movie_id: i64,
    pub review: String,
    pub rating: Option<i64>,
    pub created_at: DateTime<Utc>,
}
