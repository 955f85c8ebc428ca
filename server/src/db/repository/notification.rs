//! Notification Repository

use super::RepoResult;
use crate::db::models::{Notification, NotificationCreate, UserId};
use chrono::Utc;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, data: NotificationCreate) -> RepoResult<Notification> {
        let created = sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications \
               (user_id, kind, title, message, priority, is_read, related_movie_id, related_subscription_id, created_at) \
             VALUES (?, ?, ?, ?, ?, 0, ?, ?, ?) \
             RETURNING *",
        )
        .bind(data.user_id)
        .bind(data.kind)
        .bind(data.title)
        .bind(data.message)
        .bind(data.priority)
        .bind(data.related_movie_id)
        .bind(data.related_subscription_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// Newest first; optionally only unread
    pub async fn list(
        &self,
        user_id: UserId,
        unread_only: bool,
        page: u32,
        limit: u32,
    ) -> RepoResult<(Vec<Notification>, u64)> {
        let offset = (page.saturating_sub(1)) * limit;

        let (rows_sql, count_sql) = if unread_only {
            (
                "SELECT * FROM notifications WHERE user_id = ? AND is_read = 0 \
                 ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
            )
        } else {
            (
                "SELECT * FROM notifications WHERE user_id = ? \
                 ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                "SELECT COUNT(*) FROM notifications WHERE user_id = ?",
            )
        };

        let notifications = sqlx::query_as::<_, Notification>(rows_sql)
            .bind(user_id)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(count_sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((notifications, total as u64))
    }

    pub async fn unread_count(&self, user_id: UserId) -> RepoResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }

    /// Mark one of the user's notifications read; false when it is not
    /// theirs or does not exist
    pub async fn mark_read(&self, user_id: UserId, id: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_read(&self, user_id: UserId) -> RepoResult<u64> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(&self, user_id: UserId, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
