//! Subscription Repository
//!
//! Reads and the initial insert. Lifecycle transitions live in
//! `subscriptions::SubscriptionService`, which needs to write the
//! subscription row and the user's denormalized plan in one
//! transaction.

use super::{RepoError, RepoResult};
use crate::db::models::{Subscription, UserId};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: SqlitePool,
}

impl SubscriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the free/active subscription every account starts with.
    /// Does nothing if the user already has one.
    pub async fn ensure_default(&self, user_id: UserId) -> RepoResult<Subscription> {
        if let Some(existing) = self.find_by_user(user_id).await? {
            return Ok(existing);
        }

        let now = Utc::now();
        let created = sqlx::query_as::<_, Subscription>(
            "INSERT INTO subscriptions \
               (user_id, plan, status, amount_cents, start_date, auto_renew, cancel_at_period_end, created_at, updated_at) \
             VALUES (?, 'free', 'active', 0, ?, 1, 0, ?, ?) \
             RETURNING *",
        )
        .bind(user_id)
        .bind(now)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match created {
            Ok(subscription) => Ok(subscription),
            Err(e) => match RepoError::from(e) {
                // Lost a race with another request creating it; read theirs
                RepoError::Duplicate(_) => self
                    .find_by_user(user_id)
                    .await?
                    .ok_or_else(|| RepoError::NotFound(format!("Subscription for user {user_id}"))),
                other => Err(other),
            },
        }
    }

    pub async fn find_by_user(&self, user_id: UserId) -> RepoResult<Option<Subscription>> {
        let subscription =
            sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(subscription)
    }

    /// Paid, still-active subscriptions whose period has ended and that
    /// must not roll over: either flagged for period-end cancellation
    /// or with auto-renew off
    pub async fn due_for_downgrade(&self, now: DateTime<Utc>) -> RepoResult<Vec<Subscription>> {
        let due = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions \
             WHERE plan != 'free' AND status = 'active' AND end_date IS NOT NULL AND end_date <= ? \
               AND (cancel_at_period_end = 1 OR auto_renew = 0)",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(due)
    }
}
