//! Review Repository

use super::{RepoError, RepoResult};
use crate::db::models::{MovieId, Review, UserId};
use chrono::Utc;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct ReviewRepository {
    pool: SqlitePool,
}

impl ReviewRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// One review per user per movie; a second write is a conflict
    pub async fn create(
        &self,
        user_id: UserId,
        movie_id: MovieId,
        review: String,
        rating: Option<i64>,
    ) -> RepoResult<Review> {
        let created = sqlx::query_as::<_, Review>(
            "INSERT INTO reviews (user_id, movie_id, review, rating, created_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(user_id)
        .bind(movie_id)
        .bind(review)
        .bind(rating)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match RepoError::from(e) {
            RepoError::Duplicate(_) => {
                RepoError::Duplicate("You have already reviewed this movie".to_string())
            }
            other => other,
        })?;
        Ok(created)
    }

    pub async fn list_for_movie(
        &self,
        movie_id: MovieId,
        page: u32,
        limit: u32,
    ) -> RepoResult<(Vec<Review>, u64)> {
        let offset = (page.saturating_sub(1)) * limit;
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE movie_id = ? \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(movie_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE movie_id = ?")
            .bind(movie_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((reviews, total as u64))
    }

    /// How many reviews the user has written, the usage count for
    /// entitlement checks
    pub async fn count(&self, user_id: UserId) -> RepoResult<u32> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u32)
    }
}
