//! Rating Repository

use super::{RepoError, RepoResult};
use crate::db::models::{MovieId, RatingEntry, UserId};
use chrono::Utc;
use sqlx::SqlitePool;

/// A rating write plus the aggregates it produced
#[derive(Debug, Clone)]
pub struct RatingOutcome {
    pub entry: RatingEntry,
    /// Whether this was the user's first rating of the movie
    pub was_new: bool,
    pub average_rating: f64,
    pub rating_count: i64,
}

#[derive(Clone)]
pub struct RatingRepository {
    pool: SqlitePool,
}

impl RatingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert a user's rating and recompute the movie's aggregates.
    ///
    /// The entry write, the counter bump and the average recompute all
    /// happen in one transaction. The average is the plain mean of all
    /// ratings on the movie, rounded to one decimal. Under concurrent
    /// raters SQLite serializes the writes, so the last commit always
    /// sees every prior rating.
    pub async fn rate(
        &self,
        user_id: UserId,
        movie_id: MovieId,
        rating: i64,
    ) -> RepoResult<RatingOutcome> {
        if !(1..=10).contains(&rating) {
            return Err(RepoError::Validation(
                "Rating must be between 1 and 10".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM ratings WHERE user_id = ? AND movie_id = ?")
                .bind(user_id)
                .bind(movie_id)
                .fetch_optional(&mut *tx)
                .await?;
        let was_new = existing.is_none();

        let entry = sqlx::query_as::<_, RatingEntry>(
            "INSERT INTO ratings (user_id, movie_id, rating, rated_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT(user_id, movie_id) \
             DO UPDATE SET rating = excluded.rating, rated_at = excluded.rated_at \
             RETURNING *",
        )
        .bind(user_id)
        .bind(movie_id)
        .bind(rating)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        if was_new {
            sqlx::query("UPDATE movies SET rating_count = rating_count + 1 WHERE id = ?")
                .bind(movie_id)
                .execute(&mut *tx)
                .await?;
        }

        let average: f64 =
            sqlx::query_scalar("SELECT AVG(rating) FROM ratings WHERE movie_id = ?")
                .bind(movie_id)
                .fetch_one(&mut *tx)
                .await?;
        let average_rating = (average * 10.0).round() / 10.0;

        sqlx::query("UPDATE movies SET average_rating = ? WHERE id = ?")
            .bind(average_rating)
            .bind(movie_id)
            .execute(&mut *tx)
            .await?;

        let rating_count: i64 =
            sqlx::query_scalar("SELECT rating_count FROM movies WHERE id = ?")
                .bind(movie_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(RatingOutcome {
            entry,
            was_new,
            average_rating,
            rating_count,
        })
    }

    pub async fn list(&self, user_id: UserId) -> RepoResult<Vec<RatingEntry>> {
        let entries = sqlx::query_as::<_, RatingEntry>(
            "SELECT * FROM ratings WHERE user_id = ? ORDER BY rated_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    pub async fn find(
        &self,
        user_id: UserId,
        movie_id: MovieId,
    ) -> RepoResult<Option<RatingEntry>> {
        let entry = sqlx::query_as::<_, RatingEntry>(
            "SELECT * FROM ratings WHERE user_id = ? AND movie_id = ?",
        )
        .bind(user_id)
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    /// How many movies the user has rated, the usage count for
    /// entitlement checks
    pub async fn count(&self, user_id: UserId) -> RepoResult<u32> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ratings WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u32)
    }

    pub async fn rated_movie_ids(&self, user_id: UserId) -> RepoResult<Vec<MovieId>> {
        let ids: Vec<MovieId> =
            sqlx::query_scalar("SELECT movie_id FROM ratings WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids)
    }

    /// Movies the user rated at or above `threshold`
    pub async fn liked_movie_ids(
        &self,
        user_id: UserId,
        threshold: i64,
    ) -> RepoResult<Vec<MovieId>> {
        let ids: Vec<MovieId> =
            sqlx::query_scalar("SELECT movie_id FROM ratings WHERE user_id = ? AND rating >= ?")
                .bind(user_id)
                .bind(threshold)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids)
    }
}
