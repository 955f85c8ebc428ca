//! Watchlist Repository

use super::{RepoError, RepoResult};
use crate::db::models::{MovieId, UserId, WatchlistEntry};
use chrono::Utc;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct WatchlistRepository {
    pool: SqlitePool,
}

impl WatchlistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a movie to a user's watchlist.
    ///
    /// A second add of the same movie is a conflict, not a silent
    /// no-op. The movie's watchlist counter moves in the same
    /// transaction as the entry.
    pub async fn add(&self, user_id: UserId, movie_id: MovieId) -> RepoResult<WatchlistEntry> {
        let mut tx = self.pool.begin().await?;

        let entry = sqlx::query_as::<_, WatchlistEntry>(
            "INSERT INTO watchlist (user_id, movie_id, added_at) VALUES (?, ?, ?) RETURNING *",
        )
        .bind(user_id)
        .bind(movie_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match RepoError::from(e) {
            RepoError::Duplicate(_) => RepoError::Duplicate("Movie already in watchlist".into()),
            other => other,
        })?;

        sqlx::query("UPDATE movies SET watchlist_count = watchlist_count + 1 WHERE id = ?")
            .bind(movie_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(entry)
    }

    /// Remove a movie from a user's watchlist. Removing an absent
    /// entry is a no-op and reports `false`.
    pub async fn remove(&self, user_id: UserId, movie_id: MovieId) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM watchlist WHERE user_id = ? AND movie_id = ?")
            .bind(user_id)
            .bind(movie_id)
            .execute(&mut *tx)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            sqlx::query(
                "UPDATE movies SET watchlist_count = MAX(0, watchlist_count - 1) WHERE id = ?",
            )
            .bind(movie_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(removed)
    }

    pub async fn list(&self, user_id: UserId) -> RepoResult<Vec<WatchlistEntry>> {
        let entries = sqlx::query_as::<_, WatchlistEntry>(
            "SELECT * FROM watchlist WHERE user_id = ? ORDER BY added_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Current watchlist size, the usage count for entitlement checks
    pub async fn count(&self, user_id: UserId) -> RepoResult<u32> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM watchlist WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u32)
    }

    pub async fn movie_ids(&self, user_id: UserId) -> RepoResult<Vec<MovieId>> {
        let ids: Vec<MovieId> =
            sqlx::query_scalar("SELECT movie_id FROM watchlist WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids)
    }
}
