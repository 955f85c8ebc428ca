//! Recommendation heuristic
//!
//! Genre affinity from the user's highly-rated movies, padded with a
//! popularity fallback:
//!
//! 1. "Liked" = ratings of 7 or above.
//! 2. Candidate pool = active movies sharing a genre with a liked
//!    movie, minus everything already rated or watchlisted.
//! 3. Sort rating DESC, views DESC, id ASC (the id key makes ties
//!    deterministic).
//! 4. Pad with globally popular movies until the requested count,
//!    skipping anything already picked or watchlisted.
//!
//! A user with no liked movies gets the popularity fallback alone.

use crate::db::models::{Movie, MovieId, UserId};
use crate::db::repository::{MovieRepository, RatingRepository, RepoResult, WatchlistRepository};
use sqlx::SqlitePool;

/// Ratings at or above this count as "liked"
pub const LIKED_RATING_THRESHOLD: i64 = 7;

#[derive(Clone)]
pub struct RecommendationService {
    movies: MovieRepository,
    ratings: RatingRepository,
    watchlist: WatchlistRepository,
}

impl RecommendationService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            movies: MovieRepository::new(pool.clone()),
            ratings: RatingRepository::new(pool.clone()),
            watchlist: WatchlistRepository::new(pool),
        }
    }

    /// Top `limit` recommendations for a user
    pub async fn for_user(&self, user_id: UserId, limit: u32) -> RepoResult<Vec<Movie>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let rated = self.ratings.rated_movie_ids(user_id).await?;
        let liked = self
            .ratings
            .liked_movie_ids(user_id, LIKED_RATING_THRESHOLD)
            .await?;
        let watchlisted = self.watchlist.movie_ids(user_id).await?;

        let mut picks: Vec<Movie> = Vec::new();

        if !liked.is_empty() {
            let preferred_genres = self.movies.genres_of(&liked).await?;

            let mut exclude: Vec<MovieId> = rated.clone();
            exclude.extend(watchlisted.iter().copied());
            exclude.sort_unstable();
            exclude.dedup();

            picks = self
                .movies
                .by_genres_excluding(&preferred_genres, &exclude, limit)
                .await?;
        }

        if (picks.len() as u32) < limit {
            // Fallback keeps out what was already picked or watchlisted;
            // rated movies are fair game here
            let mut exclude: Vec<MovieId> = picks.iter().map(|m| m.id).collect();
            exclude.extend(watchlisted.iter().copied());
            exclude.sort_unstable();
            exclude.dedup();

            let remaining = limit - picks.len() as u32;
            let fallback = self.movies.popular_excluding(&exclude, remaining).await?;
            picks.extend(fallback);
        }

        picks.truncate(limit as usize);
        Ok(picks)
    }

    /// Movies similar to one catalog entry, for the detail page
    pub async fn similar_to(&self, movie: &Movie, limit: u32) -> RepoResult<Vec<Movie>> {
        self.movies.similar_to(movie, limit).await
    }
}
