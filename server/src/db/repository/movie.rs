//! Movie Repository

use super::{RepoError, RepoResult};
use crate::catalog::{CatalogQuery, SortOrder};
use crate::db::models::{Movie, MovieCreate, MovieId, MovieStatus, MovieUpdate};
use chrono::Utc;
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

#[derive(Clone)]
pub struct MovieRepository {
    pool: SqlitePool,
}

impl MovieRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a catalog entry
    pub async fn create(&self, data: MovieCreate) -> RepoResult<Movie> {
        let now = Utc::now();
        let movie = sqlx::query_as::<_, Movie>(
            "INSERT INTO movies \
               (title, description, director, genres, cast_list, year, rating, status, poster, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING *",
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.director)
        .bind(Json(data.genres))
        .bind(Json(data.cast))
        .bind(data.year)
        .bind(data.rating)
        .bind(data.status.unwrap_or(MovieStatus::Released))
        .bind(data.poster)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(movie)
    }

    /// Update a catalog entry
    pub async fn update(&self, id: MovieId, data: MovieUpdate) -> RepoResult<Movie> {
        let mut set_parts: Vec<&str> = Vec::new();
        if data.title.is_some() {
            set_parts.push("title = ?");
        }
        if data.description.is_some() {
            set_parts.push("description = ?");
        }
        if data.director.is_some() {
            set_parts.push("director = ?");
        }
        if data.genres.is_some() {
            set_parts.push("genres = ?");
        }
        if data.cast.is_some() {
            set_parts.push("cast_list = ?");
        }
        if data.year.is_some() {
            set_parts.push("year = ?");
        }
        if data.rating.is_some() {
            set_parts.push("rating = ?");
        }
        if data.status.is_some() {
            set_parts.push("status = ?");
        }
        if data.poster.is_some() {
            set_parts.push("poster = ?");
        }
        if data.is_active.is_some() {
            set_parts.push("is_active = ?");
        }

        if set_parts.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Movie {id}")));
        }

        let sql = format!(
            "UPDATE movies SET {}, updated_at = ? WHERE id = ? RETURNING *",
            set_parts.join(", ")
        );

        let mut query = sqlx::query_as::<_, Movie>(&sql);
        if let Some(v) = data.title {
            query = query.bind(v);
        }
        if let Some(v) = data.description {
            query = query.bind(v);
        }
        if let Some(v) = data.director {
            query = query.bind(v);
        }
        if let Some(v) = data.genres {
            query = query.bind(Json(v));
        }
        if let Some(v) = data.cast {
            query = query.bind(Json(v));
        }
        if let Some(v) = data.year {
            query = query.bind(v);
        }
        if let Some(v) = data.rating {
            query = query.bind(v);
        }
        if let Some(v) = data.status {
            query = query.bind(v);
        }
        if let Some(v) = data.poster {
            query = query.bind(v);
        }
        if let Some(v) = data.is_active {
            query = query.bind(v);
        }

        query
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Movie {id}")))
    }

    pub async fn find_by_id(&self, id: MovieId) -> RepoResult<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>("SELECT * FROM movies WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(movie)
    }

    /// Find a movie the catalog still shows. Deactivated entries read
    /// as missing.
    pub async fn find_active_by_id(&self, id: MovieId) -> RepoResult<Option<Movie>> {
        let movie =
            sqlx::query_as::<_, Movie>("SELECT * FROM movies WHERE id = ? AND is_active = 1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(movie)
    }

    /// Soft-delete: the row stays for watchlists and ratings history
    pub async fn deactivate(&self, id: MovieId) -> RepoResult<()> {
        let result = sqlx::query("UPDATE movies SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("Movie {id}")));
        }
        Ok(())
    }

    pub async fn increment_views(&self, id: MovieId) -> RepoResult<()> {
        sqlx::query("UPDATE movies SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Run a catalog query: filters, sort, pagination. Returns the page
    /// plus the total match count.
    pub async fn search(&self, query: &CatalogQuery) -> RepoResult<(Vec<Movie>, u64)> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM movies WHERE is_active = 1");
        query.push_filters(&mut qb);

        let direction = match query.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        qb.push(format!(
            " ORDER BY {col} {dir}, id {dir} LIMIT ",
            col = query.sort.column(),
            dir = direction
        ))
        .push_bind(query.limit as i64)
        .push(" OFFSET ")
        .push_bind(query.offset() as i64);

        let movies = qb.build_query_as::<Movie>().fetch_all(&self.pool).await?;

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM movies WHERE is_active = 1");
        query.push_filters(&mut count_qb);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok((movies, total as u64))
    }

    /// Highest-rated active movies, editorial rating first then views
    pub async fn featured(&self, limit: u32) -> RepoResult<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(
            "SELECT * FROM movies WHERE is_active = 1 \
             ORDER BY rating DESC, views DESC, id ASC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(movies)
    }

    /// Active movies carrying a genre, best rated first
    pub async fn by_genre(
        &self,
        genre: &str,
        page: u32,
        limit: u32,
    ) -> RepoResult<(Vec<Movie>, u64)> {
        let offset = (page.saturating_sub(1)) * limit;
        let movies = sqlx::query_as::<_, Movie>(
            "SELECT * FROM movies WHERE is_active = 1 \
               AND EXISTS (SELECT 1 FROM json_each(movies.genres) WHERE json_each.value = ?) \
             ORDER BY rating DESC, id ASC LIMIT ? OFFSET ?",
        )
        .bind(genre.to_string())
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM movies WHERE is_active = 1 \
               AND EXISTS (SELECT 1 FROM json_each(movies.genres) WHERE json_each.value = ?)",
        )
        .bind(genre.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok((movies, total as u64))
    }

    /// Active movies sharing at least one of `genres`, excluding the
    /// given ids. Ordered rating DESC, views DESC, id ASC so ties are
    /// deterministic.
    pub async fn by_genres_excluding(
        &self,
        genres: &[String],
        exclude: &[MovieId],
        limit: u32,
    ) -> RepoResult<Vec<Movie>> {
        if genres.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT * FROM movies WHERE is_active = 1 \
               AND EXISTS (SELECT 1 FROM json_each(movies.genres) WHERE json_each.value IN (",
        );
        let mut separated = qb.separated(", ");
        for genre in genres {
            separated.push_bind(genre.clone());
        }
        qb.push("))");
        push_exclusions(&mut qb, exclude);
        qb.push(" ORDER BY rating DESC, views DESC, id ASC LIMIT ")
            .push_bind(limit as i64);

        let movies = qb.build_query_as::<Movie>().fetch_all(&self.pool).await?;
        Ok(movies)
    }

    /// Globally popular active movies, excluding the given ids
    pub async fn popular_excluding(
        &self,
        exclude: &[MovieId],
        limit: u32,
    ) -> RepoResult<Vec<Movie>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM movies WHERE is_active = 1");
        push_exclusions(&mut qb, exclude);
        qb.push(" ORDER BY rating DESC, views DESC, id ASC LIMIT ")
            .push_bind(limit as i64);

        let movies = qb.build_query_as::<Movie>().fetch_all(&self.pool).await?;
        Ok(movies)
    }

    /// Union of the genres carried by the given movies, sorted for
    /// deterministic downstream queries
    pub async fn genres_of(&self, ids: &[MovieId]) -> RepoResult<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT DISTINCT json_each.value FROM movies, json_each(movies.genres) \
             WHERE movies.id IN (",
        );
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        qb.push(") ORDER BY json_each.value");

        let genres: Vec<String> = qb.build_query_scalar().fetch_all(&self.pool).await?;
        Ok(genres)
    }

    /// Movies similar to one catalog entry: shared genre, the entry
    /// itself excluded, community rating first
    pub async fn similar_to(&self, movie: &Movie, limit: u32) -> RepoResult<Vec<Movie>> {
        if movie.genres.0.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT * FROM movies WHERE is_active = 1 \
               AND EXISTS (SELECT 1 FROM json_each(movies.genres) WHERE json_each.value IN (",
        );
        let mut separated = qb.separated(", ");
        for genre in movie.genres.0.iter() {
            separated.push_bind(genre.clone());
        }
        qb.push("))");
        qb.push(" AND id != ").push_bind(movie.id);
        qb.push(" ORDER BY average_rating DESC, views DESC, id ASC LIMIT ")
            .push_bind(limit as i64);

        let movies = qb.build_query_as::<Movie>().fetch_all(&self.pool).await?;
        Ok(movies)
    }
}

fn push_exclusions(qb: &mut QueryBuilder<'_, Sqlite>, exclude: &[MovieId]) {
    if exclude.is_empty() {
        return;
    }
    qb.push(" AND id NOT IN (");
    let mut separated = qb.separated(", ");
    for id in exclude {
        separated.push_bind(*id);
    }
    qb.push(")");
}
