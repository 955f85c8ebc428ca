//! Admin API handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::AppState;
use crate::db::models::{Movie, MovieCreate, MovieId, MovieUpdate};
use crate::db::repository::MovieRepository;
use crate::utils::{ApiError, ApiResponse, ApiResult, ok, ok_with_message, validation};

/// POST /api/admin/movies - add a catalog entry
pub async fn create_movie(
    State(state): State<AppState>,
    Json(payload): Json<MovieCreate>,
) -> ApiResult<Json<ApiResponse<Movie>>> {
    validation::validate_required_text(&payload.title, "title", validation::MAX_TITLE_LEN)?;
    if !(0.0..=10.0).contains(&payload.rating) {
        return Err(ApiError::validation("rating must be between 0 and 10"));
    }

    let movie = MovieRepository::new(state.db.clone()).create(payload).await?;
    tracing::info!(target: "catalog", movie_id = movie.id, "Movie created");
    Ok(ok(movie))
}

/// PUT /api/admin/movies/{id} - update a catalog entry
pub async fn update_movie(
    State(state): State<AppState>,
    Path(id): Path<MovieId>,
    Json(payload): Json<MovieUpdate>,
) -> ApiResult<Json<ApiResponse<Movie>>> {
    validation::validate_optional_text(&payload.title, "title", validation::MAX_TITLE_LEN)?;
    if let Some(rating) = payload.rating
        && !(0.0..=10.0).contains(&rating)
    {
        return Err(ApiError::validation("rating must be between 0 and 10"));
    }

    let movie = MovieRepository::new(state.db.clone()).update(id, payload).await?;
    Ok(ok(movie))
}

/// DELETE /api/admin/movies/{id} - soft-delete; history stays intact
pub async fn delete_movie(
    State(state): State<AppState>,
    Path(id): Path<MovieId>,
) -> ApiResult<Json<ApiResponse<bool>>> {
    MovieRepository::new(state.db.clone()).deactivate(id).await?;
    tracing::info!(target: "catalog", movie_id = id, "Movie deactivated");
    Ok(ok_with_message(true, "Movie removed from catalog"))
}
