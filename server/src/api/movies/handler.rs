//! Movie API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::{AccessReason, Entitlement, Feature};

use crate::auth::CurrentUser;
use crate::catalog::{CatalogQuery, RawCatalogParams};
use crate::core::AppState;
use crate::db::models::{Movie, MovieId, Review, WatchlistEntry};
use crate::db::repository::{
    MovieRepository, RatingRepository, ReviewRepository, UserRepository, WatchlistRepository,
};
use crate::utils::{ApiError, ApiResponse, ApiResult, PaginatedResponse, ok, ok_with_message, validation};

const DEFAULT_SHELF_SIZE: u32 = 10;
const MAX_SHELF_SIZE: u32 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct LimitParam {
    pub limit: Option<u32>,
}

impl LimitParam {
    fn resolve(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_SHELF_SIZE)
            .clamp(1, MAX_SHELF_SIZE)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    fn resolve(&self) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(crate::catalog::DEFAULT_PAGE_SIZE)
            .clamp(1, crate::catalog::MAX_PAGE_SIZE);
        (page, limit)
    }
}

/// Turn an entitlement denial into the matching API error
fn entitlement_error(result: &Entitlement) -> ApiError {
    match result.reason {
        AccessReason::Unauthenticated => ApiError::unauthorized(),
        _ => ApiError::forbidden(result.message.clone()),
    }
}

/// The user's plan as stored, not the snapshot baked into the token.
/// Entitlement gates must see an upgrade immediately.
async fn live_plan(state: &AppState, user: &CurrentUser) -> ApiResult<shared::PlanTier> {
    Ok(UserRepository::new(state.db.clone()).plan_of(user.id).await?)
}

// =============================================================================
// Catalog
// =============================================================================

/// GET /api/movies - browse the catalog with filters, sort, pagination
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<RawCatalogParams>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<Movie>>>> {
    let query = CatalogQuery::parse(params)?;
    let (movies, total) = MovieRepository::new(state.db.clone()).search(&query).await?;
    Ok(ok(PaginatedResponse::new(
        movies,
        query.page,
        query.limit,
        total,
    )))
}

/// GET /api/movies/{id} - one catalog entry; counts the view
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<MovieId>,
) -> ApiResult<Json<ApiResponse<Movie>>> {
    let repo = MovieRepository::new(state.db.clone());
    let mut movie = repo
        .find_active_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Movie"))?;

    repo.increment_views(id).await?;
    movie.views += 1;

    Ok(ok(movie))
}

/// GET /api/movies/featured - top-rated shelf
pub async fn featured(
    State(state): State<AppState>,
    Query(params): Query<LimitParam>,
) -> ApiResult<Json<ApiResponse<Vec<Movie>>>> {
    let movies = MovieRepository::new(state.db.clone())
        .featured(params.resolve())
        .await?;
    Ok(ok(movies))
}

/// GET /api/movies/genre/{genre} - catalog entries in one genre
pub async fn by_genre(
    State(state): State<AppState>,
    Path(genre): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<Movie>>>> {
    let (page, limit) = params.resolve();
    let (movies, total) = MovieRepository::new(state.db.clone())
        .by_genre(&genre, page, limit)
        .await?;
    Ok(ok(PaginatedResponse::new(movies, page, limit, total)))
}

// =============================================================================
// Recommendations
// =============================================================================

/// GET /api/movies/recommendations - personalized, plan-gated
pub async fn recommendations(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<LimitParam>,
) -> ApiResult<Json<ApiResponse<Vec<Movie>>>> {
    let plan = live_plan(&state, &user).await?;
    let access = state
        .entitlements
        .evaluate(plan, Feature::Recommendations, 0, true);
    if !access.available {
        return Err(entitlement_error(&access));
    }

    let movies = state
        .recommendations()
        .for_user(user.id, params.resolve())
        .await?;
    Ok(ok(movies))
}

/// GET /api/movies/{id}/recommendations - similar titles, public
pub async fn similar(
    State(state): State<AppState>,
    Path(id): Path<MovieId>,
    Query(params): Query<LimitParam>,
) -> ApiResult<Json<ApiResponse<Vec<Movie>>>> {
    let movie = MovieRepository::new(state.db.clone())
        .find_active_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Movie"))?;

    let movies = state
        .recommendations()
        .similar_to(&movie, params.resolve())
        .await?;
    Ok(ok(movies))
}

// =============================================================================
// Watchlist
// =============================================================================

/// GET /api/movies/watchlist - the caller's watchlist
pub async fn my_watchlist(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<ApiResponse<Vec<WatchlistEntry>>>> {
    let entries = WatchlistRepository::new(state.db.clone()).list(user.id).await?;
    Ok(ok(entries))
}

/// POST /api/movies/{id}/watchlist - save a movie, within the plan cap
pub async fn add_to_watchlist(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<MovieId>,
) -> ApiResult<Json<ApiResponse<WatchlistEntry>>> {
    let movie = MovieRepository::new(state.db.clone())
        .find_active_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Movie"))?;

    let watchlist = WatchlistRepository::new(state.db.clone());
    let current = watchlist.count(user.id).await?;

    let plan = live_plan(&state, &user).await?;
    let access = state
        .entitlements
        .evaluate(plan, Feature::WatchlistLimit, current, true);
    if !access.available {
        return Err(entitlement_error(&access));
    }

    let entry = watchlist.add(user.id, id).await?;
    state.notifier.watchlist_added(user.id, movie.id, &movie.title);

    Ok(ok_with_message(entry, "Movie added to watchlist"))
}

/// DELETE /api/movies/{id}/watchlist - idempotent removal
pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<MovieId>,
) -> ApiResult<Json<ApiResponse<bool>>> {
    let removed = WatchlistRepository::new(state.db.clone())
        .remove(user.id, id)
        .await?;
    Ok(ok_with_message(removed, "Movie removed from watchlist"))
}

// =============================================================================
// Ratings
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rating: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateResponse {
    pub rating: i64,
    pub movie_average_rating: f64,
    pub rating_count: i64,
}

/// POST /api/movies/{id}/rate - rate 1-10; re-rating updates in place.
/// Only a first rating counts against the plan cap.
pub async fn rate(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<MovieId>,
    Json(payload): Json<RateRequest>,
) -> ApiResult<Json<ApiResponse<RateResponse>>> {
    MovieRepository::new(state.db.clone())
        .find_active_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Movie"))?;

    let ratings = RatingRepository::new(state.db.clone());
    if ratings.find(user.id, id).await?.is_none() {
        let current = ratings.count(user.id).await?;
        let plan = live_plan(&state, &user).await?;
        let access = state
            .entitlements
            .evaluate(plan, Feature::RatingsLimit, current, true);
        if !access.available {
            return Err(entitlement_error(&access));
        }
    }

    let outcome = ratings.rate(user.id, id, payload.rating).await?;

    Ok(ok_with_message(
        RateResponse {
            rating: outcome.entry.rating,
            movie_average_rating: outcome.average_rating,
            rating_count: outcome.rating_count,
        },
        "Movie rated successfully",
    ))
}

// =============================================================================
// Reviews
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub review: String,
    pub rating: Option<i64>,
}

/// GET /api/movies/{id}/reviews - public, newest first
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<MovieId>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<Review>>>> {
    MovieRepository::new(state.db.clone())
        .find_active_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Movie"))?;

    let (page, limit) = params.resolve();
    let (reviews, total) = ReviewRepository::new(state.db.clone())
        .list_for_movie(id, page, limit)
        .await?;
    Ok(ok(PaginatedResponse::new(reviews, page, limit, total)))
}

/// POST /api/movies/{id}/reviews - one per movie, within the plan cap
pub async fn create_review(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<MovieId>,
    Json(payload): Json<ReviewRequest>,
) -> ApiResult<Json<ApiResponse<Review>>> {
    validation::validate_required_text(&payload.review, "review", validation::MAX_TEXT_LEN)?;
    if let Some(rating) = payload.rating
        && !(1..=10).contains(&rating)
    {
        return Err(ApiError::validation("Rating must be between 1 and 10"));
    }

    MovieRepository::new(state.db.clone())
        .find_active_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Movie"))?;

    let reviews = ReviewRepository::new(state.db.clone());
    let current = reviews.count(user.id).await?;
    let plan = live_plan(&state, &user).await?;
    let access = state
        .entitlements
        .evaluate(plan, Feature::ReviewsLimit, current, true);
    if !access.available {
        return Err(entitlement_error(&access));
    }

    let review = reviews
        .create(user.id, id, payload.review, payload.rating)
        .await?;
    Ok(ok(review))
}
