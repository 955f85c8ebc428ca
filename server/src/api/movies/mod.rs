//! Movie API module
//!
//! Catalog browsing is public; watchlist, ratings, reviews and
//! recommendations need a signed-in user (enforced by the
//! `CurrentUser` extractor on those handlers).

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/movies", movie_routes())
}

fn movie_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/featured", get(handler::featured))
        .route("/watchlist", get(handler::my_watchlist))
        .route("/recommendations", get(handler::recommendations))
        .route("/genre/{genre}", get(handler::by_genre))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/recommendations", get(handler::similar))
        .route(
            "/{id}/watchlist",
            post(handler::add_to_watchlist).delete(handler::remove_from_watchlist),
        )
        .route("/{id}/rate", post(handler::rate))
        .route(
            "/{id}/reviews",
            get(handler::list_reviews).post(handler::create_review),
        )
}
