//! Admin API module
//!
//! Catalog management, admin role required.

mod handler;

use axum::{
    Router, middleware,
    routing::{post, put},
};

use crate::auth::require_admin;
use crate::core::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new().nest("/api/admin", admin_routes(state))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/movies", post(handler::create_movie))
        .route(
            "/movies/{id}",
            put(handler::update_movie).delete(handler::delete_movie),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ))
}
