//! Moderation API module
//!
//! Everything under `/api/moderation` requires the moderator role;
//! filing a report at `/api/reports` only needs a signed-in user.

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::{require_auth, require_moderator};
use crate::core::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let reports = Router::new()
        .route("/api/reports", post(handler::file_report))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .nest("/api/moderation", moderation_routes(state))
        .merge(reports)
}

fn moderation_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/stats", get(handler::stats))
        .route("/reports", get(handler::list_reports))
        .route("/reports/{id}", put(handler::handle_report))
        .route("/users", get(handler::list_users))
        .route("/users/{id}/suspend", put(handler::suspend_user))
        .route("/users/{id}/unsuspend", put(handler::unsuspend_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_moderator,
        ))
}
