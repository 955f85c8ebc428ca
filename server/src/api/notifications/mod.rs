//! Notification API module

mod handler;

use axum::{
    Router,
    routing::{delete, get, put},
};

use crate::core::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/notifications", notification_routes())
}

fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/read-all", put(handler::mark_all_read))
        .route("/{id}/read", put(handler::mark_read))
        .route("/{id}", delete(handler::remove))
}
