//! Subscription API module

mod handler;

use axum::{
    Router,
    routing::{delete, get, put},
};

use crate::core::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/subscriptions", subscription_routes())
}

fn subscription_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(handler::my_subscription))
        .route("/plans", get(handler::plans))
        .route("/plan", put(handler::change_plan))
        .route("/cancel", delete(handler::cancel))
        .route("/usage", get(handler::usage))
        .route("/features/{feature}", get(handler::feature_access))
}
