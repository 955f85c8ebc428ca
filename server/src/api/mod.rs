//! API route modules
//!
//! # Structure
//!
//! - [`health`] - health check (public)
//! - [`auth`] - signup, login, profile
//! - [`movies`] - catalog, watchlist, ratings, reviews, recommendations
//! - [`admin`] - catalog management (admin role)
//! - [`subscriptions`] - plans, plan changes, usage
//! - [`notifications`] - per-user notification feed
//! - [`moderation`] - reports, user management (moderator role)

pub mod admin;
pub mod auth;
pub mod health;
pub mod moderation;
pub mod movies;
pub mod notifications;
pub mod subscriptions;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::AppState;

/// Build a router with all routes registered
pub fn build_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(movies::router())
        .merge(admin::router(state))
        .merge(subscriptions::router())
        .merge(notifications::router())
        .merge(moderation::router(state))
}

/// Build the fully configured application with middleware and state
pub fn build_app(state: AppState) -> Router {
    build_router(&state)
        // CORS - the SPA is served from another origin in development
        .layer(CorsLayer::permissive())
        // Request tracing
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
