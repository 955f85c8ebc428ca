//! Auth middleware
//!
//! Role-gating layers for the moderation and admin routers. Each layer
//! validates the bearer token, injects [`CurrentUser`] into request
//! extensions and rejects callers below the required role.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::ApiError;

use crate::auth::{CurrentUser, JwtService};
use crate::core::AppState;
use crate::security_log;

/// Validate the bearer token and inject [`CurrentUser`]
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, &req)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Moderators and admins only
pub async fn require_moderator(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, &req)?;
    if !user.can_moderate() {
        security_log!(
            "WARN",
            "moderator_required",
            user_id = user.id,
            username = user.username.clone()
        );
        return Err(ApiError::forbidden("Moderator access required"));
    }
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Admins only
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, &req)?;
    if !user.is_admin() {
        security_log!(
            "WARN",
            "admin_required",
            user_id = user.id,
            username = user.username.clone(),
            user_role = user.role.to_string()
        );
        return Err(ApiError::forbidden("Admin access required"));
    }
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

fn authenticate(state: &AppState, req: &Request) -> Result<CurrentUser, ApiError> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| ApiError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
            return Err(ApiError::unauthorized());
        }
    };

    match state.jwt_service.validate_token(token) {
        Ok(claims) => CurrentUser::try_from(claims)
            .map_err(|e| ApiError::invalid_token(format!("Malformed JWT claims: {e}"))),
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );
            match e {
                crate::auth::JwtError::ExpiredToken => Err(ApiError::token_expired()),
                _ => Err(ApiError::invalid_token("Invalid token")),
            }
        }
    }
}
