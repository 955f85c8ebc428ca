//! Auth API handlers

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{CurrentUser, hash_password, verify_password};
use crate::core::AppState;
use crate::db::models::{User, UserCreate, UserUpdate};
use crate::db::repository::UserRepository;
use crate::security_log;
use crate::utils::{ApiError, ApiResponse, ApiResult, ok, validation};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 50, message = "username must be 3-50 characters"))]
    pub username: String,
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "password must be 6-128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "first name must be 1-50 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "last name must be 1-50 characters"))]
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// POST /api/auth/signup - create an account on the free plan
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> ApiResult<Json<ApiResponse<AuthResponse>>> {
    payload
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let password_hash = hash_password(&payload.password)?;
    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .create(UserCreate {
            username: payload.username,
            email: payload.email.to_lowercase(),
            password_hash,
            first_name: payload.first_name,
            last_name: payload.last_name,
        })
        .await?;

    // Every account starts with a free/active subscription
    state.subscriptions().ensure_default(user.id).await?;
    state.notifier.welcome(user.id, &user.username);

    let token = state
        .jwt_service
        .generate_token(user.id, &user.username, user.role, user.plan)
        .map_err(|e| ApiError::internal(format!("Token generation failed: {e}")))?;

    tracing::info!(target: "auth", user_id = user.id, "Account created");
    Ok(ok(AuthResponse { token, user }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthResponse>>> {
    let repo = UserRepository::new(state.db.clone());

    let user = repo
        .find_by_email(&payload.email.to_lowercase())
        .await?
        .ok_or_else(ApiError::invalid_credentials)?;

    if !verify_password(&payload.password, &user.password_hash) {
        security_log!("WARN", "login_failed", user_id = user.id);
        return Err(ApiError::invalid_credentials());
    }

    if !user.is_active {
        security_log!("WARN", "login_suspended", user_id = user.id);
        return Err(ApiError::forbidden("Account suspended"));
    }

    repo.touch_last_login(user.id).await?;

    let token = state
        .jwt_service
        .generate_token(user.id, &user.username, user.role, user.plan)
        .map_err(|e| ApiError::internal(format!("Token generation failed: {e}")))?;

    Ok(ok(AuthResponse { token, user }))
}

/// GET /api/auth/me - current account
pub async fn me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<ApiResponse<User>>> {
    let account = UserRepository::new(state.db.clone())
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    Ok(ok(account))
}

/// PUT /api/auth/profile - update own profile
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<UserUpdate>,
) -> ApiResult<Json<ApiResponse<User>>> {
    validation::validate_optional_text(&payload.username, "username", validation::MAX_NAME_LEN)?;
    validation::validate_optional_text(
        &payload.first_name,
        "first name",
        validation::MAX_NAME_LEN,
    )?;
    validation::validate_optional_text(&payload.last_name, "last name", validation::MAX_NAME_LEN)?;

    let updated = UserRepository::new(state.db.clone())
        .update_profile(user.id, payload)
        .await?;
    Ok(ok(updated))
}
