//! Notification API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::core::AppState;
use crate::db::models::Notification;
use crate::db::repository::NotificationRepository;
use crate::utils::{ApiError, ApiResponse, ApiResult, PaginatedResponse, ok, ok_with_message};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeed {
    #[serde(flatten)]
    pub page: PaginatedResponse<Notification>,
    pub unread_count: u64,
}

/// GET /api/notifications - newest first, with the unread badge count
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ApiResponse<NotificationFeed>>> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    let repo = NotificationRepository::new(state.db.clone());
    let (notifications, total) = repo
        .list(user.id, params.unread_only, page, limit)
        .await?;
    let unread_count = repo.unread_count(user.id).await?;

    Ok(ok(NotificationFeed {
        page: PaginatedResponse::new(notifications, page, limit, total),
        unread_count,
    }))
}

/// PUT /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiResponse<bool>>> {
    let marked = NotificationRepository::new(state.db.clone())
        .mark_read(user.id, id)
        .await?;
    if !marked {
        return Err(ApiError::not_found("Notification"));
    }
    Ok(ok(true))
}

/// PUT /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<ApiResponse<u64>>> {
    let marked = NotificationRepository::new(state.db.clone())
        .mark_all_read(user.id)
        .await?;
    Ok(ok_with_message(marked, "All notifications marked read"))
}

/// DELETE /api/notifications/{id}
pub async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiResponse<bool>>> {
    let deleted = NotificationRepository::new(state.db.clone())
        .delete(user.id, id)
        .await?;
    if !deleted {
        return Err(ApiError::not_found("Notification"));
    }
    Ok(ok(true))
}
