//! Moderation API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::AppState;
use crate::db::models::{
    ContentReport, ContentReportCreate, ModerationActionKind, Priority, ReportStatus, User,
    UserId,
};
use crate::db::repository::moderation::ModerationStats;
use crate::db::repository::{ModerationRepository, MovieRepository, UserRepository};
use crate::utils::{ApiError, ApiResponse, ApiResult, PaginatedResponse, ok, ok_with_message, validation};

// =============================================================================
// Reports
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReportRequest {
    pub movie_id: Option<i64>,
    pub reason: String,
    pub details: Option<String>,
    pub priority: Option<Priority>,
}

/// POST /api/reports - any signed-in user can flag content
pub async fn file_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<FileReportRequest>,
) -> ApiResult<Json<ApiResponse<ContentReport>>> {
    validation::validate_required_text(&payload.reason, "reason", validation::MAX_NOTE_LEN)?;
    validation::validate_optional_text(&payload.details, "details", validation::MAX_TEXT_LEN)?;

    if let Some(movie_id) = payload.movie_id {
        MovieRepository::new(state.db.clone())
            .find_by_id(movie_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Movie"))?;
    }

    let report = ModerationRepository::new(state.db.clone())
        .create_report(ContentReportCreate {
            reporter_id: user.id,
            movie_id: payload.movie_id,
            reason: payload.reason,
            details: payload.details,
            priority: payload.priority.unwrap_or(Priority::Medium),
        })
        .await?;

    tracing::info!(target: "moderation", report_id = report.id, "Content report filed");
    Ok(ok_with_message(report, "Report submitted"))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportListParams {
    pub status: Option<String>,
    pub priority: Option<Priority>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// GET /api/moderation/reports - the queue, oldest first
pub async fn list_reports(
    State(state): State<AppState>,
    Query(params): Query<ReportListParams>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<ContentReport>>>> {
    let status = match params.status.as_deref() {
        None => ReportStatus::Pending,
        Some(raw) => raw
            .parse::<ReportStatus>()
            .map_err(|e| ApiError::validation(e))?,
    };
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    let (reports, total) = ModerationRepository::new(state.db.clone())
        .list_reports(status, params.priority, page, limit)
        .await?;
    Ok(ok(PaginatedResponse::new(reports, page, limit, total)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleReportRequest {
    /// "resolve" or "dismiss"
    pub action: String,
    pub moderator_notes: Option<String>,
}

/// PUT /api/moderation/reports/{id} - close out a pending report
pub async fn handle_report(
    State(state): State<AppState>,
    moderator: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<HandleReportRequest>,
) -> ApiResult<Json<ApiResponse<ContentReport>>> {
    validation::validate_optional_text(
        &payload.moderator_notes,
        "moderator notes",
        validation::MAX_NOTE_LEN,
    )?;

    let (status, action) = match payload.action.as_str() {
        "resolve" => (ReportStatus::Resolved, ModerationActionKind::ReportResolved),
        "dismiss" => (
            ReportStatus::Dismissed,
            ModerationActionKind::ReportDismissed,
        ),
        other => {
            return Err(ApiError::validation(format!(
                "action must be resolve or dismiss, got {other:?}"
            )));
        }
    };

    let repo = ModerationRepository::new(state.db.clone());
    let report = repo
        .handle_report(id, status, moderator.id, payload.moderator_notes.clone())
        .await?;
    repo.record_action(
        moderator.id,
        action,
        None,
        Some(report.id),
        payload.moderator_notes,
        None,
    )
    .await?;

    tracing::info!(
        target: "moderation",
        report_id = report.id,
        moderator_id = moderator.id,
        status = %report.status,
        "Content report handled"
    );
    Ok(ok(report))
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct UserListParams {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// GET /api/moderation/users - accounts visible to moderators
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<UserListParams>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<User>>>> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    let (users, total) = UserRepository::new(state.db.clone())
        .list_for_moderation(params.search.as_deref(), page, limit)
        .await?;
    Ok(ok(PaginatedResponse::new(users, page, limit, total)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspendRequest {
    /// Suspension length in hours; unlimited when absent
    pub duration_hours: Option<i64>,
    pub reason: String,
}

/// PUT /api/moderation/users/{id}/suspend
pub async fn suspend_user(
    State(state): State<AppState>,
    moderator: CurrentUser,
    Path(id): Path<UserId>,
    Json(payload): Json<SuspendRequest>,
) -> ApiResult<Json<ApiResponse<User>>> {
    validation::validate_required_text(&payload.reason, "reason", validation::MAX_NOTE_LEN)?;

    let users = UserRepository::new(state.db.clone());
    let target = users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    // Moderators cannot touch admins, and nobody suspends themselves
    if target.role.is_admin() {
        return Err(ApiError::forbidden("Admins cannot be suspended"));
    }
    if target.id == moderator.id {
        return Err(ApiError::invalid("You cannot suspend your own account"));
    }
    if !target.is_active {
        return Err(ApiError::invalid_state("User is already suspended"));
    }

    let expires_at = payload
        .duration_hours
        .map(|hours| Utc::now() + Duration::hours(hours));

    let suspended = users.set_active(id, false).await?;
    ModerationRepository::new(state.db.clone())
        .record_action(
            moderator.id,
            ModerationActionKind::UserSuspended,
            Some(id),
            None,
            Some(payload.reason),
            expires_at,
        )
        .await?;

    tracing::info!(
        target: "moderation",
        user_id = id,
        moderator_id = moderator.id,
        "User suspended"
    );
    Ok(ok_with_message(suspended, "User suspended"))
}

/// PUT /api/moderation/users/{id}/unsuspend
pub async fn unsuspend_user(
    State(state): State<AppState>,
    moderator: CurrentUser,
    Path(id): Path<UserId>,
) -> ApiResult<Json<ApiResponse<User>>> {
    let users = UserRepository::new(state.db.clone());
    let target = users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if target.is_active {
        return Err(ApiError::invalid_state("User is not suspended"));
    }

    let reinstated = users.set_active(id, true).await?;
    ModerationRepository::new(state.db.clone())
        .record_action(
            moderator.id,
            ModerationActionKind::UserUnsuspended,
            Some(id),
            None,
            None,
            None,
        )
        .await?;

    Ok(ok_with_message(reinstated, "User reinstated"))
}

/// GET /api/moderation/stats - dashboard counters
pub async fn stats(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<ModerationStats>>> {
    let stats = ModerationRepository::new(state.db.clone()).stats().await?;
    Ok(ok(stats))
}
