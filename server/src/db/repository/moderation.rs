//! Moderation Repository

use super::{RepoError, RepoResult};
use crate::db::models::{
    ContentReport, ContentReportCreate, ModerationAction, ModerationActionKind, Priority,
    ReportStatus, UserId,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

/// Overview counters for the moderator dashboard
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationStats {
    pub pending_reports: u64,
    pub resolved_reports: u64,
    pub total_users: u64,
    pub suspended_users: u64,
    pub active_movies: u64,
}

#[derive(Clone)]
pub struct ModerationRepository {
    pool: SqlitePool,
}

impl ModerationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_report(&self, data: ContentReportCreate) -> RepoResult<ContentReport> {
        let report = sqlx::query_as::<_, ContentReport>(
            "INSERT INTO content_reports \
               (reporter_id, movie_id, reason, details, status, priority, created_at) \
             VALUES (?, ?, ?, ?, 'pending', ?, ?) \
             RETURNING *",
        )
        .bind(data.reporter_id)
        .bind(data.movie_id)
        .bind(data.reason)
        .bind(data.details)
        .bind(data.priority)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(report)
    }

    pub async fn find_report(&self, id: i64) -> RepoResult<Option<ContentReport>> {
        let report =
            sqlx::query_as::<_, ContentReport>("SELECT * FROM content_reports WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(report)
    }

    /// Reports in a workflow state, oldest first so the queue drains
    /// fairly, optionally narrowed by priority
    pub async fn list_reports(
        &self,
        status: ReportStatus,
        priority: Option<Priority>,
        page: u32,
        limit: u32,
    ) -> RepoResult<(Vec<ContentReport>, u64)> {
        let offset = (page.saturating_sub(1)) * limit;

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM content_reports WHERE status = ");
        qb.push_bind(status);
        if let Some(priority) = priority {
            qb.push(" AND priority = ").push_bind(priority);
        }
        qb.push(" ORDER BY created_at ASC, id ASC LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset as i64);
        let reports = qb
            .build_query_as::<ContentReport>()
            .fetch_all(&self.pool)
            .await?;

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM content_reports WHERE status = ");
        count_qb.push_bind(status);
        if let Some(priority) = priority {
            count_qb.push(" AND priority = ").push_bind(priority);
        }
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok((reports, total as u64))
    }

    /// Close out a pending report and record who did it
    pub async fn handle_report(
        &self,
        id: i64,
        status: ReportStatus,
        moderator_id: UserId,
        notes: Option<String>,
    ) -> RepoResult<ContentReport> {
        if status == ReportStatus::Pending {
            return Err(RepoError::Validation(
                "A report cannot be handled back into pending".into(),
            ));
        }

        let report = sqlx::query_as::<_, ContentReport>(
            "UPDATE content_reports \
             SET status = ?, moderator_notes = ?, handled_by = ?, handled_at = ? \
             WHERE id = ? AND status = 'pending' \
             RETURNING *",
        )
        .bind(status)
        .bind(notes)
        .bind(moderator_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Pending report {id}")))?;
        Ok(report)
    }

    pub async fn record_action(
        &self,
        moderator_id: UserId,
        action: ModerationActionKind,
        target_user_id: Option<UserId>,
        report_id: Option<i64>,
        reason: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> RepoResult<ModerationAction> {
        let recorded = sqlx::query_as::<_, ModerationAction>(
            "INSERT INTO moderation_actions \
               (moderator_id, target_user_id, report_id, action, reason, expires_at, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             RETURNING *",
        )
        .bind(moderator_id)
        .bind(target_user_id)
        .bind(report_id)
        .bind(action)
        .bind(reason)
        .bind(expires_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(recorded)
    }

    pub async fn stats(&self) -> RepoResult<ModerationStats> {
        let pending_reports: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM content_reports WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await?;
        let resolved_reports: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM content_reports WHERE status = 'resolved'")
                .fetch_one(&self.pool)
                .await?;
        let total_users: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role != 'admin'")
                .fetch_one(&self.pool)
                .await?;
        let suspended_users: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active = 0")
                .fetch_one(&self.pool)
                .await?;
        let active_movies: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM movies WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;

        Ok(ModerationStats {
            pending_reports: pending_reports as u64,
            resolved_reports: resolved_reports as u64,
            total_users: total_users as u64,
            suspended_users: suspended_users as u64,
            active_movies: active_movies as u64,
        })
    }
}
