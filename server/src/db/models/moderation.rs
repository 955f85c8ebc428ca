//! Moderation models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::notification::Priority;
use super::user::UserId;

/// Workflow state of a content report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Dismissed => "dismissed",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "resolved" => Ok(ReportStatus::Resolved),
            "dismissed" => Ok(ReportStatus::Dismissed),
            other => Err(format!("unknown report status: {other}")),
        }
    }
}

/// User-filed report against a catalog entry
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContentReport {
    pub id: i64,
    pub reporter_id: UserId,
    pub movie_id: Option<i64>,
    pub reason: String,
    pub details: Option<String>,
    pub status: ReportStatus,
    pub priority: Priority,
    pub moderator_notes: Option<String>,
    pub handled_by: Option<UserId>,
    pub handled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ContentReportCreate {
    pub reporter_id: UserId,
    pub movie_id: Option<i64>,
    pub reason: String,
    pub details: Option<String>,
    pub priority: Priority,
}

/// What a moderator did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ModerationActionKind {
    ReportResolved,
    ReportDismissed,
    UserSuspended,
    UserUnsuspended,
}

/// Audit record of a moderation decision
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ModerationAction {
    pub id: i64,
    pub moderator_id: UserId,
    pub target_user_id: Option<UserId>,
    pub report_id: Option<i64>,
    pub action: ModerationActionKind,
    pub reason: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
