//! Subscription model

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{BillingCycle, PlanTier, SubscriptionStatus};

use super::user::UserId;

/// Subscription row, one per user.
///
/// Never hard-deleted: cancellation transitions `status` and drops the
/// plan back to free. Invariant: `end_date` is NULL exactly when
/// `plan` is free.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: i64,
    pub user_id: UserId,
    pub plan: PlanTier,
    pub status: SubscriptionStatus,
    pub billing_cycle: Option<BillingCycle>,
    pub amount_cents: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub auto_renew: bool,
    pub cancel_at_period_end: bool,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Whether the subscription currently grants its plan's features
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        if self.plan == PlanTier::Free {
            return true;
        }
        if self.status != SubscriptionStatus::Active {
            return false;
        }
        match self.end_date {
            Some(end) => end > now,
            None => false,
        }
    }

    /// Days left in the current billing period, `None` on free plans
    pub fn days_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        if self.plan == PlanTier::Free {
            return None;
        }
        self.end_date.map(|end| (end - now).num_days().max(0))
    }
}
