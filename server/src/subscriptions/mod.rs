//! Subscription lifecycle
//!
//! State machine over `{active, past_due, cancelled, inactive}` plus
//! the billing-period bookkeeping that goes with plan changes.
//!
//! Every transition that touches the plan writes the subscription row
//! and the user's denormalized `plan` column inside ONE transaction —
//! the two can never be observed out of sync.
//!
//! Deferred cancellations (`cancel_at_period_end`) are enacted by
//! [`SubscriptionService::expire_due`], which the server runs
//! periodically as a background task.

use crate::db::models::{Subscription, UserId};
use crate::db::repository::{
    RatingRepository, ReviewRepository, SubscriptionRepository, WatchlistRepository,
};
use crate::notifications::{NotificationService, SubscriptionChange};
use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use shared::{
    ApiError, ApiResult, BillingCycle, EntitlementEvaluator, Feature, Limit, PlanTier,
    SubscriptionStatus,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// End of the billing period starting at `now`
pub fn period_end(now: DateTime<Utc>, cycle: BillingCycle) -> DateTime<Utc> {
    match cycle {
        BillingCycle::Monthly => now + Months::new(1),
        BillingCycle::Yearly => now + Months::new(12),
    }
}

/// Usage of one counted feature against its plan cap
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEntry {
    pub current: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<Limit>,
    pub unlimited: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub watchlist: UsageEntry,
    pub ratings: UsageEntry,
    pub reviews: UsageEntry,
}

#[derive(Clone)]
pub struct SubscriptionService {
    pool: SqlitePool,
    repo: SubscriptionRepository,
    notifier: NotificationService,
    entitlements: Arc<EntitlementEvaluator>,
}

impl SubscriptionService {
    pub fn new(
        pool: SqlitePool,
        notifier: NotificationService,
        entitlements: Arc<EntitlementEvaluator>,
    ) -> Self {
        let repo = SubscriptionRepository::new(pool.clone());
        Self {
            pool,
            repo,
            notifier,
            entitlements,
        }
    }

    /// The free/active subscription every account starts with
    pub async fn ensure_default(&self, user_id: UserId) -> ApiResult<Subscription> {
        Ok(self.repo.ensure_default(user_id).await?)
    }

    pub async fn get(&self, user_id: UserId) -> ApiResult<Subscription> {
        self.repo
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Subscription"))
    }

    /// Move an active subscription to another plan.
    ///
    /// Paid targets need a billing cycle and get a fresh period end;
    /// moving to free clears all billing state. Only `active`
    /// subscriptions can change plan.
    pub async fn change_plan(
        &self,
        user_id: UserId,
        new_plan: PlanTier,
        billing_cycle: Option<BillingCycle>,
    ) -> ApiResult<Subscription> {
        let current = self.repo.ensure_default(user_id).await?;

        if current.status != SubscriptionStatus::Active {
            return Err(ApiError::invalid_state(format!(
                "Plan can only change on an active subscription (current status: {})",
                current.status
            )));
        }

        let now = Utc::now();
        let old_plan = current.plan;

        let updated = if new_plan.is_paid() {
            let cycle = billing_cycle.ok_or_else(|| {
                ApiError::validation("Billing cycle is required for paid plans")
            })?;
            let end_date = period_end(now, cycle);
            let amount_cents = new_plan.price_cents(cycle);

            let mut tx = self.pool.begin().await.map_err(db_err)?;
            let updated = sqlx::query_as::<_, Subscription>(
                "UPDATE subscriptions SET \
                   plan = ?, status = 'active', billing_cycle = ?, amount_cents = ?, \
                   end_date = ?, auto_renew = 1, cancel_at_period_end = 0, \
                   cancellation_reason = NULL, updated_at = ? \
                 WHERE user_id = ? RETURNING *",
            )
            .bind(new_plan)
            .bind(cycle)
            .bind(amount_cents)
            .bind(end_date)
            .bind(now)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?;

            sqlx::query("UPDATE users SET plan = ?, updated_at = ? WHERE id = ?")
                .bind(new_plan)
                .bind(now)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            tx.commit().await.map_err(db_err)?;
            updated
        } else {
            let mut tx = self.pool.begin().await.map_err(db_err)?;
            let updated = sqlx::query_as::<_, Subscription>(
                "UPDATE subscriptions SET \
                   plan = 'free', status = 'active', billing_cycle = NULL, amount_cents = 0, \
                   end_date = NULL, cancel_at_period_end = 0, cancellation_reason = NULL, \
                   updated_at = ? \
                 WHERE user_id = ? RETURNING *",
            )
            .bind(now)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?;

            sqlx::query("UPDATE users SET plan = 'free', updated_at = ? WHERE id = ?")
                .bind(now)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            tx.commit().await.map_err(db_err)?;
            updated
        };

        tracing::info!(
            target: "subscriptions",
            user_id,
            old_plan = %old_plan,
            new_plan = %updated.plan,
            "Subscription plan changed"
        );
        self.notifier.subscription_changed(
            user_id,
            &updated,
            NotificationService::plan_change_kind(old_plan, updated.plan),
        );

        Ok(updated)
    }

    /// Cancel a paid subscription.
    ///
    /// With `at_period_end` the subscription stays active and only the
    /// flag and reason are recorded; the background sweep enacts the
    /// downgrade once the period closes. Otherwise the downgrade to
    /// free happens immediately. Free subscriptions cannot be
    /// cancelled.
    pub async fn cancel(
        &self,
        user_id: UserId,
        at_period_end: bool,
        reason: Option<String>,
    ) -> ApiResult<Subscription> {
        let current = self
            .repo
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Subscription"))?;

        if current.plan == PlanTier::Free {
            return Err(ApiError::invalid_state("Cannot cancel a free subscription"));
        }
        if current.status != SubscriptionStatus::Active {
            return Err(ApiError::invalid_state(format!(
                "Only an active subscription can be cancelled (current status: {})",
                current.status
            )));
        }

        let now = Utc::now();
        let updated = if at_period_end {
            sqlx::query_as::<_, Subscription>(
                "UPDATE subscriptions SET \
                   cancel_at_period_end = 1, cancellation_reason = ?, updated_at = ? \
                 WHERE user_id = ? RETURNING *",
            )
            .bind(reason)
            .bind(now)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?
        } else {
            let mut tx = self.pool.begin().await.map_err(db_err)?;
            let updated = sqlx::query_as::<_, Subscription>(
                "UPDATE subscriptions SET \
                   plan = 'free', status = 'cancelled', billing_cycle = NULL, amount_cents = 0, \
                   end_date = NULL, auto_renew = 0, cancel_at_period_end = 0, \
                   cancelled_at = ?, cancellation_reason = ?, updated_at = ? \
                 WHERE user_id = ? RETURNING *",
            )
            .bind(now)
            .bind(reason)
            .bind(now)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?;

            sqlx::query("UPDATE users SET plan = 'free', updated_at = ? WHERE id = ?")
                .bind(now)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            tx.commit().await.map_err(db_err)?;
            updated
        };

        tracing::info!(
            target: "subscriptions",
            user_id,
            at_period_end,
            "Subscription cancelled"
        );
        self.notifier
            .subscription_changed(user_id, &updated, SubscriptionChange::Cancelled);

        Ok(updated)
    }

    /// Downgrade paid subscriptions whose period has closed and that
    /// must not roll over. Returns how many were downgraded.
    pub async fn expire_due(&self, now: DateTime<Utc>) -> ApiResult<u64> {
        let due = self.repo.due_for_downgrade(now).await?;
        let mut downgraded = 0u64;

        for subscription in due {
            // Deferred cancellation ends as cancelled; an unrenewed
            // natural expiry goes inactive
            let final_status = if subscription.cancel_at_period_end {
                SubscriptionStatus::Cancelled
            } else {
                SubscriptionStatus::Inactive
            };

            let mut tx = self.pool.begin().await.map_err(db_err)?;
            let updated = sqlx::query_as::<_, Subscription>(
                "UPDATE subscriptions SET \
                   plan = 'free', status = ?, billing_cycle = NULL, amount_cents = 0, \
                   end_date = NULL, auto_renew = 0, cancel_at_period_end = 0, \
                   cancelled_at = COALESCE(cancelled_at, ?), updated_at = ? \
                 WHERE id = ? RETURNING *",
            )
            .bind(final_status)
            .bind(now)
            .bind(now)
            .bind(subscription.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?;

            sqlx::query("UPDATE users SET plan = 'free', updated_at = ? WHERE id = ?")
                .bind(now)
                .bind(subscription.user_id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            tx.commit().await.map_err(db_err)?;

            tracing::info!(
                target: "subscriptions",
                user_id = subscription.user_id,
                status = %updated.status,
                "Subscription period ended, downgraded to free"
            );
            self.notifier.subscription_changed(
                subscription.user_id,
                &updated,
                SubscriptionChange::Expired,
            );
            downgraded += 1;
        }

        Ok(downgraded)
    }

    /// Current usage of the counted features against the user's plan
    pub async fn usage(&self, user_id: UserId, plan: PlanTier) -> ApiResult<UsageSummary> {
        let watchlist = WatchlistRepository::new(self.pool.clone())
            .count(user_id)
            .await?;
        let ratings = RatingRepository::new(self.pool.clone())
            .count(user_id)
            .await?;
        let reviews = ReviewRepository::new(self.pool.clone())
            .count(user_id)
            .await?;

        Ok(UsageSummary {
            watchlist: self.usage_entry(plan, Feature::WatchlistLimit, watchlist),
            ratings: self.usage_entry(plan, Feature::RatingsLimit, ratings),
            reviews: self.usage_entry(plan, Feature::ReviewsLimit, reviews),
        })
    }

    fn usage_entry(&self, plan: PlanTier, feature: Feature, current: u32) -> UsageEntry {
        let limit = self.entitlements.limit(plan, feature);
        UsageEntry {
            current,
            limit,
            unlimited: matches!(limit, Some(Limit::Unlimited)),
        }
    }
}

fn db_err(e: sqlx::Error) -> ApiError {
    ApiError::database(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn monthly_period_ends_one_month_out() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let end = period_end(start, BillingCycle::Monthly);
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 2, 15, 12, 0, 0).unwrap());
    }

    #[test]
    fn yearly_period_ends_one_year_out() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let end = period_end(start, BillingCycle::Yearly);
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn month_end_clamps_instead_of_overflowing() {
        let start = Utc.with_ymd_and_hms(2024, 1, 31, 8, 30, 0).unwrap();
        let end = period_end(start, BillingCycle::Monthly);
        // February has no 31st; chrono clamps to the last day
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 2, 29, 8, 30, 0).unwrap());
    }
}
