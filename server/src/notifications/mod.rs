//! Notification service
//!
//! Persists per-user notifications. Emission is fire-and-forget: the
//! calling flow (plan change, watchlist add, signup) must never fail
//! because a notification insert did, so writes happen on a spawned
//! task and failures are logged and swallowed.

use crate::db::models::{NotificationCreate, NotificationKind, Priority, Subscription, UserId};
use crate::db::repository::NotificationRepository;
use shared::PlanTier;
use sqlx::SqlitePool;

/// What happened to a subscription, for notification wording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionChange {
    Upgraded,
    Renewed,
    Cancelled,
    Expired,
}

#[derive(Clone)]
pub struct NotificationService {
    repo: NotificationRepository,
}

impl NotificationService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            repo: NotificationRepository::new(pool),
        }
    }

    /// Queue a notification without blocking the caller
    pub fn notify(&self, data: NotificationCreate) {
        let repo = self.repo.clone();
        tokio::spawn(async move {
            let user_id = data.user_id;
            if let Err(e) = repo.insert(data).await {
                tracing::warn!(
                    target: "notifications",
                    user_id,
                    error = %e,
                    "Failed to deliver notification"
                );
            }
        });
    }

    pub fn welcome(&self, user_id: UserId, username: &str) {
        self.notify(NotificationCreate::new(
            user_id,
            NotificationKind::AccountUpdate,
            "Welcome to FlickNet",
            format!("Hi {username}, your account is ready. Start building your watchlist!"),
        ));
    }

    pub fn subscription_changed(
        &self,
        user_id: UserId,
        subscription: &Subscription,
        change: SubscriptionChange,
    ) {
        let plan = subscription.plan;
        let (title, message, priority) = match change {
            SubscriptionChange::Upgraded => (
                "Subscription upgraded".to_string(),
                format!(
                    "Your subscription is now {}. Enjoy your new features!",
                    plan.display_name()
                ),
                Priority::Medium,
            ),
            SubscriptionChange::Renewed => (
                "Subscription updated".to_string(),
                format!("Your subscription plan is now {}.", plan.display_name()),
                Priority::Medium,
            ),
            SubscriptionChange::Cancelled => {
                let message = if subscription.cancel_at_period_end {
                    "Your subscription will end at the close of the current billing period."
                        .to_string()
                } else {
                    "Your subscription has been cancelled and your account moved to the Free plan."
                        .to_string()
                };
                ("Subscription cancelled".to_string(), message, Priority::High)
            }
            SubscriptionChange::Expired => (
                "Subscription expired".to_string(),
                "Your billing period ended and your account moved to the Free plan.".to_string(),
                Priority::High,
            ),
        };

        self.notify(
            NotificationCreate::new(user_id, NotificationKind::SubscriptionUpdate, title, message)
                .with_priority(priority)
                .about_subscription(subscription.id),
        );
    }

    pub fn watchlist_added(&self, user_id: UserId, movie_id: i64, movie_title: &str) {
        self.notify(
            NotificationCreate::new(
                user_id,
                NotificationKind::WatchlistUpdate,
                "Added to watchlist",
                format!("{movie_title} is now on your watchlist."),
            )
            .with_priority(Priority::Low)
            .about_movie(movie_id),
        );
    }

    /// Helper for flows that only track the plan, not the change kind
    pub fn plan_change_kind(old_plan: PlanTier, new_plan: PlanTier) -> SubscriptionChange {
        if old_plan == PlanTier::Free && new_plan != PlanTier::Free {
            SubscriptionChange::Upgraded
        } else {
            SubscriptionChange::Renewed
        }
    }
}
