//! Subscription lifecycle integration tests

mod common;

use chrono::{Duration, Months, Utc};
use common::{create_user, subscription_service, test_pool};
use flicknet_server::db::repository::UserRepository;
use shared::{ApiError, BillingCycle, PlanTier, SubscriptionStatus};

#[tokio::test]
async fn signup_subscription_is_free_and_active() {
    let pool = test_pool().await;
    let user = create_user(&pool, "fresh").await;
    let service = subscription_service(&pool);

    let sub = service.ensure_default(user.id).await.unwrap();
    assert_eq!(sub.plan, PlanTier::Free);
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert_eq!(sub.end_date, None);

    // Idempotent: a second call returns the same record
    let again = service.ensure_default(user.id).await.unwrap();
    assert_eq!(again.id, sub.id);
}

#[tokio::test]
async fn upgrade_sets_period_end_and_user_plan_together() {
    let pool = test_pool().await;
    let user = create_user(&pool, "upgrader").await;
    let service = subscription_service(&pool);

    let before = Utc::now();
    let sub = service
        .change_plan(user.id, PlanTier::Basic, Some(BillingCycle::Monthly))
        .await
        .unwrap();

    assert_eq!(sub.plan, PlanTier::Basic);
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert_eq!(sub.billing_cycle, Some(BillingCycle::Monthly));
    assert_eq!(sub.amount_cents, 999);
    assert!(sub.auto_renew);

    // end_date is one month out, within a second of "now"
    let end = sub.end_date.expect("paid plan must have an end date");
    let expected = before + Months::new(1);
    assert!(
        (end - expected).num_seconds().abs() <= 1,
        "end date {end} not within tolerance of {expected}"
    );

    // The denormalized user plan moved in the same transaction
    let plan = UserRepository::new(pool.clone())
        .plan_of(user.id)
        .await
        .unwrap();
    assert_eq!(plan, PlanTier::Basic);
}

#[tokio::test]
async fn yearly_upgrade_prices_and_dates_accordingly() {
    let pool = test_pool().await;
    let user = create_user(&pool, "annual").await;
    let service = subscription_service(&pool);

    let before = Utc::now();
    let sub = service
        .change_plan(user.id, PlanTier::Premium, Some(BillingCycle::Yearly))
        .await
        .unwrap();

    assert_eq!(sub.amount_cents, 19_999);
    let end = sub.end_date.unwrap();
    let expected = before + Months::new(12);
    assert!((end - expected).num_seconds().abs() <= 1);
}

#[tokio::test]
async fn paid_plan_requires_billing_cycle() {
    let pool = test_pool().await;
    let user = create_user(&pool, "cycleless").await;
    let service = subscription_service(&pool);

    let err = service
        .change_plan(user.id, PlanTier::Basic, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)), "got {err:?}");
}

#[tokio::test]
async fn downgrade_to_free_clears_billing_state() {
    let pool = test_pool().await;
    let user = create_user(&pool, "downgrader").await;
    let service = subscription_service(&pool);

    service
        .change_plan(user.id, PlanTier::Premium, Some(BillingCycle::Monthly))
        .await
        .unwrap();
    let sub = service
        .change_plan(user.id, PlanTier::Free, None)
        .await
        .unwrap();

    assert_eq!(sub.plan, PlanTier::Free);
    assert_eq!(sub.end_date, None);
    assert_eq!(sub.billing_cycle, None);
    assert_eq!(sub.amount_cents, 0);

    let plan = UserRepository::new(pool.clone())
        .plan_of(user.id)
        .await
        .unwrap();
    assert_eq!(plan, PlanTier::Free);
}

#[tokio::test]
async fn immediate_cancel_downgrades_to_free() {
    let pool = test_pool().await;
    let user = create_user(&pool, "canceller").await;
    let service = subscription_service(&pool);

    service
        .change_plan(user.id, PlanTier::Basic, Some(BillingCycle::Monthly))
        .await
        .unwrap();
    let sub = service
        .cancel(user.id, false, Some("too expensive".into()))
        .await
        .unwrap();

    assert_eq!(sub.plan, PlanTier::Free);
    assert_eq!(sub.status, SubscriptionStatus::Cancelled);
    assert_eq!(sub.end_date, None);
    assert!(!sub.auto_renew);
    assert!(sub.cancelled_at.is_some());
    assert_eq!(sub.cancellation_reason.as_deref(), Some("too expensive"));

    let plan = UserRepository::new(pool.clone())
        .plan_of(user.id)
        .await
        .unwrap();
    assert_eq!(plan, PlanTier::Free);
}

#[tokio::test]
async fn cancelling_a_free_subscription_is_an_invalid_transition() {
    let pool = test_pool().await;
    let user = create_user(&pool, "freeloader").await;
    let service = subscription_service(&pool);
    service.ensure_default(user.id).await.unwrap();

    let err = service.cancel(user.id, false, None).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidState(_)), "got {err:?}");
}

#[tokio::test]
async fn deferred_cancel_keeps_the_plan_until_period_end() {
    let pool = test_pool().await;
    let user = create_user(&pool, "deferrer").await;
    let service = subscription_service(&pool);

    service
        .change_plan(user.id, PlanTier::Basic, Some(BillingCycle::Monthly))
        .await
        .unwrap();
    let sub = service
        .cancel(user.id, true, Some("moving abroad".into()))
        .await
        .unwrap();

    // Still active, still basic; only the flag and reason recorded
    assert_eq!(sub.plan, PlanTier::Basic);
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert!(sub.cancel_at_period_end);
    assert!(sub.end_date.is_some());

    let plan = UserRepository::new(pool.clone())
        .plan_of(user.id)
        .await
        .unwrap();
    assert_eq!(plan, PlanTier::Basic);
}

#[tokio::test]
async fn plan_change_is_rejected_after_cancellation() {
    let pool = test_pool().await;
    let user = create_user(&pool, "lapsed").await;
    let service = subscription_service(&pool);

    service
        .change_plan(user.id, PlanTier::Basic, Some(BillingCycle::Monthly))
        .await
        .unwrap();
    service.cancel(user.id, false, None).await.unwrap();

    let err = service
        .change_plan(user.id, PlanTier::Premium, Some(BillingCycle::Monthly))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidState(_)), "got {err:?}");
}

#[tokio::test]
async fn expiry_sweep_enacts_deferred_cancellations() {
    let pool = test_pool().await;
    let user = create_user(&pool, "expiring").await;
    let service = subscription_service(&pool);

    service
        .change_plan(user.id, PlanTier::Premium, Some(BillingCycle::Monthly))
        .await
        .unwrap();
    service.cancel(user.id, true, None).await.unwrap();

    // Pretend the billing period closed yesterday
    sqlx::query("UPDATE subscriptions SET end_date = ? WHERE user_id = ?")
        .bind(Utc::now() - Duration::days(1))
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();

    let downgraded = service.expire_due(Utc::now()).await.unwrap();
    assert_eq!(downgraded, 1);

    let sub = service.get(user.id).await.unwrap();
    assert_eq!(sub.plan, PlanTier::Free);
    assert_eq!(sub.status, SubscriptionStatus::Cancelled);
    assert_eq!(sub.end_date, None);

    let plan = UserRepository::new(pool.clone())
        .plan_of(user.id)
        .await
        .unwrap();
    assert_eq!(plan, PlanTier::Free);

    // A second sweep finds nothing
    assert_eq!(service.expire_due(Utc::now()).await.unwrap(), 0);
}

#[tokio::test]
async fn expiry_sweep_marks_unrenewed_subscriptions_inactive() {
    let pool = test_pool().await;
    let user = create_user(&pool, "unrenewed").await;
    let service = subscription_service(&pool);

    service
        .change_plan(user.id, PlanTier::Basic, Some(BillingCycle::Yearly))
        .await
        .unwrap();

    sqlx::query(
        "UPDATE subscriptions SET auto_renew = 0, end_date = ? WHERE user_id = ?",
    )
    .bind(Utc::now() - Duration::hours(2))
    .bind(user.id)
    .execute(&pool)
    .await
    .unwrap();

    assert_eq!(service.expire_due(Utc::now()).await.unwrap(), 1);

    let sub = service.get(user.id).await.unwrap();
    assert_eq!(sub.plan, PlanTier::Free);
    assert_eq!(sub.status, SubscriptionStatus::Inactive);
}

#[tokio::test]
async fn expiry_sweep_leaves_renewing_subscriptions_alone() {
    let pool = test_pool().await;
    let user = create_user(&pool, "renewing").await;
    let service = subscription_service(&pool);

    service
        .change_plan(user.id, PlanTier::Basic, Some(BillingCycle::Monthly))
        .await
        .unwrap();

    // Period over, but auto-renew is on and no cancellation is pending
    sqlx::query("UPDATE subscriptions SET end_date = ? WHERE user_id = ?")
        .bind(Utc::now() - Duration::days(1))
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(service.expire_due(Utc::now()).await.unwrap(), 0);
    let sub = service.get(user.id).await.unwrap();
    assert_eq!(sub.plan, PlanTier::Basic);
}
