//! Subscription API handlers

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::{BillingCycle, Entitlement, Feature, Permission, PlanTier};

use crate::auth::CurrentUser;
use crate::core::AppState;
use crate::db::models::Subscription;
use crate::db::repository::UserRepository;
use crate::subscriptions::UsageSummary;
use crate::utils::{ApiError, ApiResponse, ApiResult, ok, ok_with_message, validation};

/// Subscription plus the derived fields clients render
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub is_current: bool,
    pub days_remaining: Option<i64>,
}

impl SubscriptionView {
    fn new(subscription: Subscription) -> Self {
        let now = chrono::Utc::now();
        let is_current = subscription.is_current(now);
        let days_remaining = subscription.days_remaining(now);
        Self {
            subscription,
            is_current,
            days_remaining,
        }
    }
}

/// GET /api/subscriptions/me
pub async fn my_subscription(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<ApiResponse<SubscriptionView>>> {
    let subscription = state.subscriptions().get(user.id).await?;
    Ok(ok(SubscriptionView::new(subscription)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPrice {
    pub monthly_cents: i64,
    pub yearly_cents: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub price: PlanPrice,
    pub features: BTreeMap<&'static str, Permission>,
}

/// GET /api/subscriptions/plans - public plan catalog with the full
/// feature matrix
pub async fn plans(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<BTreeMap<&'static str, PlanInfo>>>> {
    let table = state.entitlements.table();

    let mut catalog = BTreeMap::new();
    for tier in PlanTier::ALL {
        let mut features = BTreeMap::new();
        for feature in Feature::ALL {
            features.insert(feature.as_str(), table.permission(tier, feature));
        }
        catalog.insert(
            tier.as_str(),
            PlanInfo {
                name: tier.display_name(),
                description: tier.description(),
                price: PlanPrice {
                    monthly_cents: tier.price_cents(BillingCycle::Monthly),
                    yearly_cents: tier.price_cents(BillingCycle::Yearly),
                },
                features,
            },
        );
    }

    Ok(ok(catalog))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePlanRequest {
    pub plan: String,
    pub billing_cycle: Option<String>,
}

/// PUT /api/subscriptions/plan - upgrade or downgrade
pub async fn change_plan(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<ChangePlanRequest>,
) -> ApiResult<Json<ApiResponse<Subscription>>> {
    let plan: PlanTier = payload
        .plan
        .parse()
        .map_err(|e: String| ApiError::validation(e))?;
    let billing_cycle = payload
        .billing_cycle
        .as_deref()
        .map(str::parse::<BillingCycle>)
        .transpose()
        .map_err(|e: String| ApiError::validation(e))?;

    let subscription = state
        .subscriptions()
        .change_plan(user.id, plan, billing_cycle)
        .await?;

    Ok(ok_with_message(
        subscription,
        format!("Subscription updated to {plan}"),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub reason: Option<String>,
    #[serde(default = "default_cancel_at_period_end")]
    pub cancel_at_period_end: bool,
}

fn default_cancel_at_period_end() -> bool {
    true
}

/// DELETE /api/subscriptions/cancel
pub async fn cancel(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CancelRequest>,
) -> ApiResult<Json<ApiResponse<Subscription>>> {
    validation::validate_optional_text(&payload.reason, "reason", validation::MAX_NOTE_LEN)?;

    let at_period_end = payload.cancel_at_period_end;
    let subscription = state
        .subscriptions()
        .cancel(user.id, at_period_end, payload.reason)
        .await?;

    let message = if at_period_end {
        "Subscription will be cancelled at the end of the billing period"
    } else {
        "Subscription cancelled immediately"
    };
    Ok(ok_with_message(subscription, message))
}

/// GET /api/subscriptions/usage - counted features vs plan caps
pub async fn usage(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<ApiResponse<UsageSummary>>> {
    // The token's plan is a snapshot from issue time; limits follow the
    // live plan
    let plan = UserRepository::new(state.db.clone()).plan_of(user.id).await?;
    let summary = state.subscriptions().usage(user.id, plan).await?;
    Ok(ok(summary))
}

#[derive(Debug, Default, Deserialize)]
pub struct FeatureAccessParams {
    pub count: Option<u32>,
}

/// GET /api/subscriptions/features/{feature} - evaluate one feature
/// for the caller, with an optional current usage count
pub async fn feature_access(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(feature): Path<String>,
    Query(params): Query<FeatureAccessParams>,
) -> ApiResult<Json<ApiResponse<Entitlement>>> {
    let feature: Feature = feature
        .parse()
        .map_err(|e: String| ApiError::validation(e))?;

    let plan = UserRepository::new(state.db.clone()).plan_of(user.id).await?;
    let result = state
        .entitlements
        .evaluate(plan, feature, params.count.unwrap_or(0), true);
    Ok(ok(result))
}
