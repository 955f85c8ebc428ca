//! Entitlement evaluator
//!
//! Answers one question for request handlers: may this caller use this
//! feature right now? Denials are ordinary return values with a reason
//! and an upgrade hint, never errors — a free user hitting their
//! watchlist cap is an anticipated condition, not a fault.
//!
//! Decision order inside [`EntitlementEvaluator::evaluate`]:
//!
//! 1. identity-bound feature + anonymous caller → `Unauthenticated`
//! 2. plan does not grant the feature at all → `PlanRestricted`
//! 3. counted feature at or over its cap → `LimitReached`
//! 4. otherwise → `Allowed`

use crate::permissions::{Feature, Limit, PermissionTable};
use crate::plan::PlanTier;
use serde::Serialize;

/// Outcome classification for an entitlement decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessReason {
    Unauthenticated,
    PlanRestricted,
    LimitReached,
    Allowed,
}

/// Full result of an entitlement decision, shaped for the API layer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub available: bool,
    pub reason: AccessReason,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_plan: Option<PlanTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<Limit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_count: Option<u32>,
}

impl Entitlement {
    fn allowed(limit: Option<Limit>, current_count: Option<u32>) -> Self {
        Self {
            available: true,
            reason: AccessReason::Allowed,
            message: "Feature available".to_string(),
            suggested_plan: None,
            limit,
            current_count,
        }
    }
}

/// Evaluates feature access against an injected permission table
#[derive(Debug, Clone)]
pub struct EntitlementEvaluator {
    table: PermissionTable,
}

impl EntitlementEvaluator {
    pub fn new(table: PermissionTable) -> Self {
        Self { table }
    }

    /// Evaluator over the production permission matrix
    pub fn standard() -> Self {
        Self::new(PermissionTable::standard())
    }

    pub fn table(&self) -> &PermissionTable {
        &self.table
    }

    /// Does the plan grant the feature at all? True for boolean grants
    /// and for counted features with a non-zero cap.
    pub fn has_access(&self, tier: PlanTier, feature: Feature) -> bool {
        self.table.permission(tier, feature).allows_any()
    }

    /// The numeric cap for a counted feature, `None` for boolean ones
    pub fn limit(&self, tier: PlanTier, feature: Feature) -> Option<Limit> {
        self.table.permission(tier, feature).limit()
    }

    /// May the caller perform one more action? Boolean features reduce
    /// to [`Self::has_access`]; counted features require
    /// `current_count < limit`, with unlimited always passing.
    pub fn can_perform(&self, tier: PlanTier, feature: Feature, current_count: u32) -> bool {
        match self.limit(tier, feature) {
            Some(limit) => limit.admits(current_count),
            None => self.has_access(tier, feature),
        }
    }

    /// Composite decision with an explicit reason and upgrade hint
    pub fn evaluate(
        &self,
        tier: PlanTier,
        feature: Feature,
        current_count: u32,
        authenticated: bool,
    ) -> Entitlement {
        if feature.requires_auth() && !authenticated {
            return Entitlement {
                available: false,
                reason: AccessReason::Unauthenticated,
                message: "Please sign in to access this feature".to_string(),
                suggested_plan: None,
                limit: None,
                current_count: None,
            };
        }

        if !self.has_access(tier, feature) {
            return Entitlement {
                available: false,
                reason: AccessReason::PlanRestricted,
                message: upgrade_message(feature).to_string(),
                suggested_plan: tier.upgrade_target(),
                limit: None,
                current_count: None,
            };
        }

        let limit = self.limit(tier, feature);
        if let Some(Limit::Finite(cap)) = limit
            && current_count >= cap
        {
            return Entitlement {
                available: false,
                reason: AccessReason::LimitReached,
                message: format!(
                    "You've reached your {feature} limit ({cap}). Upgrade for more access."
                ),
                suggested_plan: tier.upgrade_target(),
                limit,
                current_count: Some(current_count),
            };
        }

        Entitlement::allowed(limit, limit.map(|_| current_count))
    }
}

impl Default for EntitlementEvaluator {
    fn default() -> Self {
        Self::standard()
    }
}

/// Upgrade prompt shown when a plan does not grant a feature
fn upgrade_message(feature: Feature) -> &'static str {
    match feature {
        Feature::AdvancedSearch => "Upgrade to Basic or Premium to access advanced search filters",
        Feature::Recommendations => {
            "Upgrade to Basic or Premium to get personalized movie recommendations"
        }
        Feature::CommunityFeatures => "Upgrade to Basic or Premium to join our movie community",
        Feature::PrioritySupport => "Upgrade to Premium for priority customer support",
        Feature::ExclusiveContent => "Upgrade to Premium to access exclusive movies and content",
        Feature::OfflineViewing => "Upgrade to Premium to download movies for offline viewing",
        Feature::PrivateMessages => "Upgrade to Premium to send private messages to other users",
        Feature::PersonalizedReports => "Upgrade to Premium to get detailed viewing analytics",
        Feature::HdStreaming => "Upgrade to Basic or Premium for HD streaming quality",
        Feature::MultipleProfiles => "Upgrade to Premium to manage multiple profiles",
        Feature::DownloadReceipts => "Upgrade to Basic or Premium to download movie receipts",
        Feature::WatchingStats => "Upgrade to Premium to get detailed watching statistics",
        _ => "Upgrade your plan to access this feature",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator() -> EntitlementEvaluator {
        EntitlementEvaluator::standard()
    }

    #[test]
    fn boolean_access_follows_the_table() {
        let eval = evaluator();
        assert!(!eval.has_access(PlanTier::Free, Feature::AdvancedSearch));
        assert!(eval.has_access(PlanTier::Basic, Feature::AdvancedSearch));
        assert!(eval.has_access(PlanTier::Premium, Feature::AdvancedSearch));
    }

    #[test]
    fn counted_access_counts_as_access() {
        // A finite limit > 0 means the feature is accessible at all
        assert!(evaluator().has_access(PlanTier::Free, Feature::WatchlistLimit));
    }

    #[test]
    fn limit_is_none_for_boolean_features() {
        let eval = evaluator();
        assert_eq!(eval.limit(PlanTier::Basic, Feature::HdStreaming), None);
        assert_eq!(
            eval.limit(PlanTier::Free, Feature::WatchlistLimit),
            Some(Limit::Finite(10))
        );
        assert_eq!(
            eval.limit(PlanTier::Premium, Feature::WatchlistLimit),
            Some(Limit::Unlimited)
        );
    }

    #[test]
    fn can_perform_is_strict_at_the_cap() {
        let eval = evaluator();
        assert!(eval.can_perform(PlanTier::Free, Feature::WatchlistLimit, 9));
        assert!(!eval.can_perform(PlanTier::Free, Feature::WatchlistLimit, 10));
        assert!(!eval.can_perform(PlanTier::Free, Feature::WatchlistLimit, 11));
    }

    #[test]
    fn unlimited_admits_any_count() {
        let eval = evaluator();
        for count in [0, 1, 10_000, u32::MAX] {
            assert!(eval.can_perform(PlanTier::Premium, Feature::WatchlistLimit, count));
        }
    }

    #[test]
    fn evaluate_denies_anonymous_callers_on_identity_features() {
        let eval = evaluator();
        // Regardless of plan or count
        for tier in PlanTier::ALL {
            let result = eval.evaluate(tier, Feature::WatchlistLimit, 0, false);
            assert!(!result.available);
            assert_eq!(result.reason, AccessReason::Unauthenticated);
            assert_eq!(result.suggested_plan, None);
        }
    }

    #[test]
    fn evaluate_reports_limit_reached_at_the_cap() {
        let eval = evaluator();

        let at_cap = eval.evaluate(PlanTier::Free, Feature::WatchlistLimit, 10, true);
        assert!(!at_cap.available);
        assert_eq!(at_cap.reason, AccessReason::LimitReached);
        assert_eq!(at_cap.suggested_plan, Some(PlanTier::Basic));
        assert_eq!(at_cap.limit, Some(Limit::Finite(10)));

        let under_cap = eval.evaluate(PlanTier::Free, Feature::WatchlistLimit, 9, true);
        assert!(under_cap.available);
        assert_eq!(under_cap.reason, AccessReason::Allowed);
    }

    #[test]
    fn evaluate_reports_plan_restriction_before_limits() {
        let eval = evaluator();
        let result = eval.evaluate(PlanTier::Free, Feature::Recommendations, 0, true);
        assert!(!result.available);
        assert_eq!(result.reason, AccessReason::PlanRestricted);
        assert_eq!(result.suggested_plan, Some(PlanTier::Basic));

        let basic = eval.evaluate(PlanTier::Basic, Feature::PrivateMessages, 0, true);
        assert_eq!(basic.reason, AccessReason::PlanRestricted);
        assert_eq!(basic.suggested_plan, Some(PlanTier::Premium));
    }

    #[test]
    fn evaluate_allows_boolean_features_without_limit_info() {
        let eval = evaluator();
        let result = eval.evaluate(PlanTier::Basic, Feature::AdvancedSearch, 0, true);
        assert!(result.available);
        assert_eq!(result.limit, None);
        assert_eq!(result.current_count, None);
    }

    #[test]
    fn custom_table_can_replace_the_rules() {
        use crate::permissions::Permission;
        use std::collections::HashMap;

        let mut grants: HashMap<PlanTier, HashMap<Feature, Permission>> = HashMap::new();
        for tier in PlanTier::ALL {
            let mut set = HashMap::new();
            for feature in Feature::ALL {
                set.insert(feature, Permission::Granted);
            }
            grants.insert(tier, set);
        }
        let table = PermissionTable::from_grants(grants).unwrap();
        let eval = EntitlementEvaluator::new(table);

        assert!(eval.has_access(PlanTier::Free, Feature::ExclusiveContent));
    }
}
