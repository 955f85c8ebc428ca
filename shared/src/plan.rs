//! Plan tiers and subscription vocabulary
//!
//! The three FlickNet tiers and their billing metadata. Pricing is held
//! in integer cents so the numbers survive SQLite round-trips without
//! floating-point drift.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription tier attached to every user and subscription record.
///
/// Variant order matters: the derived `Ord` gives free < basic < premium,
/// which the permission table's monotonicity check relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PlanTier {
    Free,
    Basic,
    Premium,
}

impl PlanTier {
    pub const ALL: [PlanTier; 3] = [PlanTier::Free, PlanTier::Basic, PlanTier::Premium];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Basic => "basic",
            PlanTier::Premium => "premium",
        }
    }

    /// Marketing name shown in the public plan catalog
    pub fn display_name(&self) -> &'static str {
        match self {
            PlanTier::Free => "Free",
            PlanTier::Basic => "Basic",
            PlanTier::Premium => "Premium",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PlanTier::Free => "Perfect for casual movie browsing",
            PlanTier::Basic => "Enhanced features for movie enthusiasts",
            PlanTier::Premium => "Complete access to all FlickNet features",
        }
    }

    /// Next tier to suggest when a feature is denied on this plan
    pub fn upgrade_target(&self) -> Option<PlanTier> {
        match self {
            PlanTier::Free => Some(PlanTier::Basic),
            PlanTier::Basic => Some(PlanTier::Premium),
            PlanTier::Premium => None,
        }
    }

    pub fn is_paid(&self) -> bool {
        *self != PlanTier::Free
    }

    /// Price in cents for one billing period
    pub fn price_cents(&self, cycle: BillingCycle) -> i64 {
        match (self, cycle) {
            (PlanTier::Free, _) => 0,
            (PlanTier::Basic, BillingCycle::Monthly) => 999,
            (PlanTier::Basic, BillingCycle::Yearly) => 9_999,
            (PlanTier::Premium, BillingCycle::Monthly) => 1_999,
            (PlanTier::Premium, BillingCycle::Yearly) => 19_999,
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(PlanTier::Free),
            "basic" => Ok(PlanTier::Basic),
            "premium" => Ok(PlanTier::Premium),
            other => Err(format!("unknown plan tier: {other}")),
        }
    }
}

/// Billing period for paid plans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingCycle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(BillingCycle::Monthly),
            "yearly" => Ok(BillingCycle::Yearly),
            other => Err(format!("unknown billing cycle: {other}")),
        }
    }
}

/// Lifecycle status of a subscription record.
///
/// Subscriptions are never hard-deleted; cancellation is a transition
/// to `Cancelled` with the plan dropped back to free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Cancelled,
    Inactive,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_order_free_to_premium() {
        assert!(PlanTier::Free < PlanTier::Basic);
        assert!(PlanTier::Basic < PlanTier::Premium);
    }

    #[test]
    fn upgrade_targets() {
        assert_eq!(PlanTier::Free.upgrade_target(), Some(PlanTier::Basic));
        assert_eq!(PlanTier::Basic.upgrade_target(), Some(PlanTier::Premium));
        assert_eq!(PlanTier::Premium.upgrade_target(), None);
    }

    #[test]
    fn pricing_matches_catalog() {
        assert_eq!(PlanTier::Free.price_cents(BillingCycle::Monthly), 0);
        assert_eq!(PlanTier::Basic.price_cents(BillingCycle::Monthly), 999);
        assert_eq!(PlanTier::Basic.price_cents(BillingCycle::Yearly), 9_999);
        assert_eq!(PlanTier::Premium.price_cents(BillingCycle::Monthly), 1_999);
        assert_eq!(PlanTier::Premium.price_cents(BillingCycle::Yearly), 19_999);
    }

    #[test]
    fn tier_round_trips_through_str() {
        for tier in PlanTier::ALL {
            assert_eq!(tier.as_str().parse::<PlanTier>().unwrap(), tier);
        }
        assert!("platinum".parse::<PlanTier>().is_err());
    }
}
