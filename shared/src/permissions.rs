//! Plan permission table
//!
//! Static mapping from plan tier to the set of feature permissions that
//! tier grants. The table is built once at startup and injected wherever
//! access decisions are made; nothing here is a mutable global.
//!
//! Two invariants are enforced at construction time instead of being
//! discovered at lookup time:
//!
//! - **Exhaustiveness**: every [`Feature`] has an entry for every
//!   [`PlanTier`]. A miss on a hand-built table is a configuration
//!   error, not a runtime condition.
//! - **Monotonic upgrades**: moving free → basic → premium never makes
//!   a permission more restrictive.

use crate::plan::PlanTier;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// A feature key known to the access-control system.
///
/// This is a closed set: handlers cannot ask about a feature that does
/// not exist, so the "unknown feature key" failure mode of a
/// string-keyed table is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    // Basic features
    MovieBrowsing,
    BasicSearch,
    MovieDetails,

    // Counted features
    WatchlistLimit,
    RatingsLimit,
    ReviewsLimit,
    MultipleProfiles,

    // Gated features
    AdvancedSearch,
    Recommendations,
    CommunityFeatures,
    PrioritySupport,
    ExclusiveContent,
    DownloadReceipts,
    HdStreaming,
    OfflineViewing,

    // Community
    CreatePosts,
    JoinGroups,
    PrivateMessages,

    // Analytics
    ViewingHistory,
    WatchingStats,
    PersonalizedReports,
}

impl Feature {
    pub const ALL: [Feature; 21] = [
        Feature::MovieBrowsing,
        Feature::BasicSearch,
        Feature::MovieDetails,
        Feature::WatchlistLimit,
        Feature::RatingsLimit,
        Feature::ReviewsLimit,
        Feature::MultipleProfiles,
        Feature::AdvancedSearch,
        Feature::Recommendations,
        Feature::CommunityFeatures,
        Feature::PrioritySupport,
        Feature::ExclusiveContent,
        Feature::DownloadReceipts,
        Feature::HdStreaming,
        Feature::OfflineViewing,
        Feature::CreatePosts,
        Feature::JoinGroups,
        Feature::PrivateMessages,
        Feature::ViewingHistory,
        Feature::WatchingStats,
        Feature::PersonalizedReports,
    ];

    /// Wire/display name of the feature key
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::MovieBrowsing => "movieBrowsing",
            Feature::BasicSearch => "basicSearch",
            Feature::MovieDetails => "movieDetails",
            Feature::WatchlistLimit => "watchlistLimit",
            Feature::RatingsLimit => "ratingsLimit",
            Feature::ReviewsLimit => "reviewsLimit",
            Feature::MultipleProfiles => "multipleProfiles",
            Feature::AdvancedSearch => "advancedSearch",
            Feature::Recommendations => "recommendations",
            Feature::CommunityFeatures => "communityFeatures",
            Feature::PrioritySupport => "prioritySupport",
            Feature::ExclusiveContent => "exclusiveContent",
            Feature::DownloadReceipts => "downloadReceipts",
            Feature::HdStreaming => "hdStreaming",
            Feature::OfflineViewing => "offlineViewing",
            Feature::CreatePosts => "createPosts",
            Feature::JoinGroups => "joinGroups",
            Feature::PrivateMessages => "privateMessages",
            Feature::ViewingHistory => "viewingHistory",
            Feature::WatchingStats => "watchingStats",
            Feature::PersonalizedReports => "personalizedReports",
        }
    }

    /// Whether the feature only makes sense for a signed-in identity.
    ///
    /// Anonymous callers are denied these outright, before any plan
    /// check. Kept as a per-key attribute so the rule stays data-driven
    /// and testable rather than an allow-list buried in a handler.
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Feature::WatchlistLimit
                | Feature::RatingsLimit
                | Feature::ReviewsLimit
                | Feature::CommunityFeatures
                | Feature::DownloadReceipts
                | Feature::ViewingHistory
                | Feature::WatchingStats
                | Feature::PersonalizedReports
                | Feature::CreatePosts
                | Feature::JoinGroups
                | Feature::PrivateMessages
        )
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown feature: {s}"))
    }
}

/// Numeric cap on a counted feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Finite(u32),
    Unlimited,
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Limit::Finite(n) => serializer.serialize_u32(*n),
            Limit::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

impl Limit {
    /// Strict check: a count equal to a finite limit is already over it
    pub fn admits(&self, current_count: u32) -> bool {
        match self {
            Limit::Finite(limit) => current_count < *limit,
            Limit::Unlimited => true,
        }
    }
}

/// Permission value for one (tier, feature) cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Boolean gate, off
    Denied,
    /// Boolean gate, on
    Granted,
    /// Counted feature with a finite cap
    Limit(u32),
    /// Counted feature with no cap
    Unlimited,
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Permission::Denied => serializer.serialize_bool(false),
            Permission::Granted => serializer.serialize_bool(true),
            Permission::Limit(n) => serializer.serialize_u32(*n),
            Permission::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

impl Permission {
    /// Does this cell grant any access at all? A finite limit of zero
    /// does not.
    pub fn allows_any(&self) -> bool {
        match self {
            Permission::Denied => false,
            Permission::Granted => true,
            Permission::Limit(n) => *n > 0,
            Permission::Unlimited => true,
        }
    }

    /// The numeric cap, if this is a counted feature
    pub fn limit(&self) -> Option<Limit> {
        match self {
            Permission::Limit(n) => Some(Limit::Finite(*n)),
            Permission::Unlimited => Some(Limit::Unlimited),
            Permission::Denied | Permission::Granted => None,
        }
    }

    /// True when `self` is at least as permissive as `lower`.
    ///
    /// A boolean grant may widen into a numeric one across tiers (the
    /// profiles feature does this: off on free, capped on basic), so
    /// mixed kinds are comparable as long as access never shrinks.
    fn at_least(&self, lower: &Permission) -> bool {
        match (lower, self) {
            (Permission::Denied, _) => true,
            (Permission::Granted, Permission::Granted | Permission::Unlimited) => true,
            (Permission::Granted, Permission::Limit(n)) => *n > 0,
            (Permission::Limit(a), Permission::Limit(b)) => b >= a,
            (Permission::Limit(_), Permission::Unlimited) => true,
            (Permission::Unlimited, Permission::Unlimited) => true,
            _ => false,
        }
    }
}

/// Problems detected while validating a permission table
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("permission table has no entry for {feature} on plan {tier}")]
    MissingEntry { tier: PlanTier, feature: Feature },

    #[error("{feature} is more restrictive on {higher} than on {lower}")]
    NonMonotonic {
        feature: Feature,
        lower: PlanTier,
        higher: PlanTier,
    },
}

/// Immutable tier → feature → permission mapping.
///
/// Built once (usually via [`PermissionTable::standard`]) and shared
/// behind an `Arc` in application state, so tests can swap in their own
/// rules without touching process globals.
#[derive(Debug, Clone)]
pub struct PermissionTable {
    grants: HashMap<PlanTier, HashMap<Feature, Permission>>,
}

impl PermissionTable {
    /// The production FlickNet permission matrix
    pub fn standard() -> Self {
        let mut grants = HashMap::new();
        for tier in PlanTier::ALL {
            grants.insert(tier, tier_grants(tier));
        }
        let table = Self { grants };
        debug_assert!(table.validate().is_ok(), "standard table must validate");
        table
    }

    /// Build a table from explicit grants, rejecting incomplete or
    /// non-monotonic configurations
    pub fn from_grants(
        grants: HashMap<PlanTier, HashMap<Feature, Permission>>,
    ) -> Result<Self, TableError> {
        let table = Self { grants };
        table.validate()?;
        Ok(table)
    }

    /// Look up the permission for a feature under a plan.
    ///
    /// A validated table cannot miss. If a miss happens anyway the
    /// lookup denies and logs loudly rather than panicking a request.
    pub fn permission(&self, tier: PlanTier, feature: Feature) -> Permission {
        match self.grants.get(&tier).and_then(|set| set.get(&feature)) {
            Some(permission) => *permission,
            None => {
                tracing::error!(
                    target: "entitlements",
                    plan = %tier,
                    feature = %feature,
                    "permission table miss, denying"
                );
                Permission::Denied
            }
        }
    }

    /// Check exhaustiveness and the monotonic-upgrade property
    pub fn validate(&self) -> Result<(), TableError> {
        for tier in PlanTier::ALL {
            let set = self.grants.get(&tier);
            for feature in Feature::ALL {
                if set.and_then(|s| s.get(&feature)).is_none() {
                    return Err(TableError::MissingEntry { tier, feature });
                }
            }
        }

        for pair in PlanTier::ALL.windows(2) {
            let (lower, higher) = (pair[0], pair[1]);
            for feature in Feature::ALL {
                let low = self.grants[&lower][&feature];
                let high = self.grants[&higher][&feature];
                if !high.at_least(&low) {
                    return Err(TableError::NonMonotonic {
                        feature,
                        lower,
                        higher,
                    });
                }
            }
        }

        Ok(())
    }
}

fn tier_grants(tier: PlanTier) -> HashMap<Feature, Permission> {
    use Feature::*;
    use Permission::*;

    let entries: &[(Feature, Permission)] = match tier {
        PlanTier::Free => &[
            (MovieBrowsing, Granted),
            (BasicSearch, Granted),
            (MovieDetails, Granted),
            (WatchlistLimit, Limit(10)),
            (RatingsLimit, Limit(5)),
            (ReviewsLimit, Limit(2)),
            (MultipleProfiles, Denied),
            (AdvancedSearch, Denied),
            (Recommendations, Denied),
            (CommunityFeatures, Denied),
            (PrioritySupport, Denied),
            (ExclusiveContent, Denied),
            (DownloadReceipts, Denied),
            (HdStreaming, Denied),
            (OfflineViewing, Denied),
            (CreatePosts, Denied),
            (JoinGroups, Denied),
            (PrivateMessages, Denied),
            (ViewingHistory, Granted),
            (WatchingStats, Denied),
            (PersonalizedReports, Denied),
        ],
        PlanTier::Basic => &[
            (MovieBrowsing, Granted),
            (BasicSearch, Granted),
            (MovieDetails, Granted),
            (WatchlistLimit, Limit(100)),
            (RatingsLimit, Limit(50)),
            (ReviewsLimit, Limit(20)),
            (MultipleProfiles, Limit(2)),
            (AdvancedSearch, Granted),
            (Recommendations, Granted),
            (CommunityFeatures, Granted),
            (PrioritySupport, Denied),
            (ExclusiveContent, Denied),
            (DownloadReceipts, Granted),
            (HdStreaming, Granted),
            (OfflineViewing, Denied),
            (CreatePosts, Granted),
            (JoinGroups, Granted),
            (PrivateMessages, Denied),
            (ViewingHistory, Granted),
            (WatchingStats, Granted),
            (PersonalizedReports, Denied),
        ],
        PlanTier::Premium => &[
            (MovieBrowsing, Granted),
            (BasicSearch, Granted),
            (MovieDetails, Granted),
            (WatchlistLimit, Unlimited),
            (RatingsLimit, Unlimited),
            (ReviewsLimit, Unlimited),
            (MultipleProfiles, Limit(5)),
            (AdvancedSearch, Granted),
            (Recommendations, Granted),
            (CommunityFeatures, Granted),
            (PrioritySupport, Granted),
            (ExclusiveContent, Granted),
            (DownloadReceipts, Granted),
            (HdStreaming, Granted),
            (OfflineViewing, Granted),
            (CreatePosts, Granted),
            (JoinGroups, Granted),
            (PrivateMessages, Granted),
            (ViewingHistory, Granted),
            (WatchingStats, Granted),
            (PersonalizedReports, Granted),
        ],
    };

    entries.iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_is_valid() {
        assert_eq!(PermissionTable::standard().validate(), Ok(()));
    }

    #[test]
    fn access_is_monotonic_across_tiers() {
        let table = PermissionTable::standard();
        for feature in Feature::ALL {
            let mut prev_allowed = false;
            for tier in PlanTier::ALL {
                let allowed = table.permission(tier, feature).allows_any();
                assert!(
                    allowed || !prev_allowed,
                    "{feature} lost access moving up to {tier}"
                );
                prev_allowed = allowed;
            }
        }
    }

    #[test]
    fn free_tier_limits_match_catalog() {
        let table = PermissionTable::standard();
        assert_eq!(
            table.permission(PlanTier::Free, Feature::WatchlistLimit),
            Permission::Limit(10)
        );
        assert_eq!(
            table.permission(PlanTier::Free, Feature::RatingsLimit),
            Permission::Limit(5)
        );
        assert_eq!(
            table.permission(PlanTier::Free, Feature::ReviewsLimit),
            Permission::Limit(2)
        );
    }

    #[test]
    fn premium_counted_features_are_unlimited() {
        let table = PermissionTable::standard();
        for feature in [
            Feature::WatchlistLimit,
            Feature::RatingsLimit,
            Feature::ReviewsLimit,
        ] {
            assert_eq!(
                table.permission(PlanTier::Premium, feature),
                Permission::Unlimited
            );
        }
    }

    #[test]
    fn incomplete_table_is_rejected() {
        let mut grants: HashMap<PlanTier, HashMap<Feature, Permission>> = HashMap::new();
        for tier in PlanTier::ALL {
            grants.insert(tier, tier_grants(tier));
        }
        grants
            .get_mut(&PlanTier::Basic)
            .unwrap()
            .remove(&Feature::HdStreaming);

        let err = PermissionTable::from_grants(grants).unwrap_err();
        assert_eq!(
            err,
            TableError::MissingEntry {
                tier: PlanTier::Basic,
                feature: Feature::HdStreaming,
            }
        );
    }

    #[test]
    fn non_monotonic_table_is_rejected() {
        let mut grants: HashMap<PlanTier, HashMap<Feature, Permission>> = HashMap::new();
        for tier in PlanTier::ALL {
            grants.insert(tier, tier_grants(tier));
        }
        // Shrink the premium watchlist below the basic one
        grants
            .get_mut(&PlanTier::Premium)
            .unwrap()
            .insert(Feature::WatchlistLimit, Permission::Limit(50));

        let err = PermissionTable::from_grants(grants).unwrap_err();
        assert_eq!(
            err,
            TableError::NonMonotonic {
                feature: Feature::WatchlistLimit,
                lower: PlanTier::Basic,
                higher: PlanTier::Premium,
            }
        );
    }

    #[test]
    fn zero_limit_grants_no_access() {
        assert!(!Permission::Limit(0).allows_any());
        assert!(Permission::Limit(1).allows_any());
    }

    #[test]
    fn auth_required_features_are_the_identity_bound_ones() {
        assert!(Feature::WatchlistLimit.requires_auth());
        assert!(Feature::PrivateMessages.requires_auth());
        assert!(!Feature::MovieBrowsing.requires_auth());
        assert!(!Feature::AdvancedSearch.requires_auth());
    }
}
