//! Shared types for the FlickNet backend
//!
//! The pure domain core of the catalog service: plan tiers, the plan
//! permission table, the entitlement evaluator, and the unified API
//! error/response structures. Nothing in this crate touches the network
//! or the database; the `db` feature only adds derive support so the
//! server can read these types straight out of SQLite rows.

pub mod entitlements;
pub mod error;
pub mod permissions;
pub mod plan;
pub mod response;

// Re-exports
pub use entitlements::{AccessReason, Entitlement, EntitlementEvaluator};
pub use error::{ApiError, ApiErrorCode, ApiResult};
pub use permissions::{Feature, Limit, Permission, PermissionTable, TableError};
pub use plan::{BillingCycle, PlanTier, SubscriptionStatus};
pub use response::{ApiResponse, PaginatedResponse};
