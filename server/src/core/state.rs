//! Application state

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use shared::{ApiError, EntitlementEvaluator};
use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::notifications::NotificationService;
use crate::recommendations::RecommendationService;
use crate::subscriptions::SubscriptionService;

/// Shared state handed to every handler.
///
/// Cheap to clone: the pool and services are reference-counted
/// internally. The entitlement evaluator is injected here once, so
/// tests can run the whole stack against their own permission rules.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub entitlements: Arc<EntitlementEvaluator>,
    pub notifier: NotificationService,
}

impl AppState {
    /// Initialize state against the configured database file
    pub async fn initialize(config: &Config) -> Result<Self, ApiError> {
        let db_service = DbService::new(&config.database_path).await?;
        Ok(Self::assemble(config.clone(), db_service.pool))
    }

    /// State over an existing pool (tests use an in-memory database)
    pub fn with_pool(config: Config, pool: SqlitePool) -> Self {
        Self::assemble(config, pool)
    }

    fn assemble(config: Config, pool: SqlitePool) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let entitlements = Arc::new(EntitlementEvaluator::standard());
        let notifier = NotificationService::new(pool.clone());

        Self {
            config,
            db: pool,
            jwt_service,
            entitlements,
            notifier,
        }
    }

    pub fn subscriptions(&self) -> SubscriptionService {
        SubscriptionService::new(
            self.db.clone(),
            self.notifier.clone(),
            self.entitlements.clone(),
        )
    }

    pub fn recommendations(&self) -> RecommendationService {
        RecommendationService::new(self.db.clone())
    }

    /// Start background tasks. Currently one: the subscription
    /// period-end sweep that enacts deferred cancellations.
    pub fn start_background_tasks(&self) {
        let service = self.subscriptions();
        let interval_secs = self.config.expiry_sweep_interval_secs.max(1);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
            // First tick fires immediately; run the sweep right at boot
            loop {
                ticker.tick().await;
                match service.expire_due(Utc::now()).await {
                    Ok(0) => {}
                    Ok(count) => {
                        tracing::info!(
                            target: "subscriptions",
                            count,
                            "Expiry sweep downgraded subscriptions"
                        );
                    }
                    Err(e) => {
                        tracing::error!(target: "subscriptions", error = %e, "Expiry sweep failed");
                    }
                }
            }
        });
    }
}
