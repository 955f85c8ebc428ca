//! FlickNet server - movie discovery and streaming-catalog backend
//!
//! # Architecture
//!
//! - **Entitlements** (`shared`): plan permission table + evaluator,
//!   injected into [`AppState`]
//! - **Database** (`db`): SQLite via sqlx, models + repositories
//! - **Auth** (`auth`): JWT + argon2, role middleware
//! - **Catalog** (`catalog`): filter/sort/search/pagination engine
//! - **Subscriptions** (`subscriptions`): plan lifecycle state machine
//! - **Recommendations** (`recommendations`): genre-affinity heuristic
//! - **HTTP API** (`api`): axum routers and handlers
//!
//! # Module layout
//!
//! ```text
//! server/src/
//! ├── core/             # config, state, server startup
//! ├── auth/             # JWT, passwords, role middleware
//! ├── db/               # models + repositories
//! ├── catalog/          # movie query engine
//! ├── subscriptions/    # lifecycle service
//! ├── recommendations/  # recommendation heuristic
//! ├── notifications/    # fire-and-forget notifier
//! ├── api/              # HTTP routes and handlers
//! └── utils/            # logging, validation, response helpers
//! ```

pub mod api;
pub mod auth;
pub mod catalog;
pub mod core;
pub mod db;
pub mod notifications;
pub mod recommendations;
pub mod subscriptions;
pub mod utils;

// Re-export common types
pub use auth::{CurrentUser, JwtService};
pub use core::{AppState, Config, Server};
pub use utils::{ApiError, ApiResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - structured events under the `security` target
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
    ________    _      __   _   __     __
   / ____/ /   (_)____/ /__/ | / /__  / /_
  / /_  / /   / / ___/ //_/  |/ / _ \/ __/
 / __/ / /___/ / /__/ ,< / /|  /  __/ /_
/_/   /_____/_/\___/_/|_/_/ |_/\___/\__/
    "#
    );
}
