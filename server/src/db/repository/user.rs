//! User Repository

use super::{RepoError, RepoResult};
use crate::db::models::{User, UserCreate, UserId, UserUpdate};
use chrono::Utc;
use shared::PlanTier;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new account on the free plan
    pub async fn create(&self, data: UserCreate) -> RepoResult<User> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users \
               (username, email, password_hash, first_name, last_name, role, plan, is_active, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, 'user', 'free', 1, ?, ?) \
             RETURNING *",
        )
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match RepoError::from(e) {
            RepoError::Duplicate(_) => RepoError::Duplicate(
                "An account with this email or username already exists".to_string(),
            ),
            other => other,
        })?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Update profile fields a user may change about themselves
    pub async fn update_profile(&self, id: UserId, data: UserUpdate) -> RepoResult<User> {
        let mut set_parts: Vec<&str> = Vec::new();
        if data.username.is_some() {
            set_parts.push("username = ?");
        }
        if data.first_name.is_some() {
            set_parts.push("first_name = ?");
        }
        if data.last_name.is_some() {
            set_parts.push("last_name = ?");
        }

        if set_parts.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("User {id}")));
        }

        let sql = format!(
            "UPDATE users SET {}, updated_at = ? WHERE id = ? RETURNING *",
            set_parts.join(", ")
        );

        let mut query = sqlx::query_as::<_, User>(&sql);
        if let Some(v) = data.username {
            query = query.bind(v);
        }
        if let Some(v) = data.first_name {
            query = query.bind(v);
        }
        if let Some(v) = data.last_name {
            query = query.bind(v);
        }

        let user = query
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match RepoError::from(e) {
                RepoError::Duplicate(_) => RepoError::Duplicate(
                    "An account with this username already exists".to_string(),
                ),
                other => other,
            })?
            .ok_or_else(|| RepoError::NotFound(format!("User {id}")))?;
        Ok(user)
    }

    pub async fn touch_last_login(&self, id: UserId) -> RepoResult<()> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Suspend or reinstate an account
    pub async fn set_active(&self, id: UserId, is_active: bool) -> RepoResult<User> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET is_active = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(is_active)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id}")))?;
        Ok(user)
    }

    /// Users visible to moderators (admins excluded), optional
    /// username/email substring search, newest first
    pub async fn list_for_moderation(
        &self,
        search: Option<&str>,
        page: u32,
        limit: u32,
    ) -> RepoResult<(Vec<User>, u64)> {
        let offset = (page.saturating_sub(1)) * limit;

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM users WHERE role != 'admin'");
        push_search(&mut qb, search);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset as i64);
        let users = qb.build_query_as::<User>().fetch_all(&self.pool).await?;

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM users WHERE role != 'admin'");
        push_search(&mut count_qb, search);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok((users, total as u64))
    }

    /// The user's current plan, cheap read for entitlement checks
    pub async fn plan_of(&self, id: UserId) -> RepoResult<PlanTier> {
        let plan: Option<PlanTier> = sqlx::query_scalar("SELECT plan FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        plan.ok_or_else(|| RepoError::NotFound(format!("User {id}")))
    }
}

fn push_search(qb: &mut QueryBuilder<'_, Sqlite>, search: Option<&str>) {
    if let Some(term) = search {
        let pattern = format!("%{term}%");
        qb.push(" AND (username LIKE ")
            .push_bind(pattern.clone())
            .push(" OR email LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
