//! Shared helpers for integration tests

#![allow(dead_code)]

use flicknet_server::db::DbService;
use flicknet_server::db::models::{Movie, MovieCreate, MovieStatus, User, UserCreate};
use flicknet_server::db::repository::{MovieRepository, UserRepository};
use flicknet_server::notifications::NotificationService;
use flicknet_server::subscriptions::SubscriptionService;
use shared::EntitlementEvaluator;
use sqlx::SqlitePool;
use std::sync::Arc;

pub async fn test_pool() -> SqlitePool {
    DbService::in_memory()
        .await
        .expect("failed to open in-memory database")
        .pool
}

pub fn subscription_service(pool: &SqlitePool) -> SubscriptionService {
    SubscriptionService::new(
        pool.clone(),
        NotificationService::new(pool.clone()),
        Arc::new(EntitlementEvaluator::standard()),
    )
}

pub async fn create_user(pool: &SqlitePool, username: &str) -> User {
    UserRepository::new(pool.clone())
        .create(UserCreate {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            // Not a real hash; none of these tests log in
            password_hash: "test-hash".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
        })
        .await
        .expect("failed to create test user")
}

pub struct MovieSeed<'a> {
    pub title: &'a str,
    pub year: i64,
    pub genres: &'a [&'a str],
    pub rating: f64,
    pub views: i64,
}

impl Default for MovieSeed<'_> {
    fn default() -> Self {
        Self {
            title: "Untitled",
            year: 2020,
            genres: &[],
            rating: 5.0,
            views: 0,
        }
    }
}

pub async fn seed_movie(pool: &SqlitePool, seed: MovieSeed<'_>) -> Movie {
    let repo = MovieRepository::new(pool.clone());
    let movie = repo
        .create(MovieCreate {
            title: seed.title.to_string(),
            description: format!("{} description", seed.title),
            director: "Test Director".to_string(),
            genres: seed.genres.iter().map(|g| g.to_string()).collect(),
            cast: vec![],
            year: seed.year,
            rating: seed.rating,
            status: Some(MovieStatus::Released),
            poster: None,
        })
        .await
        .expect("failed to seed movie");

    if seed.views != 0 {
        sqlx::query("UPDATE movies SET views = ? WHERE id = ?")
            .bind(seed.views)
            .bind(movie.id)
            .execute(pool)
            .await
            .expect("failed to set views");
    }

    repo.find_by_id(movie.id)
        .await
        .expect("failed to reload movie")
        .expect("seeded movie vanished")
}

pub async fn deactivate_movie(pool: &SqlitePool, id: i64) {
    MovieRepository::new(pool.clone())
        .deactivate(id)
        .await
        .expect("failed to deactivate movie");
}
