//! Recommendation heuristic integration tests

mod common;

use common::{MovieSeed, create_user, seed_movie, test_pool};
use flicknet_server::db::repository::{RatingRepository, WatchlistRepository};
use flicknet_server::recommendations::RecommendationService;

#[tokio::test]
async fn liked_genres_drive_the_candidate_pool() {
    let pool = test_pool().await;
    let user = create_user(&pool, "cinephile").await;

    let liked = seed_movie(
        &pool,
        MovieSeed { title: "Seed Action", genres: &["Action"], rating: 6.0, ..Default::default() },
    )
    .await;
    let best = seed_movie(
        &pool,
        MovieSeed { title: "Best Action", genres: &["Action"], rating: 9.0, views: 10, ..Default::default() },
    )
    .await;
    let second = seed_movie(
        &pool,
        MovieSeed { title: "Popular Action", genres: &["Action"], rating: 8.0, views: 900, ..Default::default() },
    )
    .await;
    let third = seed_movie(
        &pool,
        MovieSeed { title: "Quiet Action", genres: &["Action"], rating: 8.0, views: 5, ..Default::default() },
    )
    .await;
    // Wrong genre, excellent rating: must not appear
    seed_movie(
        &pool,
        MovieSeed { title: "Great Romance", genres: &["Romance"], rating: 9.9, ..Default::default() },
    )
    .await;

    RatingRepository::new(pool.clone())
        .rate(user.id, liked.id, 9)
        .await
        .unwrap();

    let picks = RecommendationService::new(pool.clone())
        .for_user(user.id, 3)
        .await
        .unwrap();

    // Sorted rating DESC, then views DESC; the rated seed is excluded
    let ids: Vec<i64> = picks.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![best.id, second.id, third.id]);
}

#[tokio::test]
async fn rated_and_watchlisted_movies_are_excluded_from_candidates() {
    let pool = test_pool().await;
    let user = create_user(&pool, "selective").await;

    let liked = seed_movie(
        &pool,
        MovieSeed { title: "Liked", genres: &["Drama"], rating: 7.0, ..Default::default() },
    )
    .await;
    let watchlisted = seed_movie(
        &pool,
        MovieSeed { title: "Saved", genres: &["Drama"], rating: 9.5, ..Default::default() },
    )
    .await;
    let fresh = seed_movie(
        &pool,
        MovieSeed { title: "Fresh", genres: &["Drama"], rating: 8.0, ..Default::default() },
    )
    .await;

    RatingRepository::new(pool.clone())
        .rate(user.id, liked.id, 8)
        .await
        .unwrap();
    WatchlistRepository::new(pool.clone())
        .add(user.id, watchlisted.id)
        .await
        .unwrap();

    // Ask for exactly the candidate pool size so the popularity
    // fallback (which may legitimately resurface rated movies) stays out
    let picks = RecommendationService::new(pool.clone())
        .for_user(user.id, 1)
        .await
        .unwrap();

    let ids: Vec<i64> = picks.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![fresh.id]);
    assert!(!ids.contains(&liked.id), "rated movie leaked into picks");
    assert!(
        !ids.contains(&watchlisted.id),
        "watchlisted movie leaked into picks"
    );
}

#[tokio::test]
async fn popularity_fallback_pads_a_short_candidate_pool() {
    let pool = test_pool().await;
    let user = create_user(&pool, "padded").await;

    let liked = seed_movie(
        &pool,
        MovieSeed { title: "Niche", genres: &["Western"], rating: 7.0, ..Default::default() },
    )
    .await;
    let only_candidate = seed_movie(
        &pool,
        MovieSeed { title: "Other Western", genres: &["Western"], rating: 6.0, ..Default::default() },
    )
    .await;
    let filler_one = seed_movie(
        &pool,
        MovieSeed { title: "Blockbuster", genres: &["Action"], rating: 9.0, views: 1000, ..Default::default() },
    )
    .await;
    let filler_two = seed_movie(
        &pool,
        MovieSeed { title: "Hit", genres: &["Comedy"], rating: 8.5, views: 500, ..Default::default() },
    )
    .await;

    RatingRepository::new(pool.clone())
        .rate(user.id, liked.id, 10)
        .await
        .unwrap();

    let picks = RecommendationService::new(pool.clone())
        .for_user(user.id, 3)
        .await
        .unwrap();

    let ids: Vec<i64> = picks.iter().map(|m| m.id).collect();
    assert_eq!(ids.len(), 3);
    // The genre candidate leads, then popularity fills the rest
    assert_eq!(ids[0], only_candidate.id);
    assert!(ids.contains(&filler_one.id));
    assert!(ids.contains(&filler_two.id));

    // No duplicates
    let mut deduped = ids.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(deduped.len(), ids.len());
}

#[tokio::test]
async fn user_without_liked_movies_gets_the_popularity_fallback() {
    let pool = test_pool().await;
    let user = create_user(&pool, "newcomer").await;

    let top = seed_movie(
        &pool,
        MovieSeed { title: "Top", rating: 9.0, views: 10, ..Default::default() },
    )
    .await;
    let mid = seed_movie(
        &pool,
        MovieSeed { title: "Mid", rating: 8.0, views: 100, ..Default::default() },
    )
    .await;
    let low = seed_movie(
        &pool,
        MovieSeed { title: "Low", rating: 3.0, views: 10_000, ..Default::default() },
    )
    .await;

    // A rating below the liked threshold does not create a genre pool
    // (and at editorial rating 2.0 it sorts below the three above)
    let disliked = seed_movie(
        &pool,
        MovieSeed { title: "Meh", genres: &["Horror"], rating: 2.0, ..Default::default() },
    )
    .await;
    RatingRepository::new(pool.clone())
        .rate(user.id, disliked.id, 3)
        .await
        .unwrap();

    let picks = RecommendationService::new(pool.clone())
        .for_user(user.id, 3)
        .await
        .unwrap();

    let ids: Vec<i64> = picks.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![top.id, mid.id, low.id]);
}

#[tokio::test]
async fn watchlisted_movies_stay_out_of_the_fallback() {
    let pool = test_pool().await;
    let user = create_user(&pool, "watcher").await;

    let saved = seed_movie(
        &pool,
        MovieSeed { title: "Saved Hit", rating: 9.9, views: 9999, ..Default::default() },
    )
    .await;
    let other = seed_movie(
        &pool,
        MovieSeed { title: "Other", rating: 5.0, ..Default::default() },
    )
    .await;

    WatchlistRepository::new(pool.clone())
        .add(user.id, saved.id)
        .await
        .unwrap();

    let picks = RecommendationService::new(pool.clone())
        .for_user(user.id, 5)
        .await
        .unwrap();

    let ids: Vec<i64> = picks.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![other.id]);
}

#[tokio::test]
async fn ties_break_deterministically_by_id() {
    let pool = test_pool().await;
    let user = create_user(&pool, "tiebreaker").await;

    let first = seed_movie(
        &pool,
        MovieSeed { title: "Twin A", rating: 7.0, views: 42, ..Default::default() },
    )
    .await;
    let second = seed_movie(
        &pool,
        MovieSeed { title: "Twin B", rating: 7.0, views: 42, ..Default::default() },
    )
    .await;

    let service = RecommendationService::new(pool.clone());
    for _ in 0..3 {
        let picks = service.for_user(user.id, 2).await.unwrap();
        let ids: Vec<i64> = picks.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }
}
