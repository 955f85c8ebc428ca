//! Catalog query engine integration tests

mod common;

use common::{MovieSeed, deactivate_movie, seed_movie, test_pool};
use flicknet_server::catalog::{CatalogQuery, RawCatalogParams, SortField, SortOrder};
use flicknet_server::db::repository::MovieRepository;

fn query(mutator: impl FnOnce(&mut CatalogQuery)) -> CatalogQuery {
    let mut q = CatalogQuery::default();
    mutator(&mut q);
    q
}

#[tokio::test]
async fn year_filter_matches_exactly() {
    let pool = test_pool().await;
    seed_movie(&pool, MovieSeed { title: "Old", year: 2020, ..Default::default() }).await;
    let mid = seed_movie(&pool, MovieSeed { title: "Mid", year: 2021, ..Default::default() }).await;
    seed_movie(&pool, MovieSeed { title: "New", year: 2022, ..Default::default() }).await;

    let repo = MovieRepository::new(pool.clone());
    let (movies, total) = repo
        .search(&query(|q| q.year = Some(2021)))
        .await
        .unwrap();

    assert_eq!(total, 1);
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].id, mid.id);
}

#[tokio::test]
async fn inactive_movies_never_appear() {
    let pool = test_pool().await;
    let visible =
        seed_movie(&pool, MovieSeed { title: "Visible", year: 2021, ..Default::default() }).await;
    let hidden =
        seed_movie(&pool, MovieSeed { title: "Hidden", year: 2021, ..Default::default() }).await;
    deactivate_movie(&pool, hidden.id).await;

    let repo = MovieRepository::new(pool.clone());

    let (movies, total) = repo
        .search(&query(|q| q.year = Some(2021)))
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(movies[0].id, visible.id);

    // Not even when searched for by name
    let (movies, _) = repo
        .search(&query(|q| q.search = Some("Hidden".into())))
        .await
        .unwrap();
    assert!(movies.is_empty());

    // And not through the detail lookup either
    assert!(repo.find_active_by_id(hidden.id).await.unwrap().is_none());
}

#[tokio::test]
async fn search_is_case_insensitive_across_fields() {
    let pool = test_pool().await;
    let movie =
        seed_movie(&pool, MovieSeed { title: "The Matrix", year: 1999, ..Default::default() })
            .await;
    seed_movie(&pool, MovieSeed { title: "Unrelated", year: 1999, ..Default::default() }).await;

    // Give it a cast to search through
    sqlx::query("UPDATE movies SET cast_list = ?, director = ? WHERE id = ?")
        .bind(r#"["Keanu Reeves","Carrie-Anne Moss"]"#)
        .bind("Lana Wachowski")
        .bind(movie.id)
        .execute(&pool)
        .await
        .unwrap();

    let repo = MovieRepository::new(pool.clone());

    for term in ["matrix", "MATRIX", "keanu", "wachowski", "Matrix description"] {
        let (movies, _) = repo
            .search(&query(|q| q.search = Some(term.into())))
            .await
            .unwrap();
        assert_eq!(movies.len(), 1, "search {term:?} should match exactly one");
        assert_eq!(movies[0].id, movie.id, "search {term:?} matched the wrong movie");
    }
}

#[tokio::test]
async fn filters_are_additive() {
    let pool = test_pool().await;
    let action_2021 = seed_movie(
        &pool,
        MovieSeed { title: "Strike One", year: 2021, genres: &["Action"], ..Default::default() },
    )
    .await;
    // Same genre, wrong year
    seed_movie(
        &pool,
        MovieSeed { title: "Strike Two", year: 2020, genres: &["Action"], ..Default::default() },
    )
    .await;
    // Same year, wrong genre
    seed_movie(
        &pool,
        MovieSeed { title: "Strike Three", year: 2021, genres: &["Drama"], ..Default::default() },
    )
    .await;

    let repo = MovieRepository::new(pool.clone());
    let (movies, total) = repo
        .search(&query(|q| {
            q.search = Some("Strike".into());
            q.genre = Some("Action".into());
            q.year = Some(2021);
        }))
        .await
        .unwrap();

    assert_eq!(total, 1);
    assert_eq!(movies[0].id, action_2021.id);
}

#[tokio::test]
async fn default_sort_is_newest_created_first() {
    let pool = test_pool().await;
    let first = seed_movie(&pool, MovieSeed { title: "First", ..Default::default() }).await;
    let second = seed_movie(&pool, MovieSeed { title: "Second", ..Default::default() }).await;

    let repo = MovieRepository::new(pool.clone());
    let (movies, _) = repo.search(&CatalogQuery::default()).await.unwrap();

    assert_eq!(movies.first().unwrap().id, second.id);
    assert_eq!(movies.last().unwrap().id, first.id);
}

#[tokio::test]
async fn sort_override_by_year_ascending() {
    let pool = test_pool().await;
    seed_movie(&pool, MovieSeed { title: "B", year: 2005, ..Default::default() }).await;
    seed_movie(&pool, MovieSeed { title: "A", year: 1990, ..Default::default() }).await;
    seed_movie(&pool, MovieSeed { title: "C", year: 2015, ..Default::default() }).await;

    let repo = MovieRepository::new(pool.clone());
    let (movies, _) = repo
        .search(&query(|q| {
            q.sort = SortField::Year;
            q.order = SortOrder::Asc;
        }))
        .await
        .unwrap();

    let years: Vec<i64> = movies.iter().map(|m| m.year).collect();
    assert_eq!(years, vec![1990, 2005, 2015]);
}

#[tokio::test]
async fn pagination_math_and_boundaries() {
    let pool = test_pool().await;
    for i in 0..25 {
        seed_movie(&pool, MovieSeed { title: "Bulk", year: 2000 + i, ..Default::default() }).await;
    }

    let repo = MovieRepository::new(pool.clone());

    let (page_one, total) = repo
        .search(&query(|q| {
            q.page = 1;
            q.limit = 10;
        }))
        .await
        .unwrap();
    assert_eq!(total, 25);
    assert_eq!(page_one.len(), 10);

    let (page_three, _) = repo
        .search(&query(|q| {
            q.page = 3;
            q.limit = 10;
        }))
        .await
        .unwrap();
    assert_eq!(page_three.len(), 5);

    let (beyond, _) = repo
        .search(&query(|q| {
            q.page = 4;
            q.limit = 10;
        }))
        .await
        .unwrap();
    assert!(beyond.is_empty());
}

#[tokio::test]
async fn raw_params_flow_through_to_results() {
    let pool = test_pool().await;
    seed_movie(
        &pool,
        MovieSeed { title: "Parsed", year: 2021, genres: &["Sci-Fi"], ..Default::default() },
    )
    .await;

    let parsed = CatalogQuery::parse(RawCatalogParams {
        genre: Some("Sci-Fi".into()),
        year: Some("2021".into()),
        ..Default::default()
    })
    .unwrap();

    let repo = MovieRepository::new(pool.clone());
    let (movies, _) = repo.search(&parsed).await.unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].title, "Parsed");
}
