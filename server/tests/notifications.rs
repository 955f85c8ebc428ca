//! Notification repository integration tests

mod common;

use common::{create_user, test_pool};
use flicknet_server::db::models::{NotificationCreate, NotificationKind};
use flicknet_server::db::repository::NotificationRepository;

#[tokio::test]
async fn feed_is_per_user_and_newest_first() {
    let pool = test_pool().await;
    let alice = create_user(&pool, "alice").await;
    let bob = create_user(&pool, "bob").await;
    let repo = NotificationRepository::new(pool.clone());

    for i in 0..3 {
        repo.insert(NotificationCreate::new(
            alice.id,
            NotificationKind::SystemAnnouncement,
            format!("Announcement {i}"),
            "body",
        ))
        .await
        .unwrap();
    }
    repo.insert(NotificationCreate::new(
        bob.id,
        NotificationKind::SystemAnnouncement,
        "For Bob",
        "body",
    ))
    .await
    .unwrap();

    let (feed, total) = repo.list(alice.id, false, 1, 10).await.unwrap();
    assert_eq!(total, 3);
    assert_eq!(feed.len(), 3);
    assert_eq!(feed[0].title, "Announcement 2");
    assert!(feed.iter().all(|n| n.user_id == alice.id));
}

#[tokio::test]
async fn read_state_and_unread_count() {
    let pool = test_pool().await;
    let user = create_user(&pool, "reader").await;
    let repo = NotificationRepository::new(pool.clone());

    let first = repo
        .insert(NotificationCreate::new(
            user.id,
            NotificationKind::WatchlistUpdate,
            "One",
            "body",
        ))
        .await
        .unwrap();
    repo.insert(NotificationCreate::new(
        user.id,
        NotificationKind::WatchlistUpdate,
        "Two",
        "body",
    ))
    .await
    .unwrap();

    assert_eq!(repo.unread_count(user.id).await.unwrap(), 2);

    assert!(repo.mark_read(user.id, first.id).await.unwrap());
    assert_eq!(repo.unread_count(user.id).await.unwrap(), 1);

    let (unread, _) = repo.list(user.id, true, 1, 10).await.unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].title, "Two");

    assert_eq!(repo.mark_all_read(user.id).await.unwrap(), 1);
    assert_eq!(repo.unread_count(user.id).await.unwrap(), 0);
}

#[tokio::test]
async fn users_cannot_touch_each_others_notifications() {
    let pool = test_pool().await;
    let owner = create_user(&pool, "owner").await;
    let intruder = create_user(&pool, "intruder").await;
    let repo = NotificationRepository::new(pool.clone());

    let note = repo
        .insert(NotificationCreate::new(
            owner.id,
            NotificationKind::AccountUpdate,
            "Private",
            "body",
        ))
        .await
        .unwrap();

    assert!(!repo.mark_read(intruder.id, note.id).await.unwrap());
    assert!(!repo.delete(intruder.id, note.id).await.unwrap());

    // The owner still sees it unread
    assert_eq!(repo.unread_count(owner.id).await.unwrap(), 1);
    assert!(repo.delete(owner.id, note.id).await.unwrap());
}
