mod common;

use common::*;
use rainbow_posts::{error::AppError, services::auth::User};

fn principal(profile: &rainbow_posts::models::user::UserProfile) -> User {
    User {
        id: profile.id.clone(),
        username: profile.username.clone(),
    }
}

#[tokio::test]
async fn test_home_feed_is_newest_first() {
    let state = test_state().await;
    let leo = user(&state, "leo").await;

    let t1 = post(&state, &leo, "first", None).await;
    let t2 = post(&state, &leo, "second", None).await;
    let t3 = post(&state, &leo, "third", None).await;

    let page = state.feed_service.home_feed(None).await.unwrap();
    let ids: Vec<&str> = page.items.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec![t3.id.as_str(), t2.id.as_str(), t1.id.as_str()]);
}

#[tokio::test]
async fn test_thirteen_posts_make_two_pages() {
    let state = test_state().await;
    let leo = user(&state, "leo").await;
    for i in 0..13 {
        post(&state, &leo, &format!("post {}", i), None).await;
    }

    let first = state.feed_service.home_feed(Some("1")).await.unwrap();
    assert_eq!(first.len(), 10);
    assert_eq!(first.pagination.total_pages, 2);
    assert!(first.pagination.has_next);
    assert_eq!(first.items[0].text, "post 12");

    let second = state.feed_service.home_feed(Some("2")).await.unwrap();
    assert_eq!(second.len(), 3);
    assert_eq!(second.items[2].text, "post 0");

    // 非法页码回到第一页，超出范围取最后一页
    assert_eq!(state.feed_service.home_feed(Some("abc")).await.unwrap().pagination.current_page, 1);
    assert_eq!(state.feed_service.home_feed(Some("99")).await.unwrap().pagination.current_page, 2);
}

#[tokio::test]
async fn test_group_feed_scenario() {
    let state = test_state().await;
    let leo = user(&state, "leo").await;
    let test_group = group(&state, "Test group", "test").await;
    group(&state, "Empty group", "empty").await;

    let hello = post(&state, &leo, "hello", Some(&test_group.id)).await;
    post(&state, &leo, "no group", None).await;

    let (found_group, page) = state.feed_service.group_feed("test", None).await.unwrap();
    assert_eq!(found_group.id, test_group.id);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, hello.id);

    let (_, empty) = state.feed_service.group_feed("empty", None).await.unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.pagination.current_page, 1);

    assert!(matches!(
        state.feed_service.group_feed("unknown", None).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_profile_feed_only_has_author_posts() {
    let state = test_state().await;
    let leo = user(&state, "leo").await;
    let bob = user(&state, "bob").await;

    post(&state, &leo, "by leo", None).await;
    post(&state, &bob, "by bob", None).await;

    let (author, page) = state.feed_service.profile_feed("bob", None).await.unwrap();
    assert_eq!(author.id, bob.id);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].author_id, bob.id);

    assert!(matches!(
        state.feed_service.profile_feed("nobody", None).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_follow_feed_follows_edges() {
    let state = test_state().await;
    let leo = user(&state, "leo").await;
    let bob = user(&state, "bob").await;
    let carl = user(&state, "carl").await;

    state.follow_service.follow(&leo.id, &bob.id).await.unwrap();
    let new_post = post(&state, &bob, "fresh from bob", None).await;
    post(&state, &carl, "carl writes too", None).await;

    let leo_feed = state
        .feed_service
        .follow_feed(Some(&principal(&leo)), None)
        .await
        .unwrap();
    assert_eq!(leo_feed.items.len(), 1);
    assert_eq!(leo_feed.items[0].id, new_post.id);

    // carl 没有关注 bob
    let carl_feed = state
        .feed_service
        .follow_feed(Some(&principal(&carl)), None)
        .await
        .unwrap();
    assert!(carl_feed.items.iter().all(|p| p.author_id != bob.id));
    assert!(carl_feed.is_empty());

    state.follow_service.unfollow(&leo.id, &bob.id).await.unwrap();
    let after_unfollow = state
        .feed_service
        .follow_feed(Some(&principal(&leo)), None)
        .await
        .unwrap();
    assert!(after_unfollow.is_empty());
}

#[tokio::test]
async fn test_follow_feed_requires_authentication() {
    let state = test_state().await;
    assert!(matches!(
        state.feed_service.follow_feed(None, None).await,
        Err(AppError::Authorization(_))
    ));
}
