mod common;

use common::*;
use rainbow_posts::error::AppError;

#[tokio::test]
async fn test_follow_twice_creates_one_edge() {
    let state = test_state().await;
    let leo = user(&state, "leo").await;
    let bob = user(&state, "bob").await;

    let before = state.follow_service.follower_count(&bob.id).await.unwrap();
    assert!(state.follow_service.follow(&leo.id, &bob.id).await.unwrap());
    assert!(!state.follow_service.follow(&leo.id, &bob.id).await.unwrap());

    assert_eq!(state.follow_service.follower_count(&bob.id).await.unwrap(), before + 1);
    assert_eq!(state.follow_service.following_count(&leo.id).await.unwrap(), 1);
    assert_eq!(state.follow_service.following_ids(&leo.id).await.unwrap(), vec![bob.id.clone()]);
    assert_eq!(state.follow_service.follower_ids(&bob.id).await.unwrap(), vec![leo.id.clone()]);
}

#[tokio::test]
async fn test_unfollow_after_follow_removes_edge() {
    let state = test_state().await;
    let leo = user(&state, "leo").await;
    let bob = user(&state, "bob").await;

    assert!(!state.follow_service.is_following(&leo.id, &bob.id).await.unwrap());
    state.follow_service.follow(&leo.id, &bob.id).await.unwrap();
    assert!(state.follow_service.is_following(&leo.id, &bob.id).await.unwrap());
    // 方向性
    assert!(!state.follow_service.is_following(&bob.id, &leo.id).await.unwrap());

    state.follow_service.unfollow(&leo.id, &bob.id).await.unwrap();
    assert!(!state.follow_service.is_following(&leo.id, &bob.id).await.unwrap());
    assert_eq!(state.follow_service.follower_count(&bob.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_unfollow_without_edge_is_not_found() {
    let state = test_state().await;
    let leo = user(&state, "leo").await;
    let bob = user(&state, "bob").await;

    assert!(matches!(
        state.follow_service.unfollow(&leo.id, &bob.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_self_follow_is_rejected() {
    let state = test_state().await;
    let leo = user(&state, "leo").await;

    assert!(matches!(
        state.follow_service.follow(&leo.id, &leo.id).await,
        Err(AppError::Validation(_))
    ));
    assert_eq!(state.follow_service.follower_count(&leo.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_follow_unknown_user_is_not_found() {
    let state = test_state().await;
    let leo = user(&state, "leo").await;

    assert!(matches!(
        state.follow_service.follow(&leo.id, "missing").await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_concurrent_follows_create_one_edge() {
    let state = test_state().await;
    let leo = user(&state, "leo").await;
    let bob = user(&state, "bob").await;

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let follows = state.follow_service.clone();
            let (follower, followed) = (leo.id.clone(), bob.id.clone());
            tokio::spawn(async move { follows.follow(&follower, &followed).await })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        if let Ok(true) = handle.await.unwrap() {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(state.follow_service.follower_count(&bob.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_stats_for_viewer() {
    let state = test_state().await;
    let leo = user(&state, "leo").await;
    let bob = user(&state, "bob").await;
    let carl = user(&state, "carl").await;

    state.follow_service.follow(&leo.id, &bob.id).await.unwrap();
    state.follow_service.follow(&carl.id, &bob.id).await.unwrap();
    state.follow_service.follow(&bob.id, &carl.id).await.unwrap();

    let for_leo = state.follow_service.stats(&bob.id, Some(&leo.id)).await.unwrap();
    assert_eq!(for_leo.followers_count, 2);
    assert_eq!(for_leo.following_count, 1);
    assert!(for_leo.is_following);

    let anonymous = state.follow_service.stats(&bob.id, None).await.unwrap();
    assert!(!anonymous.is_following);

    let own = state.follow_service.stats(&bob.id, Some(&bob.id)).await.unwrap();
    assert!(!own.is_following);
}
