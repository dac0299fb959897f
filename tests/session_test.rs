//! Session store behaviour under concurrent handlers

use std::time::Duration;

use futures::future::join_all;
use serde_json::json;
use tubelens::session::SessionStore;

#[tokio::test]
async fn test_concurrent_writers_share_one_store() {
    let store = SessionStore::new(Duration::from_secs(60), Duration::from_secs(60));
    let session_id = store.create_session().await;

    let writers = (0..16).map(|i| {
        let store = store.clone();
        let session_id = session_id.clone();
        tokio::spawn(async move {
            store
                .store_data(&session_id, &format!("video_analysis_{i}"), json!({"index": i}))
                .await;
        })
    });
    for result in join_all(writers).await {
        result.unwrap();
    }

    let info = store.session_info(&session_id).await.unwrap();
    assert_eq!(info.data_count, 16);
    assert_eq!(
        store.get_data(&session_id, "video_analysis_7").await,
        Some(json!({"index": 7}))
    );
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let store = SessionStore::new(Duration::from_secs(60), Duration::from_secs(60));
    let a = store.create_session().await;
    let b = store.create_session().await;
    assert_ne!(a, b);

    store.store_data(&a, "trending_US_all_50", json!([1, 2])).await;

    assert!(store.get_data(&b, "trending_US_all_50").await.is_none());
    assert_eq!(store.active_count().await, 2);
}

#[tokio::test]
async fn test_short_timeout_expires_sessions() {
    let store = SessionStore::new(Duration::from_secs(1), Duration::from_secs(60));
    let id = store.create_session().await;
    store.store_data(&id, "k", json!(1)).await;

    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert!(store.get_data(&id, "k").await.is_none());
    assert_eq!(store.sweep_expired().await, 1);
    assert_eq!(store.stats().await.total_sessions, 0);
}
