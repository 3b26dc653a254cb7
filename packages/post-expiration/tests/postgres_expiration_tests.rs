//! End-to-end expiration against a real Postgres.
//!
//! Run with: cargo test --test postgres_expiration_tests -- --ignored

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use common::*;
use post_expiration::common::PostId;
use post_expiration::domains::expiration::{ExpirationQuery, EXPIRATION_META_KEY};
use post_expiration::domains::posts::{Post, PostMeta};
use test_context::test_context;

async fn status_of(ctx: &TestHarness, id: PostId) -> String {
    Post::find_by_id(id, &ctx.db_pool)
        .await
        .unwrap()
        .expect("post exists")
        .status
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn store_round_trips_through_post_meta(ctx: &mut TestHarness) {
    let deps = ctx.server_deps(100);
    let store = deps.expiration_store();
    let id = create_published_post(&ctx.db_pool, &ctx.post_type, "Round trip")
        .await
        .unwrap();

    assert_eq!(store.get(id).await.unwrap(), None);

    store.set(id, -1_700_000_000).await.unwrap();
    assert_eq!(store.get(id).await.unwrap(), Some(1_700_000_000));
    assert_eq!(
        PostMeta::find_value(id, EXPIRATION_META_KEY, &ctx.db_pool)
            .await
            .unwrap()
            .as_deref(),
        Some("1700000000")
    );

    store.set(id, 42).await.unwrap();
    assert_eq!(store.get(id).await.unwrap(), Some(42));

    store.remove(id).await.unwrap();
    assert_eq!(store.get(id).await.unwrap(), None);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn sweep_trashes_expired_posts_only(ctx: &mut TestHarness) {
    let deps = ctx.server_deps(100);
    let store = deps.expiration_store();
    let now = now();

    let expired = create_published_post(&ctx.db_pool, &ctx.post_type, "Expired")
        .await
        .unwrap();
    let future = create_published_post(&ctx.db_pool, &ctx.post_type, "Future")
        .await
        .unwrap();
    let never = create_published_post(&ctx.db_pool, &ctx.post_type, "Never")
        .await
        .unwrap();
    store.set(expired, now - HOUR).await.unwrap();
    store.set(future, now + HOUR).await.unwrap();

    let report = deps.executor().sweep(now).await;

    assert!(report.is_clean());
    assert_eq!(report.transitioned, 1);
    assert_eq!(status_of(ctx, expired).await, "trash");
    assert_eq!(status_of(ctx, future).await, "publish");
    assert_eq!(status_of(ctx, never).await, "publish");
    assert_eq!(store.get(expired).await.unwrap(), Some(now - HOUR));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn malformed_meta_is_never_matched(ctx: &mut TestHarness) {
    let deps = ctx.server_deps(100);
    let now = now();

    let mut ids = Vec::new();
    for value in ["", "soon", "12abc", "1.5", "-100", "99999999999999999999"] {
        let id = create_published_post(&ctx.db_pool, &ctx.post_type, value)
            .await
            .unwrap();
        PostMeta::upsert(id, EXPIRATION_META_KEY, value, &ctx.db_pool)
            .await
            .unwrap();
        ids.push(id);
    }

    let batch = ExpirationQuery::new(deps.repository.clone())
        .find_expired(now, &[ctx.post_type.clone()], 100)
        .await;

    assert!(batch.is_empty());
    assert!(batch.failures.is_empty());
    for id in ids {
        assert_eq!(status_of(ctx, id).await, "publish");
    }
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn backlog_drains_one_page_per_sweep(ctx: &mut TestHarness) {
    let deps = ctx.server_deps(100);
    let store = deps.expiration_store();
    let executor = deps.executor();
    let now = now();

    for i in 0..150 {
        let id = create_published_post(&ctx.db_pool, &ctx.post_type, "Backlog")
            .await
            .unwrap();
        store.set(id, now - HOUR - i).await.unwrap();
    }

    let first = executor.sweep(now).await;
    let second = executor.sweep(now).await;
    let third = executor.sweep(now).await;

    assert_eq!(first.transitioned, 100);
    assert_eq!(second.matched, 50);
    assert_eq!(second.transitioned, 50);
    assert_eq!(third.transitioned, 0);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn archive_policy_backlog_drains(ctx: &mut TestHarness) {
    let deps = ctx.server_deps(100);
    let store = deps.expiration_store();
    let policy = |_default: &str, _post_id: PostId| "archive".to_string();
    let executor = deps.executor().with_policy(Arc::new(policy));
    let now = now();

    let mut ids = Vec::new();
    for i in 0..150 {
        let id = create_published_post(&ctx.db_pool, &ctx.post_type, "Backlog")
            .await
            .unwrap();
        store.set(id, now - HOUR - i).await.unwrap();
        ids.push(id);
    }

    executor.sweep(now).await;
    executor.sweep(now).await;

    for id in ids {
        assert_eq!(status_of(ctx, id).await, "archive");
    }
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn query_resumes_after_cursor(ctx: &mut TestHarness) {
    let deps = ctx.server_deps(100);
    let store = deps.expiration_store();
    let now = now();

    let oldest = create_published_post(&ctx.db_pool, &ctx.post_type, "Oldest")
        .await
        .unwrap();
    let newest = create_published_post(&ctx.db_pool, &ctx.post_type, "Newest")
        .await
        .unwrap();
    store.set(oldest, now - 2 * HOUR).await.unwrap();
    store.set(newest, now - HOUR).await.unwrap();
    Post::update_status(oldest, "trash", &ctx.db_pool)
        .await
        .unwrap();

    let query = ExpirationQuery::new(deps.repository.clone());
    let types = [ctx.post_type.clone()];

    let first = query.find_expired(now, &types, 1).await;
    assert_eq!(first.ids().collect::<Vec<_>>(), vec![oldest]);

    let cursor = first.matches[0].1[0];
    assert_eq!(cursor.value, now - 2 * HOUR);

    let cursors = HashMap::from([(ctx.post_type.clone(), cursor)]);
    let second = query.find_expired_from(now, &types, 1, &cursors).await;
    assert_eq!(second.ids().collect::<Vec<_>>(), vec![newest]);
}
