//! Test fixtures for creating test data.
//!
//! Postgres fixtures use the model methods directly; in-memory fixtures go
//! through the repository handle kept by `TestDependencies`.

use anyhow::Result;
use chrono::Utc;
use post_expiration::common::PostId;
use post_expiration::domains::expiration::ExpirationStore;
use post_expiration::domains::posts::Post;
use post_expiration::kernel::InMemoryContentRepository;
use sqlx::PgPool;

pub const HOUR: i64 = 60 * 60;

/// Current Unix time in seconds
pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Create a published post in Postgres
pub async fn create_published_post(pool: &PgPool, post_type: &str, title: &str) -> Result<PostId> {
    let post = Post::create(post_type, "publish", title, pool).await?;
    Ok(post.id)
}

/// Create a published in-memory post that expires at `expires_at`
pub async fn expiring_post(
    repository: &InMemoryContentRepository,
    store: &ExpirationStore,
    post_type: &str,
    expires_at: i64,
) -> PostId {
    let id = repository.insert_post(post_type, "publish");
    store
        .set(id, expires_at)
        .await
        .expect("in-memory meta write cannot fail");
    id
}
