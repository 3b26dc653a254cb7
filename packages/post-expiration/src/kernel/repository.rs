//! Postgres adapters for the content repository traits.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use crate::common::PostId;
use crate::domains::posts::{Post, PostMeta};
use crate::kernel::{BaseContentRepository, BasePostMeta, MetaMatch, PostSummary};

/// Wrapper around a PgPool that implements the repository traits
#[derive(Clone)]
pub struct PostgresContentRepository {
    pool: PgPool,
}

impl PostgresContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BaseContentRepository for PostgresContentRepository {
    async fn find_post(&self, id: PostId) -> Result<Option<PostSummary>> {
        let post = Post::find_by_id(id, &self.pool).await?;
        Ok(post.map(|p| PostSummary {
            id: p.id,
            post_type: p.post_type,
            status: p.status,
        }))
    }

    async fn find_with_meta_at_most(
        &self,
        post_type: &str,
        meta_key: &str,
        max: i64,
        after: Option<MetaMatch>,
        limit: i64,
    ) -> Result<Vec<MetaMatch>> {
        let after = after.map(|m| (m.value, m.id));
        let rows =
            Post::find_with_meta_at_most(post_type, meta_key, max, after, limit, &self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(id, value)| MetaMatch { value, id })
            .collect())
    }

    async fn update_status(&self, id: PostId, status: &str) -> Result<()> {
        let rows = Post::update_status(id, status, &self.pool).await?;
        if rows == 0 {
            return Err(anyhow!("Post {} not found", id));
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl BasePostMeta for PostgresContentRepository {
    async fn get_meta(&self, id: PostId, key: &str) -> Result<Option<String>> {
        PostMeta::find_value(id, key, &self.pool).await
    }

    async fn set_meta(&self, id: PostId, key: &str, value: &str) -> Result<()> {
        PostMeta::upsert(id, key, value, &self.pool).await
    }

    async fn delete_meta(&self, id: PostId, key: &str) -> Result<()> {
        PostMeta::delete(id, key, &self.pool).await?;
        Ok(())
    }
}
