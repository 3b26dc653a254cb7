use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::PostId;

/// PostMeta - one key/value attribute attached to a post
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostMeta {
    pub post_id: PostId,
    pub meta_key: String,
    pub meta_value: String,
}

impl PostMeta {
    /// Read a single attribute value
    pub async fn find_value(post_id: PostId, meta_key: &str, pool: &PgPool) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT meta_value FROM post_meta WHERE post_id = $1 AND meta_key = $2",
        )
        .bind(post_id)
        .bind(meta_key)
        .fetch_optional(pool)
        .await?;
        Ok(value)
    }

    /// Insert or overwrite an attribute (last write wins)
    pub async fn upsert(post_id: PostId, meta_key: &str, meta_value: &str, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO post_meta (post_id, meta_key, meta_value)
            VALUES ($1, $2, $3)
            ON CONFLICT (post_id, meta_key)
            DO UPDATE SET meta_value = EXCLUDED.meta_value
            "#,
        )
        .bind(post_id)
        .bind(meta_key)
        .bind(meta_value)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Delete an attribute. Returns the number of rows removed.
    pub async fn delete(post_id: PostId, meta_key: &str, pool: &PgPool) -> Result<u64> {
        let result = sqlx::query("DELETE FROM post_meta WHERE post_id = $1 AND meta_key = $2")
            .bind(post_id)
            .bind(meta_key)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
