use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::PostId;

/// Lifecycle status of a post that has been moved to the trash.
///
/// This is the host's name for the "trashed" state.
pub const TRASH_STATUS: &str = "trash";

/// Post - a content item owned by the host repository
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: PostId,
    pub post_type: String, // 'post', 'page', 'event', ...
    pub status: String,    // 'publish', 'draft', 'pending', 'private', 'trash', ...
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Queries
// =============================================================================

impl Post {
    /// Insert a new post
    pub async fn create(post_type: &str, status: &str, title: &str, pool: &PgPool) -> Result<Self> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, post_type, status, title)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(PostId::new())
        .bind(post_type)
        .bind(status)
        .bind(title)
        .fetch_one(pool)
        .await?;
        Ok(post)
    }

    /// Find post by ID
    pub async fn find_by_id(id: PostId, pool: &PgPool) -> Result<Option<Self>> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(post)
    }

    /// Set the lifecycle status. Returns the number of rows touched (0 if the post is gone).
    pub async fn update_status(id: PostId, status: &str, pool: &PgPool) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET status = $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Posts of one type, in any status, whose numeric meta value under
    /// `meta_key` is present and at most `max`, as `(id, value)` pairs.
    ///
    /// Values that are not plain non-negative integers never match. Rows come
    /// back ordered by value then id, starting strictly after `after`.
    pub async fn find_with_meta_at_most(
        post_type: &str,
        meta_key: &str,
        max: i64,
        after: Option<(i64, PostId)>,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<(PostId, i64)>> {
        let (after_value, after_id) = after.unzip();
        let rows = sqlx::query_as::<_, (PostId, i64)>(
            r#"
            SELECT p.id, meta.value
            FROM posts p
            JOIN LATERAL (
                SELECT CASE
                    WHEN pm.meta_value ~ '^[0-9]{1,18}$' THEN pm.meta_value::BIGINT
                END AS value
                FROM post_meta pm
                WHERE pm.post_id = p.id AND pm.meta_key = $2
            ) meta ON TRUE
            WHERE p.post_type = $1
              AND meta.value <= $3
              AND ($4::BIGINT IS NULL OR (meta.value, p.id) > ($4::BIGINT, $5::UUID))
            ORDER BY meta.value ASC, p.id ASC
            LIMIT $6
            "#,
        )
        .bind(post_type)
        .bind(meta_key)
        .bind(max)
        .bind(after_value)
        .bind(after_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}
