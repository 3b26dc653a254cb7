// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - they model the host content repository.
// Expiration logic lives in domains/expiration and only talks to these traits.
//
// Naming convention: Base* for trait names (e.g., BaseContentRepository)

use anyhow::Result;
use async_trait::async_trait;

use crate::common::PostId;

// =============================================================================
// Content Repository Trait (Infrastructure)
// =============================================================================

/// The parts of a post the expiration sweep needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSummary {
    pub id: PostId,
    pub post_type: String,
    pub status: String,
}

/// A post matched by a numeric meta query, with the value it matched on.
///
/// Ordered by value, then id; also used as the resume point for the next page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetaMatch {
    pub value: i64,
    pub id: PostId,
}

#[async_trait]
pub trait BaseContentRepository: Send + Sync {
    /// Look up a post's type and status
    async fn find_post(&self, id: PostId) -> Result<Option<PostSummary>>;

    /// Posts in any status whose meta value is present and numerically <= `max`,
    /// ordered by (value, id), starting strictly after `after` when given.
    /// Returns at most `limit` matches. Must read live data (no result caching).
    async fn find_with_meta_at_most(
        &self,
        post_type: &str,
        meta_key: &str,
        max: i64,
        after: Option<MetaMatch>,
        limit: i64,
    ) -> Result<Vec<MetaMatch>>;

    /// Set a post's lifecycle status
    async fn update_status(&self, id: PostId, status: &str) -> Result<()>;

    /// Cheap connectivity check for the health endpoint
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// Post Meta Trait (Infrastructure - generic key/value attributes)
// =============================================================================

#[async_trait]
pub trait BasePostMeta: Send + Sync {
    async fn get_meta(&self, id: PostId, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite (last write wins)
    async fn set_meta(&self, id: PostId, key: &str, value: &str) -> Result<()>;

    async fn delete_meta(&self, id: PostId, key: &str) -> Result<()>;
}

// =============================================================================
// Nonce Trait (Infrastructure - form submission tokens)
// =============================================================================

pub trait BaseNonceVerifier: Send + Sync {
    /// Issue a token for `action` on one post
    fn create(&self, action: &str, post_id: PostId) -> String;

    /// Check a submitted token
    fn verify(&self, token: &str, action: &str, post_id: PostId) -> bool;
}
