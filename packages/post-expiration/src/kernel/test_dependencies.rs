// TestDependencies - in-memory implementations for testing
//
// Provides an in-memory content repository (with failure injection) that can
// be injected into ServerDeps for tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use super::{
    BaseContentRepository, BasePostMeta, HashNonceVerifier, MetaMatch, PostSummary, ServerDeps,
};
use crate::common::PostId;
use crate::domains::expiration::{StatusPolicy, TrashPolicy, DEFAULT_PAGE_SIZE, EXPIRATION_FEATURE};
use crate::domains::posts::PostTypeRegistry;

/// Secret used by the test nonce verifier
pub const TEST_NONCE_SECRET: &str = "test-nonce-secret";

// =============================================================================
// In-memory Content Repository
// =============================================================================

#[derive(Default)]
pub struct InMemoryContentRepository {
    posts: Mutex<HashMap<PostId, PostSummary>>,
    meta: Mutex<HashMap<(PostId, String), String>>,
    failing_types: Mutex<HashSet<String>>,
    failing_updates: Mutex<HashSet<PostId>>,
    query_calls: Mutex<Vec<String>>,
    status_updates: Mutex<Vec<(PostId, String)>>,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a post and return its id
    pub fn insert_post(&self, post_type: &str, status: &str) -> PostId {
        let id = PostId::new();
        self.posts.lock().unwrap_or_else(|e| e.into_inner()).insert(
            id,
            PostSummary {
                id,
                post_type: post_type.to_string(),
                status: status.to_string(),
            },
        );
        id
    }

    /// Overwrite a post's status without recording an update
    pub fn set_status(&self, id: PostId, status: &str) {
        if let Some(post) = self
            .posts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(&id)
        {
            post.status = status.to_string();
        }
    }

    pub fn status_of(&self, id: PostId) -> Option<String> {
        self.posts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .map(|p| p.status.clone())
    }

    /// Raw meta value, bypassing any typed view
    pub fn raw_meta(&self, id: PostId, key: &str) -> Option<String> {
        self.meta
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(id, key.to_string()))
            .cloned()
    }

    /// Make every query for `post_type` fail
    pub fn fail_queries_for(&self, post_type: &str) {
        self.failing_types
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(post_type.to_string());
    }

    /// Make every status update for `id` fail
    pub fn fail_updates_for(&self, id: PostId) {
        self.failing_updates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id);
    }

    /// Drop all injected failures
    pub fn clear_failures(&self) {
        self.failing_types
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.failing_updates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Post types queried so far, in call order
    pub fn query_calls(&self) -> Vec<String> {
        self.query_calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Status writes issued so far, in call order
    pub fn status_updates(&self) -> Vec<(PostId, String)> {
        self.status_updates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

fn numeric_meta(value: &str) -> Option<i64> {
    let is_plain = !value.is_empty() && value.len() <= 18 && value.bytes().all(|b| b.is_ascii_digit());
    if is_plain {
        value.parse().ok()
    } else {
        None
    }
}

#[async_trait]
impl BaseContentRepository for InMemoryContentRepository {
    async fn find_post(&self, id: PostId) -> Result<Option<PostSummary>> {
        Ok(self
            .posts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned())
    }

    async fn find_with_meta_at_most(
        &self,
        post_type: &str,
        meta_key: &str,
        max: i64,
        after: Option<MetaMatch>,
        limit: i64,
    ) -> Result<Vec<MetaMatch>> {
        self.query_calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(post_type.to_string());

        if self
            .failing_types
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(post_type)
        {
            return Err(anyhow!("repository unavailable for post type '{}'", post_type));
        }

        let posts = self.posts.lock().unwrap_or_else(|e| e.into_inner());
        let meta = self.meta.lock().unwrap_or_else(|e| e.into_inner());

        let mut matches: Vec<MetaMatch> = posts
            .values()
            .filter(|p| p.post_type == post_type)
            .filter_map(|p| {
                let value = meta
                    .get(&(p.id, meta_key.to_string()))
                    .and_then(|v| numeric_meta(v))?;
                (value <= max).then_some(MetaMatch { value, id: p.id })
            })
            .filter(|m| after.map_or(true, |after| *m > after))
            .collect();
        matches.sort();
        matches.truncate(usize::try_from(limit).unwrap_or(0));

        Ok(matches)
    }

    async fn update_status(&self, id: PostId, status: &str) -> Result<()> {
        if self
            .failing_updates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&id)
        {
            return Err(anyhow!("status update rejected for post {}", id));
        }

        let mut posts = self.posts.lock().unwrap_or_else(|e| e.into_inner());
        let post = posts
            .get_mut(&id)
            .ok_or_else(|| anyhow!("Post {} not found", id))?;
        post.status = status.to_string();

        self.status_updates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, status.to_string()));
        Ok(())
    }
}

#[async_trait]
impl BasePostMeta for InMemoryContentRepository {
    async fn get_meta(&self, id: PostId, key: &str) -> Result<Option<String>> {
        Ok(self.raw_meta(id, key))
    }

    async fn set_meta(&self, id: PostId, key: &str, value: &str) -> Result<()> {
        self.meta
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((id, key.to_string()), value.to_string());
        Ok(())
    }

    async fn delete_meta(&self, id: PostId, key: &str) -> Result<()> {
        self.meta
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&(id, key.to_string()));
        Ok(())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Builder for ServerDeps backed by an in-memory repository
pub struct TestDependencies {
    pub repository: Arc<InMemoryContentRepository>,
    post_types: PostTypeRegistry,
    status_policy: Arc<dyn StatusPolicy>,
    page_size: i64,
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDependencies {
    /// "post" supports expiration, "page" does not
    pub fn new() -> Self {
        let mut post_types = PostTypeRegistry::new();
        post_types.register("post", &["title", EXPIRATION_FEATURE]);
        post_types.register("page", &["title"]);

        Self {
            repository: Arc::new(InMemoryContentRepository::new()),
            post_types,
            status_policy: Arc::new(TrashPolicy),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_expiring_type(mut self, post_type: &str) -> Self {
        self.post_types.add_support(post_type, EXPIRATION_FEATURE);
        self
    }

    pub fn with_status_policy(mut self, policy: Arc<dyn StatusPolicy>) -> Self {
        self.status_policy = policy;
        self
    }

    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn into_server_deps(self) -> ServerDeps {
        ServerDeps::new(
            self.repository.clone(),
            self.repository,
            Arc::new(self.post_types),
            Arc::new(HashNonceVerifier::new(TEST_NONCE_SECRET)),
            self.status_policy,
            self.page_size,
        )
    }
}
