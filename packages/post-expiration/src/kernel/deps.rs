//! Server dependencies (using traits for testability)
//!
//! This module provides the central dependency container. The expiration
//! components are built from it; all host services sit behind traits so tests
//! can swap in the in-memory repository.

use sqlx::PgPool;
use std::sync::Arc;

use crate::config::Config;
use crate::domains::expiration::{
    ExpirationFormBinding, ExpirationStore, StatusPolicy, TransitionExecutor, TrashPolicy,
    EXPIRATION_FEATURE,
};
use crate::domains::posts::PostTypeRegistry;
use crate::kernel::{
    BaseContentRepository, BaseNonceVerifier, BasePostMeta, HashNonceVerifier,
    PostgresContentRepository,
};

/// Server dependencies accessible to the expiration components
#[derive(Clone)]
pub struct ServerDeps {
    pub repository: Arc<dyn BaseContentRepository>,
    pub post_meta: Arc<dyn BasePostMeta>,
    /// Built once at startup, read-only afterwards
    pub post_types: Arc<PostTypeRegistry>,
    pub nonces: Arc<dyn BaseNonceVerifier>,
    /// Chooses the status expired posts move to (trash by default)
    pub status_policy: Arc<dyn StatusPolicy>,
    /// Posts expired per post type per sweep
    pub page_size: i64,
}

impl ServerDeps {
    pub fn new(
        repository: Arc<dyn BaseContentRepository>,
        post_meta: Arc<dyn BasePostMeta>,
        post_types: Arc<PostTypeRegistry>,
        nonces: Arc<dyn BaseNonceVerifier>,
        status_policy: Arc<dyn StatusPolicy>,
        page_size: i64,
    ) -> Self {
        Self {
            repository,
            post_meta,
            post_types,
            nonces,
            status_policy,
            page_size,
        }
    }

    /// Production wiring: Postgres repository, post types from config
    pub fn from_config(pool: PgPool, config: &Config) -> Self {
        let repository = Arc::new(PostgresContentRepository::new(pool));

        let mut post_types = PostTypeRegistry::new();
        for post_type in &config.expiration_post_types {
            post_types.add_support(post_type, EXPIRATION_FEATURE);
        }

        Self::new(
            repository.clone(),
            repository,
            Arc::new(post_types),
            Arc::new(HashNonceVerifier::new(config.nonce_secret.clone())),
            Arc::new(TrashPolicy),
            config.expiration_page_size,
        )
    }

    pub fn expiration_store(&self) -> ExpirationStore {
        ExpirationStore::new(self.post_meta.clone())
    }

    pub fn executor(&self) -> TransitionExecutor {
        TransitionExecutor::new(self.repository.clone(), self.post_types.clone())
            .with_policy(self.status_policy.clone())
            .with_page_size(self.page_size)
    }

    pub fn form_binding(&self) -> ExpirationFormBinding {
        ExpirationFormBinding::new(
            self.expiration_store(),
            self.repository.clone(),
            self.post_types.clone(),
            self.nonces.clone(),
        )
    }
}
