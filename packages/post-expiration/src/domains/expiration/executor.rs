//! Transition executor.
//!
//! Moves expired posts into their expired status (the trash unless a
//! [`StatusPolicy`] says otherwise). A sweep handles at most one page per
//! post type; a larger backlog drains over successive ticks.
//!
//! ```text
//! sweep(now)
//!     │
//!     ├─► PostTypeRegistry::types_supporting("expiration")
//!     ├─► ExpirationQuery::find_expired_from(now, types, page_size, cursors)
//!     ├─► for each id → expire_one(id)
//!     │       └─► StatusPolicy::expired_status("trash", id) → update_status
//!     └─► full page → cursor = last match; short page → cursor cleared
//! ```
//!
//! The cursor is what moves a backlog forward. Posts already handled stay in
//! the result set (their expiration is never cleared), so without it every
//! tick would fetch the same first page again.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use tracing::{error, info};

use super::errors::{ExpirationError, ExpirationResult};
use super::query::{ExpirationQuery, ExpiredBatch, DEFAULT_PAGE_SIZE};
use crate::common::PostId;
use crate::domains::posts::{PostTypeRegistry, TRASH_STATUS};
use crate::kernel::{BaseContentRepository, MetaMatch};

/// Post type feature that opts a type into expiration.
pub const EXPIRATION_FEATURE: &str = "expiration";

// =============================================================================
// Status policy
// =============================================================================

/// Chooses the status an expired post moves to.
///
/// Called with the default status and the post id; returns the status to apply.
pub trait StatusPolicy: Send + Sync {
    fn expired_status(&self, default: &str, post_id: PostId) -> String;
}

/// Default policy: keep the default (the trash).
#[derive(Debug, Clone, Copy, Default)]
pub struct TrashPolicy;

impl StatusPolicy for TrashPolicy {
    fn expired_status(&self, default: &str, _post_id: PostId) -> String {
        default.to_string()
    }
}

impl<F> StatusPolicy for F
where
    F: Fn(&str, PostId) -> String + Send + Sync,
{
    fn expired_status(&self, default: &str, post_id: PostId) -> String {
        self(default, post_id)
    }
}

// =============================================================================
// Results
// =============================================================================

/// Outcome of expiring a single post
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Transitioned { from: String, to: String },
    /// Already in the target status; nothing was written
    Unchanged { status: String },
}

/// Summary of one sweep
#[derive(Debug, Default)]
pub struct SweepReport {
    pub now: i64,
    pub matched: usize,
    pub transitioned: usize,
    pub unchanged: usize,
    pub failures: Vec<ExpirationError>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// =============================================================================
// Executor
// =============================================================================

pub struct TransitionExecutor {
    repository: Arc<dyn BaseContentRepository>,
    query: ExpirationQuery,
    post_types: Arc<PostTypeRegistry>,
    policy: Arc<dyn StatusPolicy>,
    page_size: i64,
    /// Last match of the previous full page, per post type
    cursors: Mutex<HashMap<String, MetaMatch>>,
}

impl TransitionExecutor {
    pub fn new(repository: Arc<dyn BaseContentRepository>, post_types: Arc<PostTypeRegistry>) -> Self {
        Self {
            query: ExpirationQuery::new(repository.clone()),
            repository,
            post_types,
            policy: Arc::new(TrashPolicy),
            page_size: DEFAULT_PAGE_SIZE,
            cursors: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn StatusPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Values below 1 are clamped to 1.
    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// Move one post to its expired status.
    ///
    /// A post already in that status is left alone, so expiring the same post
    /// twice is harmless.
    pub async fn expire_one(&self, post_id: PostId) -> ExpirationResult<Transition> {
        let post = self
            .repository
            .find_post(post_id)
            .await
            .map_err(|e| ExpirationError::TransitionFailure { post_id, source: e })?
            .ok_or_else(|| ExpirationError::TransitionFailure {
                post_id,
                source: anyhow!("post not found"),
            })?;

        let target = self.policy.expired_status(TRASH_STATUS, post_id);
        if post.status == target {
            return Ok(Transition::Unchanged { status: target });
        }

        self.repository
            .update_status(post_id, &target)
            .await
            .map_err(|e| ExpirationError::TransitionFailure { post_id, source: e })?;

        info!(
            %post_id,
            post_type = %post.post_type,
            from = %post.status,
            to = %target,
            "Expired post"
        );

        Ok(Transition::Transitioned {
            from: post.status,
            to: target,
        })
    }

    /// Expire up to one page of posts per eligible post type.
    ///
    /// Each post type resumes after the last page the previous sweep fetched,
    /// and starts over once a page comes back short. Query and transition
    /// failures are logged and collected in the report; they never stop the
    /// rest of the sweep.
    pub async fn sweep(&self, now: i64) -> SweepReport {
        let eligible_types = self.post_types.types_supporting(EXPIRATION_FEATURE);
        let cursors = self
            .cursors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let batch = self
            .query
            .find_expired_from(now, &eligible_types, self.page_size, &cursors)
            .await;
        self.advance_cursors(&batch);

        let mut report = SweepReport {
            now,
            matched: batch.len(),
            ..Default::default()
        };

        for post_id in batch.ids() {
            match self.expire_one(post_id).await {
                Ok(Transition::Transitioned { .. }) => report.transitioned += 1,
                Ok(Transition::Unchanged { .. }) => report.unchanged += 1,
                Err(e) => {
                    error!(%post_id, error = %e, "Failed to expire post");
                    report.failures.push(e);
                }
            }
        }

        report.failures.extend(batch.failures);
        report
    }

    /// Types whose query failed keep their cursor.
    fn advance_cursors(&self, batch: &ExpiredBatch) {
        let mut cursors = self.cursors.lock().unwrap_or_else(|e| e.into_inner());
        for (post_type, matches) in &batch.matches {
            let full_page = i64::try_from(matches.len()).unwrap_or(i64::MAX) >= self.page_size;
            match matches.last() {
                Some(last) if full_page => {
                    cursors.insert(post_type.clone(), *last);
                }
                _ => {
                    cursors.remove(post_type);
                }
            }
        }
    }
}
