//! Expired post lookup.
//!
//! Each post type is queried on its own. A failing type is reported in the
//! batch and the remaining types are still queried. Matches come back ordered
//! by expiration then id, so a page can be resumed from its last match.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error};

use super::errors::ExpirationError;
use super::store::EXPIRATION_META_KEY;
use crate::common::PostId;
use crate::kernel::{BaseContentRepository, MetaMatch};

/// Posts expired per post type per sweep unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// Result of one lookup across several post types
#[derive(Debug, Default)]
pub struct ExpiredBatch {
    /// (post type, expired posts) for every type whose query succeeded
    pub matches: Vec<(String, Vec<MetaMatch>)>,
    /// One `QueryFailure` per type whose query failed
    pub failures: Vec<ExpirationError>,
}

impl ExpiredBatch {
    pub fn ids(&self) -> impl Iterator<Item = PostId> + '_ {
        self.matches
            .iter()
            .flat_map(|(_, matches)| matches.iter().map(|m| m.id))
    }

    pub fn len(&self) -> usize {
        self.matches.iter().map(|(_, matches)| matches.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone)]
pub struct ExpirationQuery {
    repository: Arc<dyn BaseContentRepository>,
}

impl ExpirationQuery {
    pub fn new(repository: Arc<dyn BaseContentRepository>) -> Self {
        Self { repository }
    }

    /// IDs of posts whose expiration is at or before `now`, at most
    /// `page_size` per post type. Posts without an expiration never match.
    ///
    /// Always hits the repository; the result set changes every second so it
    /// must not be cached.
    pub async fn find_expired(
        &self,
        now: i64,
        eligible_types: &[String],
        page_size: i64,
    ) -> ExpiredBatch {
        self.find_expired_from(now, eligible_types, page_size, &HashMap::new())
            .await
    }

    /// Like [`find_expired`](Self::find_expired), but each post type listed in
    /// `cursors` resumes strictly after its cursor instead of from the start.
    pub async fn find_expired_from(
        &self,
        now: i64,
        eligible_types: &[String],
        page_size: i64,
        cursors: &HashMap<String, MetaMatch>,
    ) -> ExpiredBatch {
        let mut batch = ExpiredBatch::default();

        for post_type in eligible_types {
            let after = cursors.get(post_type).copied();
            match self
                .repository
                .find_with_meta_at_most(post_type, EXPIRATION_META_KEY, now, after, page_size)
                .await
            {
                Ok(matches) => {
                    debug!(
                        post_type = %post_type,
                        count = matches.len(),
                        resumed = after.is_some(),
                        "Found expired posts"
                    );
                    batch.matches.push((post_type.clone(), matches));
                }
                Err(e) => {
                    error!(post_type = %post_type, error = %e, "Expired post query failed");
                    batch.failures.push(ExpirationError::QueryFailure {
                        post_type: post_type.clone(),
                        source: e,
                    });
                }
            }
        }

        batch
    }
}
