use thiserror::Error;

use crate::common::PostId;

/// Errors raised by the expiration store, sweep and form binding.
///
/// None of these are fatal: the sweep logs query and transition failures and
/// carries on, and the expiration attribute itself is never touched by the
/// sweep, so the worst case is an expiration delayed to a later tick.
#[derive(Error, Debug)]
pub enum ExpirationError {
    #[error("Expired post query failed for post type '{post_type}': {source}")]
    QueryFailure {
        post_type: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to transition post {post_id}: {source}")]
    TransitionFailure {
        post_id: PostId,
        #[source]
        source: anyhow::Error,
    },

    #[error("Post not found: {0}")]
    PostNotFound(PostId),

    #[error("Post type '{0}' does not support expiration")]
    NotEligible(String),

    #[error("Invalid or missing form nonce")]
    InvalidNonce,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type ExpirationResult<T> = std::result::Result<T, ExpirationError>;
