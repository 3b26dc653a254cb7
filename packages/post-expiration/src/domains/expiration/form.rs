//! Form binding for the expiration field.
//!
//! Save-hook glue between the editor form and the [`ExpirationStore`]. The
//! form posts two fields: `_post_expiration` (a Unix timestamp, or empty to
//! clear) and `post_expiration_nonce`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::errors::{ExpirationError, ExpirationResult};
use super::executor::EXPIRATION_FEATURE;
use super::store::{coerce_timestamp, ExpirationStore};
use crate::common::PostId;
use crate::domains::posts::PostTypeRegistry;
use crate::kernel::{BaseContentRepository, BaseNonceVerifier, PostSummary};

/// Nonce action for expiration saves.
pub const NONCE_ACTION: &str = "set_post_expiration";

/// Submitted form fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpirationForm {
    #[serde(rename = "_post_expiration", default)]
    pub post_expiration: Option<String>,
    #[serde(rename = "post_expiration_nonce", default)]
    pub nonce: Option<String>,
}

/// What a save did to the stored expiration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Set(i64),
    Removed,
}

impl SaveOutcome {
    pub fn expires_at(&self) -> Option<i64> {
        match self {
            SaveOutcome::Set(timestamp) => Some(*timestamp),
            SaveOutcome::Removed => None,
        }
    }
}

/// Current field state for rendering the editor form
#[derive(Debug, Clone, Serialize)]
pub struct ExpirationField {
    pub post_id: PostId,
    pub expires_at: Option<i64>,
    pub nonce: String,
}

#[derive(Clone)]
pub struct ExpirationFormBinding {
    store: ExpirationStore,
    repository: Arc<dyn BaseContentRepository>,
    post_types: Arc<PostTypeRegistry>,
    nonces: Arc<dyn BaseNonceVerifier>,
}

impl ExpirationFormBinding {
    pub fn new(
        store: ExpirationStore,
        repository: Arc<dyn BaseContentRepository>,
        post_types: Arc<PostTypeRegistry>,
        nonces: Arc<dyn BaseNonceVerifier>,
    ) -> Self {
        Self {
            store,
            repository,
            post_types,
            nonces,
        }
    }

    async fn eligible_post(&self, post_id: PostId) -> ExpirationResult<PostSummary> {
        let post = self
            .repository
            .find_post(post_id)
            .await?
            .ok_or(ExpirationError::PostNotFound(post_id))?;

        if !self.post_types.supports(&post.post_type, EXPIRATION_FEATURE) {
            return Err(ExpirationError::NotEligible(post.post_type));
        }
        Ok(post)
    }

    /// Field state plus a fresh nonce.
    pub async fn field(&self, post_id: PostId) -> ExpirationResult<ExpirationField> {
        self.eligible_post(post_id).await?;
        Ok(ExpirationField {
            post_id,
            expires_at: self.store.get(post_id).await?,
            nonce: self.nonces.create(NONCE_ACTION, post_id),
        })
    }

    /// Apply a submitted form.
    ///
    /// Nothing is written unless the nonce verifies. An empty value (or "0")
    /// clears the expiration; anything else is coerced to a timestamp and stored.
    pub async fn on_save(
        &self,
        post_id: PostId,
        form: &ExpirationForm,
    ) -> ExpirationResult<SaveOutcome> {
        self.eligible_post(post_id).await?;

        let verified = form
            .nonce
            .as_deref()
            .is_some_and(|token| self.nonces.verify(token, NONCE_ACTION, post_id));
        if !verified {
            warn!(%post_id, "Rejected expiration save with invalid nonce");
            return Err(ExpirationError::InvalidNonce);
        }

        let value = form.post_expiration.as_deref().unwrap_or("").trim();
        let outcome = if is_empty_value(value) {
            self.store.remove(post_id).await?;
            SaveOutcome::Removed
        } else {
            SaveOutcome::Set(self.store.set(post_id, coerce_timestamp(value)).await?)
        };

        info!(%post_id, expires_at = ?outcome.expires_at(), "Saved post expiration");
        Ok(outcome)
    }
}

fn is_empty_value(value: &str) -> bool {
    value.is_empty() || value == "0"
}
