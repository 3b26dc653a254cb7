//! Expiration store.
//!
//! A typed view over the generic post meta facility exposing the one
//! attribute this domain owns: `_post_expiration`, a Unix timestamp.
//! An absent attribute means the post never expires.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::common::PostId;
use crate::kernel::BasePostMeta;

/// Meta key holding the expiration timestamp.
pub const EXPIRATION_META_KEY: &str = "_post_expiration";

#[derive(Clone)]
pub struct ExpirationStore {
    meta: Arc<dyn BasePostMeta>,
}

impl ExpirationStore {
    pub fn new(meta: Arc<dyn BasePostMeta>) -> Self {
        Self { meta }
    }

    /// Store an expiration timestamp, overwriting any previous value.
    ///
    /// Negative input is stored as its absolute value. Past timestamps are
    /// accepted and get picked up by the next sweep.
    pub async fn set(&self, post_id: PostId, timestamp: i64) -> Result<i64> {
        let expires_at = timestamp.saturating_abs();
        self.meta
            .set_meta(post_id, EXPIRATION_META_KEY, &expires_at.to_string())
            .await?;
        debug!(%post_id, expires_at, "Set post expiration");
        Ok(expires_at)
    }

    /// Clear the expiration; the post becomes non-expiring.
    pub async fn remove(&self, post_id: PostId) -> Result<()> {
        self.meta.delete_meta(post_id, EXPIRATION_META_KEY).await?;
        debug!(%post_id, "Removed post expiration");
        Ok(())
    }

    /// Stored timestamp, or `None` if unset or not a non-negative integer.
    pub async fn get(&self, post_id: PostId) -> Result<Option<i64>> {
        let value = self.meta.get_meta(post_id, EXPIRATION_META_KEY).await?;
        Ok(value.as_deref().and_then(parse_stored_timestamp))
    }
}

fn parse_stored_timestamp(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok().filter(|t| *t >= 0)
}

/// Coerce submitted form input to a non-negative integer timestamp.
///
/// Reads an optional sign and the leading run of decimal digits, ignoring
/// anything after it, and takes the absolute value: `"12.7"` is 12, `"-5"` is
/// 5, `"abc"` is 0. Overflow saturates at `i64::MAX`.
pub fn coerce_timestamp(input: &str) -> i64 {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix(&['-', '+'][..]).unwrap_or(trimmed);

    digits
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .try_fold(0i64, |acc, c| {
            acc.checked_mul(10)?.checked_add(i64::from(c as u8 - b'0'))
        })
        .unwrap_or(i64::MAX)
}
