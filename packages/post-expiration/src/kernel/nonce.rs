//! Form nonces.
//!
//! A nonce is `HMAC-SHA256(secret, window | action | post_id)` in hex, where
//! `window` is the current 12 hour slot. Tokens from the current and the
//! previous slot are accepted, so a token lives between 12 and 24 hours.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::common::PostId;
use crate::kernel::BaseNonceVerifier;

type HmacSha256 = Hmac<Sha256>;

/// Length of one nonce window in seconds.
pub const NONCE_WINDOW_SECS: i64 = 12 * 60 * 60;

pub struct HashNonceVerifier {
    secret: String,
}

impl HashNonceVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn window(now: i64) -> i64 {
        now.div_euclid(NONCE_WINDOW_SECS)
    }

    fn mac_for_window(&self, window: i64, action: &str, post_id: PostId) -> Option<HmacSha256> {
        let mut mac = match HmacSha256::new_from_slice(self.secret.as_bytes()) {
            Ok(mac) => mac,
            Err(e) => {
                tracing::error!(error = %e, "Invalid nonce secret");
                return None;
            }
        };
        mac.update(window.to_string().as_bytes());
        mac.update(b"|");
        mac.update(action.as_bytes());
        mac.update(b"|");
        mac.update(post_id.to_string().as_bytes());
        Some(mac)
    }

    /// Issue a token as of `now` (Unix seconds)
    pub fn create_at(&self, action: &str, post_id: PostId, now: i64) -> String {
        self.mac_for_window(Self::window(now), action, post_id)
            .map(|mac| hex::encode(mac.finalize().into_bytes()))
            .unwrap_or_default()
    }

    /// Verify a token as of `now` (Unix seconds)
    pub fn verify_at(&self, token: &str, action: &str, post_id: PostId, now: i64) -> bool {
        let Ok(signature) = hex::decode(token) else {
            return false;
        };
        let window = Self::window(now);
        [window, window - 1].iter().any(|w| {
            self.mac_for_window(*w, action, post_id)
                .is_some_and(|mac| mac.verify_slice(&signature).is_ok())
        })
    }
}

impl BaseNonceVerifier for HashNonceVerifier {
    fn create(&self, action: &str, post_id: PostId) -> String {
        self.create_at(action, post_id, Utc::now().timestamp())
    }

    fn verify(&self, token: &str, action: &str, post_id: PostId) -> bool {
        self.verify_at(token, action, post_id, Utc::now().timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn token_verifies_for_same_action_and_post() {
        let nonces = HashNonceVerifier::new("secret");
        let post_id = PostId::new();
        let token = nonces.create_at("set_post_expiration", post_id, NOW);

        assert!(nonces.verify_at(&token, "set_post_expiration", post_id, NOW));
    }

    #[test]
    fn token_is_bound_to_action_post_and_secret() {
        let nonces = HashNonceVerifier::new("secret");
        let post_id = PostId::new();
        let token = nonces.create_at("set_post_expiration", post_id, NOW);

        assert!(!nonces.verify_at(&token, "other_action", post_id, NOW));
        assert!(!nonces.verify_at(&token, "set_post_expiration", PostId::new(), NOW));
        assert!(!HashNonceVerifier::new("other").verify_at(
            &token,
            "set_post_expiration",
            post_id,
            NOW
        ));
    }

    #[test]
    fn token_survives_one_window_then_expires() {
        let nonces = HashNonceVerifier::new("secret");
        let post_id = PostId::new();
        let token = nonces.create_at("set_post_expiration", post_id, NOW);

        assert!(nonces.verify_at(&token, "set_post_expiration", post_id, NOW + NONCE_WINDOW_SECS));
        assert!(!nonces.verify_at(
            &token,
            "set_post_expiration",
            post_id,
            NOW + 2 * NONCE_WINDOW_SECS
        ));
    }

    #[test]
    fn empty_token_is_rejected() {
        let nonces = HashNonceVerifier::new("secret");
        assert!(!nonces.verify_at("", "set_post_expiration", PostId::new(), NOW));
    }

    #[test]
    fn token_is_an_hmac_sha256_tag() {
        let nonces = HashNonceVerifier::new("secret");
        let post_id = PostId::new();
        let token = nonces.create_at("set_post_expiration", post_id, NOW);

        let mut mac = HmacSha256::new_from_slice(b"secret").unwrap();
        let message = format!("{}|set_post_expiration|{}", NOW / NONCE_WINDOW_SECS, post_id);
        mac.update(message.as_bytes());
        assert_eq!(token, hex::encode(mac.finalize().into_bytes()));
    }

    #[test]
    fn truncated_or_non_hex_token_is_rejected() {
        let nonces = HashNonceVerifier::new("secret");
        let post_id = PostId::new();
        let token = nonces.create_at("set_post_expiration", post_id, NOW);

        assert!(!nonces.verify_at(&token[..32], "set_post_expiration", post_id, NOW));
        let non_hex = format!("{}zz", &token[..62]);
        assert!(!nonces.verify_at(&non_hex, "set_post_expiration", post_id, NOW));
    }
}
