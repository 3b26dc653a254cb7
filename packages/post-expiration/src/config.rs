use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::domains::expiration::DEFAULT_PAGE_SIZE;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Secret used to sign form nonces
    pub nonce_secret: String,
    /// Post types that support expiration
    pub expiration_post_types: Vec<String>,
    /// Maximum posts expired per post type per sweep
    pub expiration_page_size: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let expiration_page_size = env::var("EXPIRATION_PAGE_SIZE")
            .unwrap_or_else(|_| DEFAULT_PAGE_SIZE.to_string())
            .parse()
            .context("EXPIRATION_PAGE_SIZE must be a valid number")?;
        if expiration_page_size <= 0 {
            bail!("EXPIRATION_PAGE_SIZE must be greater than zero");
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            nonce_secret: env::var("NONCE_SECRET").context("NONCE_SECRET must be set")?,
            expiration_post_types: parse_post_types(
                &env::var("EXPIRATION_POST_TYPES").unwrap_or_else(|_| "post".to_string()),
            ),
            expiration_page_size,
        })
    }
}

/// Split a comma separated list of post types, dropping blanks and duplicates.
pub fn parse_post_types(raw: &str) -> Vec<String> {
    let mut types: Vec<String> = Vec::new();
    for post_type in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !types.iter().any(|t| t == post_type) {
            types.push(post_type.to_string());
        }
    }
    types
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_post_types_trims_and_dedupes() {
        assert_eq!(
            parse_post_types(" post, event ,,post"),
            vec!["post".to_string(), "event".to_string()]
        );
    }

    #[test]
    fn parse_post_types_empty_input() {
        assert!(parse_post_types("  , ").is_empty());
    }
}
