// Business domains
pub mod expiration;
pub mod posts;
