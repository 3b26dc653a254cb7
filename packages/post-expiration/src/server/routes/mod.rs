// HTTP routes
pub mod expiration;
pub mod health;

pub use expiration::*;
pub use health::*;
