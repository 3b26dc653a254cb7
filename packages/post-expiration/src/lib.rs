// Post Expiration - Core
//
// Editors attach an expiration timestamp to a post; an hourly background
// sweep moves expired posts to the trash.
// Architecture follows the domain layout: domains/* hold the business logic,
// kernel/* the infrastructure it runs on.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
