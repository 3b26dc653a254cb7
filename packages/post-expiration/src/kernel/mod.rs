//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod nonce;
pub mod repository;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use nonce::HashNonceVerifier;
pub use repository::PostgresContentRepository;
pub use scheduled_tasks::{
    ExpirationScheduler, Registration, ScheduledTask, EXPIRATION_PERIOD, EXPIRATION_TASK_NAME,
};
pub use test_dependencies::{InMemoryContentRepository, TestDependencies, TEST_NONCE_SECRET};
pub use traits::*;
