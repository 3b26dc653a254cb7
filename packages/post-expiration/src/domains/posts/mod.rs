pub mod models;
pub mod post_types;

// Re-export models (domain models)
pub use models::post::{Post, TRASH_STATUS};
pub use models::post_meta::PostMeta;
pub use post_types::PostTypeRegistry;
