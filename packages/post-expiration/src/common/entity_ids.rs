//! Typed ID definitions for domain entities.

pub use super::id::Id;

/// Marker type for Post entities (any content item, whatever its post type).
pub struct Post;

/// Typed ID for Post entities.
pub type PostId = Id<Post>;
