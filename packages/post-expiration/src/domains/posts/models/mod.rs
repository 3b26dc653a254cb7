pub mod post;
pub mod post_meta;

pub use post::*;
pub use post_meta::*;
