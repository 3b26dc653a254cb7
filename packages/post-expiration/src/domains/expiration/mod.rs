//! Post expiration.
//!
//! Editors attach an expiration timestamp to a post; an hourly sweep moves
//! every post whose timestamp has passed into the trash.
//!
//! - [`ExpirationStore`] - get/set/remove the `_post_expiration` attribute
//! - [`ExpirationQuery`] - find expired post ids, per post type, paginated
//! - [`TransitionExecutor`] - expire one post, or sweep a page per post type
//! - [`ExpirationFormBinding`] - editor form save hook
//!
//! The sweep never touches the expiration attribute. A post restored from the
//! trash keeps its old timestamp and is expired again on the next tick unless
//! the timestamp is cleared.

pub mod errors;
pub mod executor;
pub mod form;
pub mod query;
pub mod store;

pub use errors::{ExpirationError, ExpirationResult};
pub use executor::{
    StatusPolicy, SweepReport, Transition, TransitionExecutor, TrashPolicy, EXPIRATION_FEATURE,
};
pub use form::{ExpirationField, ExpirationForm, ExpirationFormBinding, SaveOutcome, NONCE_ACTION};
pub use query::{ExpirationQuery, ExpiredBatch, DEFAULT_PAGE_SIZE};
pub use store::{coerce_timestamp, ExpirationStore, EXPIRATION_META_KEY};
