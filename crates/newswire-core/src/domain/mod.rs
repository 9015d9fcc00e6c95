//! # Domain Models
//!
//! Normalized content shapes shared by both backends.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`FormattedArticle`] | Article as consumers render it |
//! | [`Comment`] | Reader comment attached to a post |
//! | [`CommentSubmission`] | Validated input for posting a comment |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! Adapters build these from their raw payloads; the service manager only
//! passes them through.

mod models;
mod timestamp;

pub use models::{Comment, CommentSubmission, FormattedArticle};
pub use timestamp::UtcDateTime;
