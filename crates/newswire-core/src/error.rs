use thiserror::Error;

use crate::news_source::SourceError;
use crate::BackendId;

/// Validation errors for domain input exposed by `newswire-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid service mode '{value}', expected one of wordpress, supabase, auto")]
    InvalidServiceMode { value: String },

    #[error("timestamp is not a valid RFC3339 or ISO-8601 date-time: '{value}'")]
    InvalidTimestamp { value: String },

    #[error("comment post id must be greater than zero")]
    InvalidPostId,
    #[error("comment author name cannot be empty")]
    EmptyCommentAuthor,
    #[error("comment content cannot be empty")]
    EmptyCommentContent,
    #[error("comment email address is invalid: '{value}'")]
    InvalidEmail { value: String },
}

/// Invalid configuration values read from the environment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be an unsigned integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be a boolean (true/false/1/0), got '{value}'")]
    InvalidBool { key: &'static str, value: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Final error surfaced by the service manager.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Neither backend is configured. Never retried.
    #[error("no news service available: neither wordpress nor supabase is configured")]
    NoServiceAvailable,

    /// The adapter error that ended the call, unchanged.
    #[error("{backend} backend failed: {error}")]
    Source {
        backend: BackendId,
        #[source]
        error: SourceError,
    },
}

impl ServiceError {
    pub fn source_error(&self) -> Option<&SourceError> {
        match self {
            Self::NoServiceAvailable => None,
            Self::Source { error, .. } => Some(error),
        }
    }

    pub fn backend(&self) -> Option<BackendId> {
        match self {
            Self::NoServiceAvailable => None,
            Self::Source { backend, .. } => Some(*backend),
        }
    }
}
