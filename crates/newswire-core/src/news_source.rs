//! Backend adapter contract and its error type.
//!
//! This module defines [`NewsSource`], the operation set both content
//! backends implement, and [`SourceError`], the structured error the service
//! manager uses for failover decisions.
//!
//! # Operations
//!
//! | Operation | Arguments | Result |
//! |-----------|-----------|--------|
//! | [`LatestForSlider`](Operation::LatestForSlider) | limit | articles |
//! | [`ByCategoryId`](Operation::ByCategoryId) | category id, limit | articles |
//! | [`ByCategorySlug`](Operation::ByCategorySlug) | slug, limit | articles |
//! | [`Search`](Operation::Search) | term, limit | articles |
//! | [`PostById`](Operation::PostById) | id | optional article |
//! | [`LatestPosts`](Operation::LatestPosts) | limit | articles with content |
//! | [`CommentsByPost`](Operation::CommentsByPost) | post id | comments |
//! | [`RecentComments`](Operation::RecentComments) | limit | comments |
//! | [`SubmitComment`](Operation::SubmitComment) | submission | created comment |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{BackendId, Comment, CommentSubmission, FormattedArticle};

/// Public operation names; failover budgets are tracked per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    LatestForSlider,
    ByCategoryId,
    ByCategorySlug,
    Search,
    PostById,
    LatestPosts,
    CommentsByPost,
    RecentComments,
    SubmitComment,
}

impl Operation {
    pub const ALL: [Self; 9] = [
        Self::LatestForSlider,
        Self::ByCategoryId,
        Self::ByCategorySlug,
        Self::Search,
        Self::PostById,
        Self::LatestPosts,
        Self::CommentsByPost,
        Self::RecentComments,
        Self::SubmitComment,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LatestForSlider => "latest_news_for_slider",
            Self::ByCategoryId => "latest_news_by_category_id",
            Self::ByCategorySlug => "latest_news_by_category",
            Self::Search => "search_posts",
            Self::PostById => "post_by_id",
            Self::LatestPosts => "fetch_latest_posts",
            Self::CommentsByPost => "fetch_comments_by_post_id",
            Self::RecentComments => "fetch_recent_comments",
            Self::SubmitComment => "submit_comment",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    NotFound,
    Malformed,
    Internal,
}

/// Structured adapter error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NotFound,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Malformed,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::Malformed => "source.malformed",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Boxed future returned by every [`NewsSource`] operation.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Content backend contract.
///
/// Both the WordPress and the Supabase adapter implement this trait, so the
/// compiler keeps their operation sets identical. Implementations must be
/// `Send + Sync`; the service manager shares them behind `Arc`.
///
/// Dropping a returned future cancels the in-flight request.
pub trait NewsSource: Send + Sync {
    /// Which backend this adapter talks to.
    fn id(&self) -> BackendId;

    /// Lightweight reachability check used by the health checker. Never
    /// served from cache.
    fn probe<'a>(&'a self) -> SourceFuture<'a, ()>;

    /// Latest articles for the front-page slider.
    fn latest_news_for_slider<'a>(&'a self, limit: usize) -> SourceFuture<'a, Vec<FormattedArticle>>;

    /// Latest articles in a category, by numeric id.
    fn latest_news_by_category_id<'a>(
        &'a self,
        category_id: u64,
        limit: usize,
    ) -> SourceFuture<'a, Vec<FormattedArticle>>;

    /// Latest articles in a category, by slug. An unknown slug yields an
    /// empty list.
    fn latest_news_by_category<'a>(
        &'a self,
        slug: &'a str,
        limit: usize,
    ) -> SourceFuture<'a, Vec<FormattedArticle>>;

    /// Full-text search over articles.
    fn search_posts<'a>(
        &'a self,
        term: &'a str,
        limit: usize,
    ) -> SourceFuture<'a, Vec<FormattedArticle>>;

    /// Single article, `None` if it does not exist.
    fn post_by_id<'a>(&'a self, id: u64) -> SourceFuture<'a, Option<FormattedArticle>>;

    /// Latest articles including their full content.
    fn fetch_latest_posts<'a>(&'a self, limit: usize) -> SourceFuture<'a, Vec<FormattedArticle>>;

    /// Comments on one post, oldest first.
    fn fetch_comments_by_post_id<'a>(&'a self, post_id: u64) -> SourceFuture<'a, Vec<Comment>>;

    /// Most recent comments across all posts, newest first.
    fn fetch_recent_comments<'a>(&'a self, limit: usize) -> SourceFuture<'a, Vec<Comment>>;

    /// Posts a new comment and returns it as stored by the backend.
    fn submit_comment<'a>(&'a self, submission: &'a CommentSubmission) -> SourceFuture<'a, Comment>;
}
