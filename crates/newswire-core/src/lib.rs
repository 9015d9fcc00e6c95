//! Core contracts for newswire.
//!
//! This crate contains:
//! - Normalized article and comment models
//! - Backend identifiers, selection modes and structured errors
//! - The [`NewsSource`] adapter contract with WordPress and Supabase adapters
//! - A TTL response cache and a rate-limited health checker
//! - [`NewsServiceManager`], which selects a backend per call and fails over
//!   to the other one within a per-operation retry budget
//!
//! ```text
//!  consumer ──► NewsServiceManager ──► active backend ──┐
//!                 │    ▲                                 │ error
//!                 │    └──── fallback backend ◄──────────┘
//!                 ▼
//!           HealthChecker ──► NewsSource::probe
//! ```

pub mod adapters;
pub mod backend;
pub mod cache;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod health;
pub mod http_client;
pub mod manager;
pub mod news_source;
pub mod testing;

pub use adapters::{SupabaseAdapter, WordPressAdapter};
pub use backend::{BackendId, ServiceMode};
pub use cache::{CacheStore, DEFAULT_CACHE_TTL};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ServiceConfig, SupabaseConfig, WordPressConfig};
pub use domain::{Comment, CommentSubmission, FormattedArticle, UtcDateTime};
pub use error::{ConfigError, ServiceError, ValidationError};
pub use health::{HealthCheckConfig, HealthChecker, HealthStatus};
pub use http_client::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
    StubHttpClient,
};
pub use manager::{FailoverPolicy, NewsServiceBuilder, NewsServiceManager, ServiceStatus};
pub use news_source::{NewsSource, Operation, SourceError, SourceErrorKind, SourceFuture};
