use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use serde::Serialize;
use tracing::{debug, warn};

use crate::adapters::{SupabaseAdapter, WordPressAdapter};
use crate::clock::{Clock, SystemClock};
use crate::health::{HealthCheckConfig, HealthChecker, HealthStatus};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::news_source::{NewsSource, Operation, SourceFuture};
use crate::{
    BackendId, Comment, CommentSubmission, FormattedArticle, ServiceConfig, ServiceError,
    ServiceMode,
};

/// Failover knobs taken from [`ServiceConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailoverPolicy {
    pub enable_fallback: bool,
    /// Consecutive failovers allowed per operation; `0` never fails over.
    pub retry_attempts: u32,
}

impl From<&ServiceConfig> for FailoverPolicy {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            enable_fallback: config.enable_fallback,
            retry_attempts: config.retry_attempts,
        }
    }
}

/// Read-only diagnostic snapshot. Selection never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub mode: ServiceMode,
    pub wordpress_configured: bool,
    pub supabase_configured: bool,
    pub health: HealthStatus,
}

/// Uniform news API over the WordPress and Supabase backends.
///
/// Every operation picks an active backend (the explicitly selected one, or
/// the healthiest one in `auto` mode) and, when it fails, may retry once on
/// the other backend. Failover is budgeted per operation: after
/// `retry_attempts` consecutive failovers of the same operation its errors
/// surface directly until the primary succeeds again.
///
/// The manager is built once by the application and shared by reference or
/// behind `Arc`; it holds no global state.
pub struct NewsServiceManager {
    wordpress: Option<Arc<dyn NewsSource>>,
    supabase: Option<Arc<dyn NewsSource>>,
    health: HealthChecker,
    policy: FailoverPolicy,
    mode: RwLock<ServiceMode>,
    failures: Mutex<HashMap<Operation, u32>>,
}

impl NewsServiceManager {
    pub fn new(
        config: &ServiceConfig,
        wordpress: Option<Arc<dyn NewsSource>>,
        supabase: Option<Arc<dyn NewsSource>>,
    ) -> Self {
        Self::with_clock(config, wordpress, supabase, Arc::new(SystemClock))
    }

    /// Like [`new`](Self::new), with the health-check interval measured on
    /// `clock`.
    pub fn with_clock(
        config: &ServiceConfig,
        wordpress: Option<Arc<dyn NewsSource>>,
        supabase: Option<Arc<dyn NewsSource>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let health = HealthChecker::with_clock(
            wordpress.clone(),
            supabase.clone(),
            HealthCheckConfig {
                check_interval: config.health_check_interval,
                probe_timeout: config.probe_timeout,
            },
            clock,
        );

        Self {
            wordpress,
            supabase,
            health,
            policy: FailoverPolicy::from(config),
            mode: RwLock::new(config.default_mode),
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Current selection mode.
    pub fn mode(&self) -> ServiceMode {
        *self.mode.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Changes the selection mode; the next operation uses it.
    pub fn switch_service(&self, mode: ServiceMode) {
        let previous = {
            let mut current = self.mode.write().unwrap_or_else(|e| e.into_inner());
            std::mem::replace(&mut *current, mode)
        };
        debug!(from = previous.as_str(), to = mode.as_str(), "service mode switched");
    }

    pub fn is_configured(&self, backend: BackendId) -> bool {
        self.source(backend).is_some()
    }

    /// Mode, configured adapters and last known health.
    pub fn service_status(&self) -> ServiceStatus {
        ServiceStatus {
            mode: self.mode(),
            wordpress_configured: self.wordpress.is_some(),
            supabase_configured: self.supabase.is_some(),
            health: self.health.last_status(),
        }
    }

    /// Refreshes backend health, subject to the check interval.
    pub async fn check_health(&self) -> HealthStatus {
        self.health.check_health().await
    }

    /// Consecutive failovers recorded for `operation` since its primary last
    /// succeeded.
    pub fn failure_count(&self, operation: Operation) -> u32 {
        self.lock_failures().get(&operation).copied().unwrap_or(0)
    }

    /// Picks the backend the next operation goes to.
    ///
    /// An explicit mode whose adapter is configured wins without a health
    /// check. Otherwise Supabase is preferred over WordPress among healthy
    /// backends; with neither healthy, any configured adapter is used
    /// (Supabase first) in degraded mode.
    pub async fn active_backend(&self) -> Result<BackendId, ServiceError> {
        let mode = self.mode();
        if let Some(pinned) = mode.pinned() {
            if self.is_configured(pinned) {
                return Ok(pinned);
            }
            debug!(
                mode = mode.as_str(),
                "selected backend is not configured; using automatic selection"
            );
        }

        if self.wordpress.is_none() && self.supabase.is_none() {
            return Err(ServiceError::NoServiceAvailable);
        }

        let health = self.health.check_health().await;
        for candidate in [BackendId::Supabase, BackendId::WordPress] {
            if self.is_configured(candidate) && health.is_healthy(candidate) {
                return Ok(candidate);
            }
        }

        let degraded = if self.supabase.is_some() {
            BackendId::Supabase
        } else {
            BackendId::WordPress
        };
        warn!(
            backend = degraded.as_str(),
            "no backend reported healthy; running in degraded mode"
        );
        Ok(degraded)
    }

    /// The adapter [`active_backend`](Self::active_backend) selects.
    pub async fn active_service(&self) -> Result<Arc<dyn NewsSource>, ServiceError> {
        let backend = self.active_backend().await?;
        let source = match backend {
            BackendId::WordPress => self.wordpress.as_ref(),
            BackendId::Supabase => self.supabase.as_ref(),
        };
        source.cloned().ok_or(ServiceError::NoServiceAvailable)
    }

    pub async fn latest_news_for_slider(
        &self,
        limit: usize,
    ) -> Result<Vec<FormattedArticle>, ServiceError> {
        self.execute_with_failover(Operation::LatestForSlider, |source| {
            source.latest_news_for_slider(limit)
        })
        .await
    }

    pub async fn latest_news_by_category_id(
        &self,
        category_id: u64,
        limit: usize,
    ) -> Result<Vec<FormattedArticle>, ServiceError> {
        self.execute_with_failover(Operation::ByCategoryId, |source| {
            source.latest_news_by_category_id(category_id, limit)
        })
        .await
    }

    pub async fn latest_news_by_category(
        &self,
        slug: &str,
        limit: usize,
    ) -> Result<Vec<FormattedArticle>, ServiceError> {
        self.execute_with_failover(Operation::ByCategorySlug, |source| {
            source.latest_news_by_category(slug, limit)
        })
        .await
    }

    pub async fn search_posts(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<FormattedArticle>, ServiceError> {
        self.execute_with_failover(Operation::Search, |source| source.search_posts(term, limit))
            .await
    }

    pub async fn post_by_id(&self, id: u64) -> Result<Option<FormattedArticle>, ServiceError> {
        self.execute_with_failover(Operation::PostById, |source| source.post_by_id(id))
            .await
    }

    pub async fn fetch_latest_posts(
        &self,
        limit: usize,
    ) -> Result<Vec<FormattedArticle>, ServiceError> {
        self.execute_with_failover(Operation::LatestPosts, |source| {
            source.fetch_latest_posts(limit)
        })
        .await
    }

    pub async fn fetch_comments_by_post_id(
        &self,
        post_id: u64,
    ) -> Result<Vec<Comment>, ServiceError> {
        self.execute_with_failover(Operation::CommentsByPost, |source| {
            source.fetch_comments_by_post_id(post_id)
        })
        .await
    }

    pub async fn fetch_recent_comments(&self, limit: usize) -> Result<Vec<Comment>, ServiceError> {
        self.execute_with_failover(Operation::RecentComments, |source| {
            source.fetch_recent_comments(limit)
        })
        .await
    }

    pub async fn submit_comment(
        &self,
        submission: &CommentSubmission,
    ) -> Result<Comment, ServiceError> {
        self.execute_with_failover(Operation::SubmitComment, |source| {
            source.submit_comment(submission)
        })
        .await
    }

    async fn execute_with_failover<'a, T, F>(
        &'a self,
        operation: Operation,
        mut invoke: F,
    ) -> Result<T, ServiceError>
    where
        F: FnMut(&'a dyn NewsSource) -> SourceFuture<'a, T>,
    {
        let primary_id = self.active_backend().await?;
        let primary = self
            .source(primary_id)
            .ok_or(ServiceError::NoServiceAvailable)?;

        debug!(
            operation = operation.as_str(),
            backend = primary_id.as_str(),
            "dispatching operation"
        );

        let error = match invoke(primary).await {
            Ok(data) => {
                self.lock_failures().remove(&operation);
                return Ok(data);
            }
            Err(error) => error,
        };

        let fallback_id = primary_id.other();
        let fallback = match self.source(fallback_id) {
            Some(fallback) if self.policy.enable_fallback => fallback,
            _ => {
                return Err(ServiceError::Source {
                    backend: primary_id,
                    error,
                })
            }
        };

        let Some(attempt) = self.claim_failover(operation) else {
            warn!(
                operation = operation.as_str(),
                backend = primary_id.as_str(),
                retry_attempts = self.policy.retry_attempts,
                %error,
                "failover budget exhausted; surfacing primary error"
            );
            return Err(ServiceError::Source {
                backend: primary_id,
                error,
            });
        };

        warn!(
            operation = operation.as_str(),
            from = primary_id.as_str(),
            to = fallback_id.as_str(),
            attempt,
            %error,
            "primary backend failed; failing over"
        );

        invoke(fallback)
            .await
            .map_err(|error| ServiceError::Source {
                backend: fallback_id,
                error,
            })
    }

    /// Increments the failover counter for `operation` if it is below the
    /// ceiling and returns the new count.
    fn claim_failover(&self, operation: Operation) -> Option<u32> {
        let mut failures = self.lock_failures();
        let count = failures.entry(operation).or_insert(0);
        if *count >= self.policy.retry_attempts {
            return None;
        }
        *count += 1;
        Some(*count)
    }

    fn source(&self, backend: BackendId) -> Option<&dyn NewsSource> {
        match backend {
            BackendId::WordPress => self.wordpress.as_deref(),
            BackendId::Supabase => self.supabase.as_deref(),
        }
    }

    fn lock_failures(&self) -> std::sync::MutexGuard<'_, HashMap<Operation, u32>> {
        self.failures.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Builds a [`NewsServiceManager`] with HTTP adapters from a
/// [`ServiceConfig`].
///
/// # Example
///
/// ```rust,ignore
/// use newswire_core::{NewsServiceBuilder, ServiceConfig};
///
/// let config = ServiceConfig::from_env()?;
/// let manager = NewsServiceBuilder::new(config).build();
/// let articles = manager.latest_news_for_slider(5).await?;
/// ```
pub struct NewsServiceBuilder {
    config: ServiceConfig,
    http_client: Option<Arc<dyn HttpClient>>,
    clock: Option<Arc<dyn Clock>>,
}

impl NewsServiceBuilder {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            http_client: None,
            clock: None,
        }
    }

    /// Shares `http_client` between both adapters instead of a fresh
    /// [`ReqwestHttpClient`].
    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Drives cache expiry and health-check intervals from `clock`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> NewsServiceManager {
        let http_client = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let wordpress = self.config.wordpress.as_ref().map(|wordpress| {
            Arc::new(
                WordPressAdapter::new(wordpress, Arc::clone(&http_client))
                    .with_timeout(self.config.request_timeout)
                    .with_cache_ttl(self.config.cache_ttl, Arc::clone(&clock)),
            ) as Arc<dyn NewsSource>
        });

        let supabase = self.config.supabase.as_ref().map(|supabase| {
            Arc::new(
                SupabaseAdapter::new(supabase, Arc::clone(&http_client))
                    .with_timeout(self.config.request_timeout)
                    .with_cache_ttl(self.config.cache_ttl, Arc::clone(&clock)),
            ) as Arc<dyn NewsSource>
        });

        NewsServiceManager::with_clock(&self.config, wordpress, supabase, clock)
    }
}
