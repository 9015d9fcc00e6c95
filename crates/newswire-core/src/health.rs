//! Rate-limited reachability view of the two backends.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::news_source::NewsSource;
use crate::{BackendId, UtcDateTime};

/// Configuration for health checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthCheckConfig {
    /// Minimum time between two probe rounds.
    pub check_interval: Duration,
    /// Timeout for each individual probe.
    pub probe_timeout: Duration,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

/// Last known health of both backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub wordpress: bool,
    pub supabase: bool,
    /// `None` until the first probe round completes.
    pub last_checked_at: Option<UtcDateTime>,
}

impl HealthStatus {
    pub const fn is_healthy(&self, backend: BackendId) -> bool {
        match backend {
            BackendId::WordPress => self.wordpress,
            BackendId::Supabase => self.supabase,
        }
    }

    fn set(&mut self, backend: BackendId, healthy: bool) {
        match backend {
            BackendId::WordPress => self.wordpress = healthy,
            BackendId::Supabase => self.supabase = healthy,
        }
    }
}

#[derive(Debug)]
struct CheckerState {
    status: HealthStatus,
    last_probe: Option<Instant>,
}

/// Probes the configured backends at most once per interval and remembers
/// the outcome.
///
/// Configured backends start out healthy; a backend that is not configured
/// is always reported unhealthy. Probe failures never escape
/// [`check_health`](HealthChecker::check_health).
pub struct HealthChecker {
    wordpress: Option<Arc<dyn NewsSource>>,
    supabase: Option<Arc<dyn NewsSource>>,
    config: HealthCheckConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<CheckerState>,
}

impl HealthChecker {
    pub fn with_clock(
        wordpress: Option<Arc<dyn NewsSource>>,
        supabase: Option<Arc<dyn NewsSource>>,
        config: HealthCheckConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let status = HealthStatus {
            wordpress: wordpress.is_some(),
            supabase: supabase.is_some(),
            last_checked_at: None,
        };

        Self {
            wordpress,
            supabase,
            config,
            clock,
            state: Mutex::new(CheckerState {
                status,
                last_probe: None,
            }),
        }
    }

    /// Returns fresh health, probing both backends in parallel if the
    /// interval has elapsed since the previous round, or the cached status
    /// otherwise.
    pub async fn check_health(&self) -> HealthStatus {
        let now = self.clock.now();
        let previous_probe = {
            let mut state = self.lock_state();
            if let Some(last_probe) = state.last_probe {
                if now.saturating_duration_since(last_probe) <= self.config.check_interval {
                    return state.status;
                }
            }
            // Claim the round so concurrent callers reuse the current status.
            state.last_probe.replace(now)
        };
        let mut claim = RoundClaim {
            state: &self.state,
            previous: previous_probe,
            claimed: now,
            finished: false,
        };

        let (wordpress, supabase) = tokio::join!(
            self.probe(BackendId::WordPress, self.wordpress.as_deref()),
            self.probe(BackendId::Supabase, self.supabase.as_deref()),
        );

        let mut state = self.lock_state();
        let previous = state.status;
        state.status.set(BackendId::WordPress, wordpress);
        state.status.set(BackendId::Supabase, supabase);
        state.status.last_checked_at = Some(UtcDateTime::now());

        for backend in BackendId::ALL {
            let was = previous.is_healthy(backend);
            let is = state.status.is_healthy(backend);
            if was != is {
                if is {
                    info!(backend = backend.as_str(), "backend is now healthy");
                } else {
                    warn!(backend = backend.as_str(), "backend is now unhealthy");
                }
            }
        }

        claim.finished = true;
        state.status
    }

    /// Last computed status, without probing.
    pub fn last_status(&self) -> HealthStatus {
        self.lock_state().status
    }

    async fn probe(&self, backend: BackendId, source: Option<&dyn NewsSource>) -> bool {
        let Some(source) = source else {
            return false;
        };

        match tokio::time::timeout(self.config.probe_timeout, source.probe()).await {
            Ok(Ok(())) => {
                debug!(backend = backend.as_str(), "health probe succeeded");
                true
            }
            Ok(Err(error)) => {
                debug!(backend = backend.as_str(), %error, "health probe failed");
                false
            }
            Err(_) => {
                debug!(
                    backend = backend.as_str(),
                    timeout_ms = self.config.probe_timeout.as_millis() as u64,
                    "health probe timed out"
                );
                false
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, CheckerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A probe round in progress. If the round is dropped before its results are
/// stored, the claim is released so the next caller probes again.
struct RoundClaim<'a> {
    state: &'a Mutex<CheckerState>,
    previous: Option<Instant>,
    claimed: Instant,
    finished: bool,
}

impl Drop for RoundClaim<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        // A later round may have claimed the slot in the meantime.
        if state.last_probe == Some(self.claimed) {
            state.last_probe = self.previous;
        }
    }
}
