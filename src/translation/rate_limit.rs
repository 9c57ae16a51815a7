/*!
 * Per-provider request rate limiting.
 *
 * Each provider gets an independent sliding request window, a short
 * burst sub-window, and a mandatory inter-request delay. Window and
 * burst exhaustion are rejections carrying a `retry_after`; the
 * mandatory delay is a suspension that is always eventually satisfied.
 */

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace};
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::errors::{RateLimitError, RegistryError, TranslationError};
use crate::providers::registry::{ProviderRegistry, RateLimitSpec};

/// Length of the burst sub-window
const BURST_WINDOW: Duration = Duration::from_secs(10);

/// Snapshot of one provider's rate-limit usage
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    /// Admitted requests currently inside the sliding window
    pub requests: usize,
    /// Window request limit
    pub limit: usize,
    /// requests / limit, in percent
    pub usage_percent: f64,
    /// Admitted requests inside the burst sub-window
    pub burst_count: usize,
    /// Burst limit, if the provider has one
    pub burst_limit: Option<usize>,
    /// Wait until the next request could be admitted; zero if admittable now
    pub next_request_allowed_in: Duration,
}

/// Per-provider admission history
#[derive(Debug, Default)]
struct ProviderState {
    /// Admission instants inside the sliding window, oldest first
    history: VecDeque<Instant>,
    /// Instant of the most recent admitted request
    last_request: Option<Instant>,
}

impl ProviderState {
    /// Drop history entries older than the window
    fn prune(&mut self, window: Duration, now: Instant) {
        while let Some(&oldest) = self.history.front() {
            if now.duration_since(oldest) >= window {
                self.history.pop_front();
            } else {
                break;
            }
        }
    }

    /// Admissions inside the burst sub-window
    fn burst_count(&self, now: Instant) -> usize {
        self.history
            .iter()
            .filter(|&&t| now.duration_since(t) < BURST_WINDOW)
            .count()
    }

    /// Oldest admission inside the burst sub-window
    fn oldest_in_burst(&self, now: Instant) -> Option<Instant> {
        self.history
            .iter()
            .find(|&&t| now.duration_since(t) < BURST_WINDOW)
            .copied()
    }
}

/// Outcome of a single admission check
#[derive(Debug, Clone, PartialEq)]
enum Decision {
    /// Admitted and recorded
    Admitted,
    /// Mandatory delay still running; suspend and re-check
    Wait(Duration),
    /// Window or burst exhausted
    Rejected(RateLimitError),
}

/// Sliding-window rate limiter, one independent state per provider id
pub struct RateLimiter {
    registry: Arc<ProviderRegistry>,
    states: Mutex<HashMap<String, ProviderState>>,
}

impl RateLimiter {
    /// Create a limiter over the given capability registry
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Run one admission check at `now`, recording the request if admitted
    fn check_at(state: &mut ProviderState, spec: &RateLimitSpec, now: Instant) -> Decision {
        state.prune(spec.window, now);

        if let Some(burst_limit) = spec.burst_limit {
            let burst_count = state.burst_count(now);
            if burst_count >= burst_limit {
                let retry_after = state
                    .oldest_in_burst(now)
                    .map(|t| BURST_WINDOW.saturating_sub(now.duration_since(t)))
                    .unwrap_or(BURST_WINDOW);
                return Decision::Rejected(RateLimitError::BurstLimitExceeded { retry_after });
            }
        }

        if state.history.len() >= spec.requests {
            let retry_after = state
                .history
                .front()
                .map(|&t| spec.window.saturating_sub(now.duration_since(t)))
                .unwrap_or(spec.window);
            return Decision::Rejected(RateLimitError::RateLimitExceeded { retry_after });
        }

        if let Some(last) = state.last_request {
            let since_last = now.duration_since(last);
            if since_last < spec.mandatory_delay {
                return Decision::Wait(spec.mandatory_delay - since_last);
            }
        }

        state.history.push_back(now);
        state.last_request = Some(now);
        Decision::Admitted
    }

    /// Run one admission attempt for a provider
    fn try_acquire(&self, provider_id: &str) -> Result<Decision, RegistryError> {
        let spec = self.registry.get_profile(provider_id)?.rate_limit.clone();
        let mut states = self.states.lock();
        let state = states.entry(provider_id.to_string()).or_default();
        Ok(Self::check_at(state, &spec, Instant::now()))
    }

    /// Acquire an admission slot for a provider
    ///
    /// Suspends through the mandatory inter-request delay (re-checking
    /// afterwards); window and burst exhaustion surface as errors the
    /// caller must handle.
    pub async fn acquire(&self, provider_id: &str) -> Result<(), TranslationError> {
        loop {
            match self.try_acquire(provider_id)? {
                Decision::Admitted => {
                    trace!("Rate limiter admitted request for '{}'", provider_id);
                    return Ok(());
                }
                Decision::Wait(delay) => {
                    trace!(
                        "Mandatory delay of {:?} before next '{}' request",
                        delay, provider_id
                    );
                    tokio::time::sleep(delay).await;
                }
                Decision::Rejected(err) => return Err(err.into()),
            }
        }
    }

    /// Acquire an admission slot, sleeping through rejections as well
    ///
    /// This is the scheduler/batch-path behavior: a window or burst
    /// rejection becomes a wait of `retry_after` followed by a re-attempt.
    pub async fn acquire_waiting(&self, provider_id: &str) -> Result<(), TranslationError> {
        loop {
            match self.try_acquire(provider_id)? {
                Decision::Admitted => return Ok(()),
                Decision::Wait(delay) => tokio::time::sleep(delay).await,
                Decision::Rejected(err) => {
                    debug!(
                        "Rate limiter rejected '{}' ({}), waiting before re-attempt",
                        provider_id, err
                    );
                    tokio::time::sleep(err.retry_after()).await;
                }
            }
        }
    }

    /// Current usage snapshot for a provider
    pub fn status(&self, provider_id: &str) -> Result<RateLimitStatus, RegistryError> {
        let spec = self.registry.get_profile(provider_id)?.rate_limit.clone();
        let mut states = self.states.lock();
        let state = states.entry(provider_id.to_string()).or_default();
        let now = Instant::now();
        state.prune(spec.window, now);

        let requests = state.history.len();
        let burst_count = state.burst_count(now);

        let mut wait = Duration::ZERO;
        if let Some(last) = state.last_request {
            let since_last = now.duration_since(last);
            if since_last < spec.mandatory_delay {
                wait = wait.max(spec.mandatory_delay - since_last);
            }
        }
        if requests >= spec.requests {
            if let Some(&oldest) = state.history.front() {
                wait = wait.max(spec.window.saturating_sub(now.duration_since(oldest)));
            }
        }
        if let Some(burst_limit) = spec.burst_limit {
            if burst_count >= burst_limit {
                if let Some(oldest) = state.oldest_in_burst(now) {
                    wait = wait.max(BURST_WINDOW.saturating_sub(now.duration_since(oldest)));
                }
            }
        }

        Ok(RateLimitStatus {
            requests,
            limit: spec.requests,
            usage_percent: if spec.requests > 0 {
                requests as f64 / spec.requests as f64 * 100.0
            } else {
                0.0
            },
            burst_count,
            burst_limit: spec.burst_limit,
            next_request_allowed_in: wait,
        })
    }

    /// Drop all recorded history, for every provider
    pub fn reset(&self) {
        self.states.lock().clear();
    }
}
