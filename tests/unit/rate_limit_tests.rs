/*!
 * Tests for the per-provider rate limiter
 */

use std::sync::Arc;
use std::time::Duration;

use cuebatch::errors::{RateLimitError, TranslationError};
use cuebatch::providers::registry::{
    ProviderProfile, ProviderRegistry, RateLimitKind, RateLimitSpec,
};
use cuebatch::translation::rate_limit::RateLimiter;

fn limited_registry(requests: usize, window_secs: u64, delay_ms: u64, burst: Option<usize>) -> Arc<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();
    registry.register(ProviderProfile {
        id: "tiny".to_string(),
        display_name: "Tiny".to_string(),
        supports_native_batch: false,
        default_batch_size: 2,
        max_batch_size: 4,
        batch_delimiter: "\n".to_string(),
        rate_limit: RateLimitSpec {
            kind: RateLimitKind::RequestsPerWindow,
            requests,
            window: Duration::from_secs(window_secs),
            mandatory_delay: Duration::from_millis(delay_ms),
            burst_limit: burst,
        },
        batch_delay: Duration::ZERO,
    });
    Arc::new(registry)
}

#[tokio::test(start_paused = true)]
async fn test_acquire_withFullWindow_shouldRejectWithRetryAfter() {
    let limiter = RateLimiter::new(limited_registry(3, 60, 0, None));

    for _ in 0..3 {
        limiter.acquire("tiny").await.unwrap();
    }
    match limiter.acquire("tiny").await {
        Err(TranslationError::RateLimit(RateLimitError::RateLimitExceeded { retry_after })) => {
            assert!(retry_after <= Duration::from_secs(60));
            assert!(retry_after > Duration::ZERO);
        }
        other => panic!("expected window rejection, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_acquire_afterWindowElapsed_shouldAdmitAgain() {
    let limiter = RateLimiter::new(limited_registry(2, 5, 0, None));

    limiter.acquire("tiny").await.unwrap();
    limiter.acquire("tiny").await.unwrap();
    assert!(limiter.acquire("tiny").await.is_err());

    tokio::time::advance(Duration::from_secs(6)).await;
    assert!(limiter.acquire("tiny").await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_acquire_withBurstSpike_shouldRejectBurst() {
    let limiter = RateLimiter::new(limited_registry(100, 60, 0, Some(2)));

    limiter.acquire("tiny").await.unwrap();
    limiter.acquire("tiny").await.unwrap();
    match limiter.acquire("tiny").await {
        Err(TranslationError::RateLimit(RateLimitError::BurstLimitExceeded { retry_after })) => {
            assert!(retry_after <= Duration::from_secs(10));
        }
        other => panic!("expected burst rejection, got {:?}", other),
    }

    // Burst sub-window passes while the main window still has room
    tokio::time::advance(Duration::from_secs(11)).await;
    assert!(limiter.acquire("tiny").await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_acquireWaiting_shouldNeverExceedWindowLimit() {
    let limiter = RateLimiter::new(limited_registry(3, 5, 0, None));

    // Admissions inside any trailing window never exceed the limit,
    // even when the caller asks for far more than the window holds.
    for _ in 0..10 {
        limiter.acquire_waiting("tiny").await.unwrap();
        let status = limiter.status("tiny").unwrap();
        assert!(status.requests <= status.limit);
    }
}

#[tokio::test(start_paused = true)]
async fn test_acquire_withMandatoryDelay_shouldSpaceRequests() {
    let limiter = RateLimiter::new(limited_registry(100, 60, 250, None));

    let start = tokio::time::Instant::now();
    limiter.acquire("tiny").await.unwrap();
    limiter.acquire("tiny").await.unwrap();
    limiter.acquire("tiny").await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_status_withIdleProvider_shouldAllowImmediately() {
    let limiter = RateLimiter::new(limited_registry(3, 60, 100, None));
    let status = limiter.status("tiny").unwrap();
    assert_eq!(status.requests, 0);
    assert_eq!(status.next_request_allowed_in, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_reset_shouldForgetHistory() {
    let limiter = RateLimiter::new(limited_registry(2, 60, 0, None));
    limiter.acquire("tiny").await.unwrap();
    limiter.acquire("tiny").await.unwrap();
    limiter.reset();
    assert!(limiter.acquire("tiny").await.is_ok());
}
