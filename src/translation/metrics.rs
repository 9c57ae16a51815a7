/*!
 * Aggregate performance counters for the batching pipeline.
 *
 * Counters are monotonically updated and never rolled back; only an
 * explicit `reset()` clears them.
 */

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Aggregate counters across all batches and providers
#[derive(Debug, Default)]
pub struct PerformanceMetrics {
    /// Batches processed
    total_batches: AtomicUsize,

    /// Items processed across all batches and direct calls
    total_items: AtomicUsize,

    /// Items translated through the direct single-item path
    single_items: AtomicUsize,

    /// Provider calls actually issued
    provider_calls: AtomicUsize,

    /// Provider calls avoided via native batching and cache hits
    api_calls_saved: AtomicUsize,

    /// Items that fell back to their original text
    items_degraded: AtomicUsize,

    /// Cumulative batch latency, microseconds
    latency_micros: AtomicU64,

    /// Number of latency samples
    latency_samples: AtomicUsize,
}

/// Point-in-time view of the counters with derived rates
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    /// Batches processed
    pub total_batches: usize,
    /// Items processed
    pub total_items: usize,
    /// Provider calls issued
    pub provider_calls: usize,
    /// Provider calls avoided
    pub api_calls_saved: usize,
    /// Items returned untranslated after exhausting fallbacks
    pub items_degraded: usize,
    /// Mean items per batch
    pub average_batch_size: f64,
    /// Mean batch latency
    pub average_latency: Duration,
    /// Saved calls as a percentage of the calls a naive per-item
    /// implementation would have issued
    pub api_call_reduction_percentage: f64,
}

impl PerformanceMetrics {
    /// Create zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed batch
    pub fn record_batch(&self, items: usize, provider_calls: usize, latency: Duration) {
        self.total_batches.fetch_add(1, Ordering::Relaxed);
        self.total_items.fetch_add(items, Ordering::Relaxed);
        self.provider_calls.fetch_add(provider_calls, Ordering::Relaxed);
        self.api_calls_saved
            .fetch_add(items.saturating_sub(provider_calls), Ordering::Relaxed);
        self.latency_micros
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
        self.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one direct single-item translation; a cache hit counts
    /// as a saved provider call
    pub fn record_single(&self, cache_hit: bool) {
        self.total_items.fetch_add(1, Ordering::Relaxed);
        self.single_items.fetch_add(1, Ordering::Relaxed);
        if cache_hit {
            self.api_calls_saved.fetch_add(1, Ordering::Relaxed);
        } else {
            self.provider_calls.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an item that degraded to its original text
    pub fn record_degraded_item(&self) {
        self.items_degraded.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the current counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_batches = self.total_batches.load(Ordering::Relaxed);
        let total_items = self.total_items.load(Ordering::Relaxed);
        let provider_calls = self.provider_calls.load(Ordering::Relaxed);
        let api_calls_saved = self.api_calls_saved.load(Ordering::Relaxed);
        let latency_samples = self.latency_samples.load(Ordering::Relaxed);
        let latency_micros = self.latency_micros.load(Ordering::Relaxed);

        // Mean batch size excludes items from the direct path
        let batch_items = total_items.saturating_sub(self.single_items.load(Ordering::Relaxed));
        let average_batch_size = if total_batches > 0 {
            batch_items as f64 / total_batches as f64
        } else {
            0.0
        };

        let average_latency = if latency_samples > 0 {
            Duration::from_micros(latency_micros / latency_samples as u64)
        } else {
            Duration::ZERO
        };

        let would_have_issued = provider_calls + api_calls_saved;
        let api_call_reduction_percentage = if would_have_issued > 0 {
            api_calls_saved as f64 / would_have_issued as f64 * 100.0
        } else {
            0.0
        };

        MetricsSnapshot {
            total_batches,
            total_items,
            provider_calls,
            api_calls_saved,
            items_degraded: self.items_degraded.load(Ordering::Relaxed),
            average_batch_size,
            average_latency,
            api_call_reduction_percentage,
        }
    }

    /// Reset all counters to zero (explicit operator action only)
    pub fn reset(&self) {
        self.total_batches.store(0, Ordering::Relaxed);
        self.total_items.store(0, Ordering::Relaxed);
        self.single_items.store(0, Ordering::Relaxed);
        self.provider_calls.store(0, Ordering::Relaxed);
        self.api_calls_saved.store(0, Ordering::Relaxed);
        self.items_degraded.store(0, Ordering::Relaxed);
        self.latency_micros.store(0, Ordering::Relaxed);
        self.latency_samples.store(0, Ordering::Relaxed);
    }
}
