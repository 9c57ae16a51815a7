/*!
 * Translation orchestration pipeline.
 *
 * This module contains the batching core of the library, split into
 * several submodules:
 *
 * - `core`: Translation facade (cache + fallback + retry)
 * - `batch`: Batch planning and result reassembly
 * - `cache`: TTL caching of translations
 * - `rate_limit`: Per-provider sliding-window rate limiting
 * - `scheduler`: Priority queue and concurrency-bounded drain loop
 * - `metrics`: Aggregate pipeline counters
 */

// Re-export main types for easier usage
pub use self::core::{TranslateOptions, TranslationService};
pub use self::scheduler::{BatchScheduler, CueItem, EnqueueContext, TranslatedCue};

// Submodules
pub mod batch;
pub mod cache;
pub mod core;
pub mod metrics;
pub mod rate_limit;
pub mod scheduler;
