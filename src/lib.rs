/*!
 * # cuebatch - translation batching orchestrator
 *
 * A Rust library for batching many short text-translation requests
 * across multiple third-party translation back-ends while respecting
 * each back-end's rate limits, batch-size limits, and batching style.
 *
 * ## Features
 *
 * - Provider capability registry with per-provider batching parameters
 * - Sliding-window rate limiting with burst detection and mandatory
 *   inter-request delays
 * - Native (delimiter-joined) and simulated (rapid sequential) batching
 * - Priority-aware scheduling of subtitle cues against playback time
 * - TTL caching of translations keyed by text, language pair, and provider
 * - Graceful degradation: items that cannot be translated come back as
 *   their original text, never as errors or holes in the output
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management and the settings-store seam
 * - `providers`: Back-end trait and the capability registry:
 *   - `providers::registry`: Per-provider batching and rate-limit profiles
 * - `translation`: The orchestration pipeline:
 *   - `translation::core`: Translation facade (cache + fallback + retry)
 *   - `translation::batch`: Batch planning and reassembly
 *   - `translation::cache`: TTL caching of translations
 *   - `translation::rate_limit`: Per-provider rate limiting
 *   - `translation::scheduler`: Priority queue and drain loop
 *   - `translation::metrics`: Aggregate pipeline counters
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the library
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{BatchingConfig, InMemorySettingsStore, SettingsStore, SettingsWatcher};
pub use errors::{ProviderError, RateLimitError, RegistryError, TranslationError};
pub use providers::registry::{ProviderProfile, ProviderRegistry, RateLimitKind, RateLimitSpec};
pub use providers::TranslationBackend;
pub use translation::{BatchScheduler, CueItem, EnqueueContext, TranslateOptions, TranslatedCue, TranslationService};
