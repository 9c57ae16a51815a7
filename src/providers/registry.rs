/*!
 * Provider capability registry.
 *
 * This module holds the static per-provider batching and rate-limit
 * parameters the rest of the pipeline derives its decisions from:
 * batch sizes, batching style, delimiters, and rate-limit descriptors.
 */

use std::collections::HashMap;
use std::time::Duration;

use crate::errors::RegistryError;

/// How a provider's rate limit is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitKind {
    /// Fixed number of requests per sliding window
    RequestsPerWindow,
    /// Byte budget per sliding window
    BytesPerWindow,
    /// Character budget over a sliding window
    CharactersSlidingWindow,
}

/// Rate-limit descriptor for one provider
#[derive(Debug, Clone)]
pub struct RateLimitSpec {
    /// How the limit is expressed
    pub kind: RateLimitKind,
    /// Maximum admissions within `window`
    pub requests: usize,
    /// Sliding window length
    pub window: Duration,
    /// Minimum wait between consecutive requests, independent of the window
    pub mandatory_delay: Duration,
    /// Secondary cap over the short burst sub-window, if any
    pub burst_limit: Option<usize>,
}

/// Capability profile for one translation back-end
///
/// Immutable once registered; one profile per provider id.
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    /// Unique provider key (e.g. "google")
    pub id: String,
    /// Human-readable name
    pub display_name: String,
    /// Whether the back-end accepts delimiter-joined batch calls
    pub supports_native_batch: bool,
    /// Batch size used when the caller opts into provider defaults
    pub default_batch_size: usize,
    /// Hard upper bound on items per batch
    pub max_batch_size: usize,
    /// Delimiter used to join/split native batch payloads
    pub batch_delimiter: String,
    /// Rate-limit descriptor
    pub rate_limit: RateLimitSpec,
    /// Wait between items of a simulated batch (composes with the
    /// limiter's mandatory delay, never races with it)
    pub batch_delay: Duration,
}

/// Registry of provider capability profiles
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    profiles: HashMap<String, ProviderProfile>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { profiles: HashMap::new() }
    }

    /// Create a registry preloaded with the built-in provider profiles
    pub fn with_builtin_profiles() -> Self {
        let mut registry = Self::new();
        for profile in builtin_profiles() {
            registry.register(profile);
        }
        registry
    }

    /// Register a profile, replacing any previous profile with the same id
    pub fn register(&mut self, profile: ProviderProfile) {
        self.profiles.insert(profile.id.clone(), profile);
    }

    /// Look up a provider profile
    pub fn get_profile(&self, provider_id: &str) -> Result<&ProviderProfile, RegistryError> {
        self.profiles
            .get(provider_id)
            .ok_or_else(|| RegistryError::UnknownProvider(provider_id.to_string()))
    }

    /// All registered provider ids
    pub fn provider_ids(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    /// Compute the batch size to use for a provider
    ///
    /// Returns 1 when batching is globally disabled, the provider's own
    /// default when `use_provider_defaults` is set, and otherwise the
    /// global default clamped to the provider's maximum.
    pub fn effective_batch_size(
        &self,
        provider_id: &str,
        batching_enabled: bool,
        global_default: usize,
        use_provider_defaults: bool,
    ) -> Result<usize, RegistryError> {
        let profile = self.get_profile(provider_id)?;

        if !batching_enabled {
            return Ok(1);
        }

        let size = if use_provider_defaults {
            profile.default_batch_size
        } else {
            global_default.min(profile.max_batch_size)
        };

        Ok(size.max(1))
    }
}

/// Built-in capability profiles for the common translation back-ends
fn builtin_profiles() -> Vec<ProviderProfile> {
    vec![
        ProviderProfile {
            id: "google".to_string(),
            display_name: "Google Translate".to_string(),
            supports_native_batch: true,
            default_batch_size: 10,
            max_batch_size: 25,
            batch_delimiter: "\n".to_string(),
            rate_limit: RateLimitSpec {
                kind: RateLimitKind::RequestsPerWindow,
                requests: 100,
                window: Duration::from_secs(60),
                mandatory_delay: Duration::from_millis(100),
                burst_limit: Some(10),
            },
            batch_delay: Duration::from_millis(150),
        },
        ProviderProfile {
            id: "deepl".to_string(),
            display_name: "DeepL".to_string(),
            supports_native_batch: true,
            default_batch_size: 8,
            max_batch_size: 50,
            batch_delimiter: "\n".to_string(),
            rate_limit: RateLimitSpec {
                kind: RateLimitKind::CharactersSlidingWindow,
                requests: 60,
                window: Duration::from_secs(60),
                mandatory_delay: Duration::from_millis(200),
                burst_limit: Some(5),
            },
            batch_delay: Duration::from_millis(200),
        },
        ProviderProfile {
            id: "microsoft".to_string(),
            display_name: "Microsoft Translator".to_string(),
            supports_native_batch: true,
            default_batch_size: 10,
            max_batch_size: 20,
            batch_delimiter: "\n".to_string(),
            rate_limit: RateLimitSpec {
                kind: RateLimitKind::RequestsPerWindow,
                requests: 80,
                window: Duration::from_secs(60),
                mandatory_delay: Duration::from_millis(150),
                burst_limit: Some(8),
            },
            batch_delay: Duration::from_millis(200),
        },
        ProviderProfile {
            id: "yandex".to_string(),
            display_name: "Yandex Translate".to_string(),
            supports_native_batch: false,
            default_batch_size: 5,
            max_batch_size: 10,
            batch_delimiter: "\n".to_string(),
            rate_limit: RateLimitSpec {
                kind: RateLimitKind::RequestsPerWindow,
                requests: 40,
                window: Duration::from_secs(60),
                mandatory_delay: Duration::from_millis(250),
                burst_limit: Some(4),
            },
            batch_delay: Duration::from_millis(300),
        },
    ]
}
