use anyhow::{anyhow, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Configuration for the batching orchestrator
/// This module handles loading, validating and live-updating the
/// orchestration settings, and defines the read-only key/value seam
/// the embedding application exposes its settings through.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchingConfig {
    /// Active provider id
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Ordered fallback provider ids tried when the primary fails
    #[serde(default)]
    pub fallback_providers: Vec<String>,

    /// Whether batching is enabled at all; disabled means batch size 1
    #[serde(default = "default_batching_enabled")]
    pub batching_enabled: bool,

    /// Global default batch size, clamped per provider
    #[serde(default = "default_global_batch_size")]
    pub global_batch_size: usize,

    /// Prefer each provider's own default batch size over the global one
    #[serde(default)]
    pub use_provider_defaults: bool,

    /// Upper bound on batches in flight at once
    #[serde(default = "default_max_concurrent_batches")]
    pub max_concurrent_batches: usize,

    /// Wait between forming consecutive batches, milliseconds
    #[serde(default = "default_inter_batch_delay_ms")]
    pub inter_batch_delay_ms: u64,

    /// Cache entry time-to-live, seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Whether the translation cache is enabled
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,

    /// Per-provider overrides, keyed by provider id
    #[serde(default)]
    pub provider_overrides: HashMap<String, ProviderOverride>,
}

/// Per-provider configuration overrides
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProviderOverride {
    /// Override for the batch size used with this provider
    #[serde(default)]
    pub batch_size: Option<usize>,
}

fn default_provider() -> String {
    "google".to_string()
}

fn default_batching_enabled() -> bool {
    true
}

fn default_global_batch_size() -> usize {
    10
}

fn default_max_concurrent_batches() -> usize {
    2
}

fn default_inter_batch_delay_ms() -> u64 {
    100
}

fn default_cache_ttl_secs() -> u64 {
    30 * 60
}

fn default_cache_enabled() -> bool {
    true
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            fallback_providers: Vec::new(),
            batching_enabled: default_batching_enabled(),
            global_batch_size: default_global_batch_size(),
            use_provider_defaults: false,
            max_concurrent_batches: default_max_concurrent_batches(),
            inter_batch_delay_ms: default_inter_batch_delay_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_enabled: default_cache_enabled(),
            provider_overrides: HashMap::new(),
        }
    }
}

impl BatchingConfig {
    /// Parse a configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.provider.trim().is_empty() {
            return Err(anyhow!("Provider id cannot be empty"));
        }
        if self.global_batch_size == 0 {
            return Err(anyhow!("Global batch size must be at least 1"));
        }
        if self.max_concurrent_batches == 0 {
            return Err(anyhow!("Max concurrent batches must be at least 1"));
        }
        Ok(())
    }

    /// Batch-size override for a provider, if one is configured
    pub fn batch_size_override(&self, provider_id: &str) -> Option<usize> {
        self.provider_overrides
            .get(provider_id)
            .and_then(|o| o.batch_size)
    }

    /// Apply a set of changed settings keys onto this configuration.
    /// Unknown keys are ignored; malformed values keep the previous value.
    pub fn apply_changes(&mut self, changes: &HashMap<String, Value>) {
        for (key, value) in changes {
            match key.as_str() {
                "provider" => {
                    if let Some(v) = value.as_str() {
                        self.provider = v.to_string();
                    }
                }
                "fallback_providers" => {
                    if let Some(list) = value.as_array() {
                        self.fallback_providers = list
                            .iter()
                            .filter_map(|v| v.as_str().map(str::to_string))
                            .collect();
                    }
                }
                "batching_enabled" => {
                    if let Some(v) = value.as_bool() {
                        self.batching_enabled = v;
                    }
                }
                "global_batch_size" => {
                    if let Some(v) = value.as_u64() {
                        if v > 0 {
                            self.global_batch_size = v as usize;
                        }
                    }
                }
                "use_provider_defaults" => {
                    if let Some(v) = value.as_bool() {
                        self.use_provider_defaults = v;
                    }
                }
                "max_concurrent_batches" => {
                    if let Some(v) = value.as_u64() {
                        if v > 0 {
                            self.max_concurrent_batches = v as usize;
                        }
                    }
                }
                "inter_batch_delay_ms" => {
                    if let Some(v) = value.as_u64() {
                        self.inter_batch_delay_ms = v;
                    }
                }
                "cache_ttl_secs" => {
                    if let Some(v) = value.as_u64() {
                        self.cache_ttl_secs = v;
                    }
                }
                "cache_enabled" => {
                    if let Some(v) = value.as_bool() {
                        self.cache_enabled = v;
                    }
                }
                _ => {}
            }
        }
    }
}

/// Read-only settings access exposed by the embedding application
///
/// The orchestrator never writes settings; it reads them at startup and
/// listens for change notifications.
pub trait SettingsStore: Send + Sync {
    /// Read a single setting
    fn get(&self, key: &str) -> Option<Value>;

    /// Read several settings at once
    fn get_multiple(&self, keys: &[&str]) -> HashMap<String, Value> {
        keys.iter()
            .filter_map(|k| self.get(k).map(|v| (k.to_string(), v)))
            .collect()
    }

    /// Subscribe to setting changes; the callback receives the changed
    /// key/value pairs
    fn on_changed(&self, callback: Box<dyn Fn(&HashMap<String, Value>) + Send + Sync>);
}

/// Live configuration handle fed by a [`SettingsStore`] subscription
pub struct SettingsWatcher {
    config: Arc<RwLock<BatchingConfig>>,
}

impl SettingsWatcher {
    /// Wrap an initial configuration and subscribe to the store so later
    /// changes are folded into the shared handle
    pub fn attach(initial: BatchingConfig, store: &dyn SettingsStore) -> Self {
        let config = Arc::new(RwLock::new(initial));
        let shared = config.clone();
        store.on_changed(Box::new(move |changes| {
            shared.write().apply_changes(changes);
        }));
        Self { config }
    }

    /// A configuration handle that only changes through explicit
    /// [`BatchingConfig::apply_changes`] calls (no store subscription)
    pub fn fixed(initial: BatchingConfig) -> Self {
        Self { config: Arc::new(RwLock::new(initial)) }
    }

    /// Shared handle to the live configuration
    pub fn handle(&self) -> Arc<RwLock<BatchingConfig>> {
        self.config.clone()
    }

    /// Snapshot of the current configuration
    pub fn snapshot(&self) -> BatchingConfig {
        self.config.read().clone()
    }
}

/// In-memory settings store, used in tests and simple embeddings
#[derive(Default)]
pub struct InMemorySettingsStore {
    values: RwLock<HashMap<String, Value>>,
    subscribers: RwLock<Vec<Box<dyn Fn(&HashMap<String, Value>) + Send + Sync>>>,
}

impl InMemorySettingsStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Set values and notify subscribers of the change set
    pub fn set_multiple(&self, changes: HashMap<String, Value>) {
        {
            let mut values = self.values.write();
            for (k, v) in &changes {
                values.insert(k.clone(), v.clone());
            }
        }
        let subscribers = self.subscribers.read();
        for subscriber in subscribers.iter() {
            subscriber(&changes);
        }
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    fn on_changed(&self, callback: Box<dyn Fn(&HashMap<String, Value>) + Send + Sync>) {
        self.subscribers.write().push(callback);
    }
}
