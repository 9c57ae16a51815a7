/*!
 * Core translation facade.
 *
 * This module contains the TranslationService, the single entry point
 * for single and batch translation. It composes the capability
 * registry, the rate limiter, the TTL cache, and the injected back-end
 * clients, and turns partial failures into degraded-but-correct
 * results: an item that cannot be translated comes back as its
 * original text, never as an error or a hole in the output.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use log::{debug, warn};
use parking_lot::RwLock;
use tokio::time::Instant;

use crate::app_config::BatchingConfig;
use crate::errors::{RegistryError, TranslationError};
use crate::providers::registry::{ProviderProfile, ProviderRegistry};
use crate::providers::TranslationBackend;

use super::batch::{self, BatchMethod, PlannedBatch};
use super::cache::TranslationCache;
use super::metrics::{MetricsSnapshot, PerformanceMetrics};
use super::rate_limit::{RateLimitStatus, RateLimiter};

/// Options for customizing a translation call
#[derive(Debug, Clone)]
pub struct TranslateOptions {
    /// Provider to use instead of the configured active provider
    pub provider: Option<String>,

    /// Whether a provider failure may be retried once against a
    /// configured fallback provider
    pub allow_retry: bool,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            provider: None,
            allow_retry: true,
        }
    }
}

/// Translation facade composing cache, rate limiter, and back-ends
pub struct TranslationService {
    registry: Arc<ProviderRegistry>,
    limiter: Arc<RateLimiter>,
    cache: TranslationCache,
    metrics: Arc<PerformanceMetrics>,
    backends: RwLock<HashMap<String, Arc<dyn TranslationBackend>>>,
    config: Arc<RwLock<BatchingConfig>>,
}

impl TranslationService {
    /// Create a service over a capability registry and a live config handle
    pub fn new(registry: Arc<ProviderRegistry>, config: Arc<RwLock<BatchingConfig>>) -> Self {
        let (cache_enabled, cache_ttl) = {
            let cfg = config.read();
            (cfg.cache_enabled, Duration::from_secs(cfg.cache_ttl_secs))
        };
        Self {
            limiter: Arc::new(RateLimiter::new(registry.clone())),
            registry,
            cache: TranslationCache::new(cache_enabled, cache_ttl),
            metrics: Arc::new(PerformanceMetrics::new()),
            backends: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Register a back-end client under its provider id
    pub fn register_backend(&self, backend: Arc<dyn TranslationBackend>) {
        self.backends.write().insert(backend.id().to_string(), backend);
    }

    /// The configured active provider id
    pub fn active_provider(&self) -> String {
        self.config.read().provider.clone()
    }

    /// Aggregate pipeline counters
    pub fn performance_metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Reset the aggregate counters
    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    /// Rate-limit usage for one provider
    pub fn rate_limit_status(&self, provider_id: &str) -> Result<RateLimitStatus, RegistryError> {
        self.limiter.status(provider_id)
    }

    /// Cache statistics as (hits, misses, hit rate)
    pub fn cache_stats(&self) -> (usize, usize, f64) {
        self.cache.stats()
    }

    /// Remove expired cache entries
    pub fn sweep_cache(&self) {
        self.cache.sweep()
    }

    /// Batch size currently in effect for a provider, combining the
    /// global settings with any per-provider override
    pub fn effective_batch_size(&self, provider_id: &str) -> Result<usize, RegistryError> {
        let (enabled, global, use_defaults) = {
            let cfg = self.config.read();
            let global = cfg
                .batch_size_override(provider_id)
                .unwrap_or(cfg.global_batch_size);
            (cfg.batching_enabled, global, cfg.use_provider_defaults)
        };
        self.registry
            .effective_batch_size(provider_id, enabled, global, use_defaults)
    }

    fn backend(&self, provider_id: &str) -> Result<Arc<dyn TranslationBackend>, RegistryError> {
        self.backends
            .read()
            .get(provider_id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownProvider(provider_id.to_string()))
    }

    fn resolve_provider(&self, options: &TranslateOptions) -> String {
        options
            .provider
            .clone()
            .unwrap_or_else(|| self.active_provider())
    }

    /// First configured fallback provider that differs from `primary`
    /// and has both a profile and a back-end
    fn fallback_for(&self, primary: &str) -> Option<String> {
        let fallbacks = self.config.read().fallback_providers.clone();
        fallbacks.into_iter().find(|id| {
            id != primary && self.registry.get_profile(id).is_ok() && self.backend(id).is_ok()
        })
    }

    /// Translate a single text
    ///
    /// Cache hits return immediately without consuming a rate-limit
    /// slot. Window and burst rejections propagate; direct callers
    /// must wait `retry_after` and re-attempt themselves.
    pub async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        options: &TranslateOptions,
    ) -> Result<String, TranslationError> {
        let provider = self.resolve_provider(options);
        self.registry.get_profile(&provider)?;

        if let Some(hit) = self.cache.get(text, source_language, target_language, &provider) {
            self.metrics.record_single(true);
            return Ok(hit);
        }

        match self
            .translate_uncached(&provider, text, source_language, target_language, false)
            .await
        {
            Ok(translated) => {
                self.metrics.record_single(false);
                Ok(translated)
            }
            Err(err @ TranslationError::Provider(_)) if options.allow_retry => {
                let Some(fallback) = self.fallback_for(&provider) else {
                    return Err(err);
                };
                debug!(
                    "Provider '{}' failed ({}), retrying once with '{}'",
                    provider, err, fallback
                );
                if let Some(hit) =
                    self.cache.get(text, source_language, target_language, &fallback)
                {
                    self.metrics.record_single(true);
                    return Ok(hit);
                }
                let translated = self
                    .translate_uncached(&fallback, text, source_language, target_language, false)
                    .await?;
                self.metrics.record_single(false);
                Ok(translated)
            }
            Err(err) => Err(err),
        }
    }

    /// Rate-limited back-end call plus cache store
    async fn translate_uncached(
        &self,
        provider: &str,
        text: &str,
        source_language: &str,
        target_language: &str,
        wait_through_rejections: bool,
    ) -> Result<String, TranslationError> {
        let backend = self.backend(provider)?;
        if wait_through_rejections {
            self.limiter.acquire_waiting(provider).await?;
        } else {
            self.limiter.acquire(provider).await?;
        }
        let translated = backend
            .translate(text, source_language, target_language)
            .await?;
        self.cache
            .store(text, source_language, target_language, provider, &translated);
        Ok(translated)
    }

    /// Translate a list of texts, preserving order
    ///
    /// The output always has the same length as the input. Native batch
    /// failures fall back to per-item translation; an item whose
    /// translation ultimately fails contributes its original text. Only
    /// an unknown provider id can surface as an error.
    pub async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
        options: &TranslateOptions,
    ) -> Result<Vec<String>, TranslationError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let provider = self.resolve_provider(options);
        let profile = self.registry.get_profile(&provider)?.clone();
        self.backend(&provider)?;

        let batch_size = self.effective_batch_size(&provider)?;
        let max_concurrent = self.config.read().max_concurrent_batches.max(1);

        let plan = batch::plan(texts, &profile, batch_size);
        debug!(
            "Planned {} batches for {} items via '{}' (batch size {})",
            plan.batches.len(),
            plan.item_count,
            provider,
            batch_size
        );

        let profile_ref = &profile;
        let mut indexed: Vec<(usize, Vec<String>)> =
            stream::iter(plan.batches.into_iter().enumerate())
                .map(|(index, planned)| async move {
                    let results = self
                        .run_batch(planned, profile_ref, source_language, target_language, options)
                        .await;
                    (index, results)
                })
                .buffer_unordered(max_concurrent)
                .collect()
                .await;

        // Restore original submission order
        indexed.sort_by_key(|(index, _)| *index);

        let mut output = Vec::with_capacity(texts.len());
        for (_, results) in indexed {
            output.extend(results);
        }
        Ok(output)
    }

    /// Execute one planned batch, absorbing every failure at item level
    async fn run_batch(
        &self,
        planned: PlannedBatch,
        profile: &ProviderProfile,
        source_language: &str,
        target_language: &str,
        options: &TranslateOptions,
    ) -> Vec<String> {
        let started = Instant::now();
        let item_count = planned.len();
        let batch_id = planned.id;

        let (results, provider_calls) = match planned.method {
            BatchMethod::Native => {
                match self
                    .run_native_batch(&planned, profile, source_language, target_language)
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        warn!(
                            "Native batch {} via '{}' failed ({}), falling back to per-item calls",
                            batch_id, profile.id, err
                        );
                        self.run_sequential_batch(
                            &planned,
                            profile,
                            source_language,
                            target_language,
                            options,
                        )
                        .await
                    }
                }
            }
            BatchMethod::Simulated | BatchMethod::Individual => {
                self.run_sequential_batch(
                    &planned,
                    profile,
                    source_language,
                    target_language,
                    options,
                )
                .await
            }
        };

        self.metrics
            .record_batch(item_count, provider_calls, started.elapsed());
        debug!(
            "Batch {} completed: {} items, {} provider calls, {:?}",
            batch_id,
            item_count,
            provider_calls,
            started.elapsed()
        );
        results
    }

    /// One delimiter-joined provider call for the whole batch
    async fn run_native_batch(
        &self,
        planned: &PlannedBatch,
        profile: &ProviderProfile,
        source_language: &str,
        target_language: &str,
    ) -> Result<(Vec<String>, usize), TranslationError> {
        // A fully cached batch costs no provider call at all
        let cached: Vec<Option<String>> = planned
            .texts
            .iter()
            .map(|t| self.cache.get(t, source_language, target_language, &profile.id))
            .collect();
        if cached.iter().all(Option::is_some) {
            return Ok((cached.into_iter().map(Option::unwrap).collect(), 0));
        }

        let combined = planned
            .combined
            .as_deref()
            .unwrap_or_default();
        let backend = self.backend(&profile.id)?;

        self.limiter.acquire_waiting(&profile.id).await?;
        let translated_combined = backend
            .translate_batch(
                &planned.texts,
                source_language,
                target_language,
                &profile.batch_delimiter,
            )
            .await?;
        debug!(
            "Native batch {}: sent {} chars, received {} chars",
            planned.id,
            combined.len(),
            translated_combined.len()
        );

        let pieces = batch::split_combined(
            &translated_combined,
            &profile.batch_delimiter,
            planned.len(),
        );
        for (text, piece) in planned.texts.iter().zip(&pieces) {
            if !piece.is_empty() {
                self.cache
                    .store(text, source_language, target_language, &profile.id, piece);
            }
        }
        Ok((pieces, 1))
    }

    /// Sequential per-item translation with the provider's inter-item
    /// batch delay between calls; failures degrade to the original text
    async fn run_sequential_batch(
        &self,
        planned: &PlannedBatch,
        profile: &ProviderProfile,
        source_language: &str,
        target_language: &str,
        options: &TranslateOptions,
    ) -> (Vec<String>, usize) {
        let mut results = Vec::with_capacity(planned.len());
        let mut provider_calls = 0usize;

        for (offset, text) in planned.texts.iter().enumerate() {
            if let Some(hit) =
                self.cache.get(text, source_language, target_language, &profile.id)
            {
                results.push(hit);
                continue;
            }

            // The inter-item delay composes with the limiter's mandatory
            // delay; it applies before every provider call after the first.
            if provider_calls > 0 && !profile.batch_delay.is_zero() {
                tokio::time::sleep(profile.batch_delay).await;
            }

            provider_calls += 1;
            let translated = self
                .translate_uncached(&profile.id, text, source_language, target_language, true)
                .await;

            match translated {
                Ok(translated) => results.push(translated),
                Err(err) => {
                    let fallback = if options.allow_retry {
                        self.fallback_for(&profile.id)
                    } else {
                        None
                    };
                    let recovered = match fallback {
                        Some(fallback_id) => {
                            provider_calls += 1;
                            self.translate_uncached(
                                &fallback_id,
                                text,
                                source_language,
                                target_language,
                                true,
                            )
                            .await
                            .ok()
                        }
                        None => None,
                    };
                    match recovered {
                        Some(translated) => results.push(translated),
                        None => {
                            warn!(
                                "Item {} of batch {} failed ({}), returning original text",
                                planned.first_index + offset,
                                planned.id,
                                err
                            );
                            self.metrics.record_degraded_item();
                            results.push(text.clone());
                        }
                    }
                }
            }
        }

        (results, provider_calls)
    }
}
