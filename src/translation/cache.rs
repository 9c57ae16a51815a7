/*!
 * Translation caching functionality.
 *
 * This module provides a TTL cache for translations to avoid redundant
 * API calls. Entries are keyed by normalized source text, normalized
 * language pair, and provider id. Expiry is lazy on read, with a
 * periodic sweep driven by write volume.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use sha2::{Digest, Sha256};
use tokio::time::Instant;

use crate::language_utils::normalize_language_code;

/// Writes between opportunistic expiry sweeps
const SWEEP_EVERY_STORES: usize = 256;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Cache key combining source text digest, language pair, and provider
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    /// SHA-256 hex digest of the normalized source text
    text_digest: String,

    /// Normalized source language code
    source_language: String,

    /// Normalized target language code
    target_language: String,

    /// Provider that produced the translation
    provider_id: String,
}

impl CacheKey {
    /// Create a new cache key from raw inputs
    fn new(source_text: &str, source_language: &str, target_language: &str, provider_id: &str) -> Self {
        let normalized = WHITESPACE.replace_all(source_text.trim(), " ");
        let digest = Sha256::digest(normalized.as_bytes());
        Self {
            text_digest: format!("{:x}", digest),
            source_language: normalize_language_code(source_language),
            target_language: normalize_language_code(target_language),
            provider_id: provider_id.to_string(),
        }
    }
}

/// A cached translation with its expiry bookkeeping
#[derive(Debug, Clone)]
struct CacheEntry {
    /// The translated text
    translation: String,

    /// When the entry was stored
    inserted_at: Instant,

    /// How long the entry stays valid
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) >= self.ttl
    }
}

/// TTL cache for storing and retrieving translations
pub struct TranslationCache {
    /// Internal cache storage
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,

    /// Cache hit counter
    hits: Arc<RwLock<usize>>,

    /// Cache miss counter
    misses: Arc<RwLock<usize>>,

    /// Writes since the last sweep
    stores_since_sweep: Arc<RwLock<usize>>,

    /// Entry time-to-live
    ttl: Duration,

    /// Whether caching is enabled
    enabled: bool,
}

impl TranslationCache {
    /// Create a new translation cache
    pub fn new(enabled: bool, ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
            stores_since_sweep: Arc::new(RwLock::new(0)),
            ttl,
            enabled,
        }
    }

    /// Get a translation from the cache
    ///
    /// Expired entries are removed on read and count as misses.
    pub fn get(
        &self,
        source_text: &str,
        source_language: &str,
        target_language: &str,
        provider_id: &str,
    ) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let key = CacheKey::new(source_text, source_language, target_language, provider_id);
        let now = Instant::now();

        let hit = {
            let entries = self.entries.read();
            match entries.get(&key) {
                Some(entry) if !entry.is_expired(now) => Some(entry.translation.clone()),
                Some(_) => None,
                None => {
                    *self.misses.write() += 1;
                    debug!(
                        "Cache miss for '{}' ({} -> {}, {})",
                        truncate_text(source_text, 30),
                        source_language,
                        target_language,
                        provider_id
                    );
                    return None;
                }
            }
        };

        match hit {
            Some(translation) => {
                *self.hits.write() += 1;
                debug!(
                    "Cache hit for '{}' ({} -> {}, {})",
                    truncate_text(source_text, 30),
                    source_language,
                    target_language,
                    provider_id
                );
                Some(translation)
            }
            None => {
                // Lazy expiry: drop the stale entry
                self.remove_if_expired(&key);
                *self.misses.write() += 1;
                None
            }
        }
    }

    /// Store a translation in the cache, overwriting any previous entry
    pub fn store(
        &self,
        source_text: &str,
        source_language: &str,
        target_language: &str,
        provider_id: &str,
        translation: &str,
    ) {
        if !self.enabled {
            return;
        }

        let key = CacheKey::new(source_text, source_language, target_language, provider_id);
        self.entries.write().insert(
            key,
            CacheEntry {
                translation: translation.to_string(),
                inserted_at: Instant::now(),
                ttl: self.ttl,
            },
        );

        let due = {
            let mut stores = self.stores_since_sweep.write();
            *stores += 1;
            *stores >= SWEEP_EVERY_STORES
        };
        if due {
            self.sweep();
        }
    }

    /// Remove `key` only if it is still expired under the write lock;
    /// an entry re-stored since the expiry check must survive
    fn remove_if_expired(&self, key: &CacheKey) {
        let mut entries = self.entries.write();
        if entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(Instant::now()))
        {
            entries.remove(key);
        }
    }

    /// Remove every expired entry
    pub fn sweep(&self) {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();
        *self.stores_since_sweep.write() = 0;
        if removed > 0 {
            debug!("Cache sweep removed {} expired entries", removed);
        }
    }

    /// Get cache statistics as (hits, misses, hit rate)
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Clear the cache and its counters
    pub fn clear(&self) {
        self.entries.write().clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;
        *self.stores_since_sweep.write() = 0;
        debug!("Translation cache cleared");
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Check if the cache is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(true, Duration::from_secs(30 * 60))
    }
}

impl Clone for TranslationCache {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            hits: self.hits.clone(),
            misses: self.misses.clone(),
            stores_since_sweep: self.stores_since_sweep.clone(),
            ttl: self.ttl,
            enabled: self.enabled,
        }
    }
}

/// Truncate text to a maximum number of characters with ellipsis,
/// cutting on a char boundary so multibyte text never splits
fn truncate_text(text: &str, max_length: usize) -> String {
    match text.char_indices().nth(max_length) {
        Some((boundary, _)) => format!("{}...", &text[..boundary]),
        None => text.to_string(),
    }
}
