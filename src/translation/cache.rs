/*!
 * Chunk translation cache.
 *
 * Keeps translated chunks in memory so a re-run of a job does not send the
 * same chunk to the engine twice. Entries are keyed by target locale and a
 * SHA-256 digest of the source chunk.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::RwLock;
use log::debug;
use sha2::{Digest, Sha256};

/// Cache key combining target locale and chunk digest
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    /// Target locale as passed by the pipeline
    target_locale: String,

    /// SHA-256 of the source chunk
    digest: [u8; 32],
}

impl CacheKey {
    fn new(chunk: &str, target_locale: &str) -> Self {
        Self {
            target_locale: target_locale.to_string(),
            digest: Sha256::digest(chunk.as_bytes()).into(),
        }
    }

    fn short_hex(&self) -> String {
        self.digest[..4].iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub hit_rate: f64,
}

/// Shared chunk cache; clones share storage and counters
#[derive(Debug, Clone)]
pub struct ChunkCache {
    /// Internal cache storage
    entries: Arc<RwLock<HashMap<CacheKey, String>>>,

    hits: Arc<AtomicUsize>,

    misses: Arc<AtomicUsize>,

    /// Whether caching is enabled
    enabled: bool,
}

impl ChunkCache {
    /// Create a new chunk cache
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(AtomicUsize::new(0)),
            misses: Arc::new(AtomicUsize::new(0)),
            enabled,
        }
    }

    /// Look up the translation of `chunk` into `target_locale`
    pub fn get(&self, chunk: &str, target_locale: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let key = CacheKey::new(chunk, target_locale);
        match self.entries.read().get(&key) {
            Some(translation) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for chunk {} [{}]", key.short_hex(), target_locale);
                Some(translation.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a successful translation
    pub fn store(&self, chunk: &str, target_locale: &str, translation: &str) {
        if !self.enabled {
            return;
        }

        let key = CacheKey::new(chunk, target_locale);
        debug!("Cached chunk {} [{}]", key.short_hex(), target_locale);
        self.entries.write().insert(key, translation.to_string());
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            hits,
            misses,
            hit_rate: if total > 0 { hits as f64 / total as f64 } else { 0.0 },
        }
    }

    /// Drop all entries and reset the counters
    pub fn clear(&self) {
        self.entries.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        debug!("Chunk cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for ChunkCache {
    fn default() -> Self {
        Self::new(true)
    }
}
