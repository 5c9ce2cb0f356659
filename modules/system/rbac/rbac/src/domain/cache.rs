//! Process-wide subject translation cache.
//!
//! Keys are SHA-256 digests of the role registry fingerprint followed by the
//! canonical JSON encoding of the subject, so an entry is only ever returned
//! for byte-identical subject content. Entries expire after the configured
//! TTL and are evicted least-recently-used under capacity pressure.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use moka::policy::EvictionPolicy;
use rbac_sdk::{Subject, Value};
use sha2::{Digest, Sha256};

use crate::config::SubjectCacheConfig;

static GLOBAL: OnceLock<Arc<SubjectCache>> = OnceLock::new();

/// Content-derived cache key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Digest a subject in the context of a registry fingerprint.
    ///
    /// Returns `None` if the subject cannot be encoded; callers then
    /// translate without caching.
    #[must_use]
    pub fn for_subject(registry_fingerprint: &[u8; 32], subject: &Subject) -> Option<Self> {
        let mut hasher = Sha256::new();
        hasher.update(registry_fingerprint);
        match serde_json::to_writer(&mut hasher, subject) {
            Ok(()) => Some(Self(hasher.finalize().into())),
            Err(e) => {
                tracing::warn!(error = %e, subject_id = %subject.id, "subject not encodable, skipping cache");
                None
            }
        }
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", hex::encode(&self.0[..8]))
    }
}

/// Counters reported by [`SubjectCache::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

/// Bounded, TTL-aware cache of translated subjects.
pub struct SubjectCache {
    inner: moka::sync::Cache<CacheKey, Value>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl fmt::Debug for SubjectCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubjectCache")
            .field("entries", &self.inner.entry_count())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}

impl SubjectCache {
    #[must_use]
    pub fn new(cfg: &SubjectCacheConfig) -> Self {
        let inner = moka::sync::Cache::builder()
            .max_capacity(cfg.capacity)
            .time_to_live(cfg.ttl())
            .weigher(|_key: &CacheKey, _value: &Value| 1)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self {
            inner,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The process-wide instance, created with default bounds on first use
    /// unless [`SubjectCache::install_global`] ran earlier.
    #[must_use]
    pub fn global() -> Arc<SubjectCache> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new(&SubjectCacheConfig::default()))))
    }

    /// Create the process-wide instance with the given bounds.
    ///
    /// Returns `false` if it already exists; the existing instance is kept.
    #[must_use]
    pub fn install_global(cfg: &SubjectCacheConfig) -> bool {
        let mut installed = false;
        GLOBAL.get_or_init(|| {
            installed = true;
            Arc::new(Self::new(cfg))
        });
        if !installed {
            tracing::warn!("subject cache already initialized, keeping existing bounds");
        }
        installed
    }

    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        let found = self.inner.get(key);
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn insert(&self, key: CacheKey, value: Value) {
        self.inner.insert(key, value);
    }

    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Apply pending evictions and expirations.
    pub fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks();
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.inner.entry_count(),
        }
    }
}
