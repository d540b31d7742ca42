//! Bounded in-memory TTL cache for extraction and analysis results.
//!
//! Entries expire `ttl` after insertion and are dropped when read past
//! expiry. At capacity, inserting evicts the earliest-inserted entry,
//! expired or not.
//!
//! Misses are not coalesced: two callers missing on the same key at the
//! same time both compute, and the later insert wins.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

/// Default TTL (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default maximum number of entries.
pub const DEFAULT_CAPACITY: usize = 100;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap_or_else(|e| e.into_inner()) += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Deterministic cache key: hex SHA-256 of the operation, text and params.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive a key from an operation name, its input text and parameters.
    ///
    /// Every field is length-prefixed so distinct inputs can't collide by
    /// concatenation; params are hashed in sorted order.
    pub fn derive(operation: &str, text: &str, params: &BTreeMap<String, String>) -> Self {
        let mut hasher = Sha256::new();
        update_field(&mut hasher, operation.as_bytes());
        update_field(&mut hasher, text.as_bytes());
        hasher.update((params.len() as u64).to_le_bytes());
        for (name, value) in params {
            update_field(&mut hasher, name.as_bytes());
            update_field(&mut hasher, value.as_bytes());
        }
        CacheKey(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
    seq: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) >= self.ttl
    }
}

struct Inner<V> {
    entries: HashMap<CacheKey, CacheEntry<V>>,
    /// Insertion sequence -> key, oldest first.
    order: BTreeMap<u64, CacheKey>,
    next_seq: u64,
}

impl<V> Inner<V> {
    fn remove(&mut self, key: &CacheKey) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.seq);
        Some(entry)
    }
}

/// Thread-safe bounded TTL cache.
pub struct ResultCache<V> {
    inner: Mutex<Inner<V>>,
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self::with_clock(ttl, capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: BTreeMap::new(),
                next_seq: 0,
            }),
            ttl,
            capacity,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Look up a live entry. Expired entries are removed.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let now = self.clock.now();
        let mut inner = self.lock();
        let expired = match inner.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            tracing::debug!("Cache entry {} expired", key);
            inner.remove(key);
        }
        None
    }

    /// Store a value with a fresh timestamp, evicting the oldest entry when
    /// full.
    pub fn insert(&self, key: CacheKey, value: V) {
        if self.capacity == 0 {
            return;
        }
        let now = self.clock.now();
        let mut inner = self.lock();
        inner.remove(&key);
        while inner.entries.len() >= self.capacity {
            let Some((_, oldest)) = inner.order.pop_first() else {
                break;
            };
            tracing::debug!("Cache full, evicting {}", oldest);
            inner.entries.remove(&oldest);
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.order.insert(seq, key.clone());
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
                ttl: self.ttl,
                seq,
            },
        );
    }

    /// Return the cached value for `key`, or compute, store and return it.
    ///
    /// `compute` runs without the cache lock held.
    pub fn get_or_compute<F>(&self, key: &CacheKey, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(hit) = self.get(key) {
            tracing::debug!("Cache hit {}", key);
            return hit;
        }
        tracing::debug!("Cache miss {}", key);
        let value = compute();
        self.insert(key.clone(), value.clone());
        value
    }

    /// Like [`get_or_compute`](Self::get_or_compute), but errors are
    /// returned to the caller and not cached.
    pub fn try_get_or_compute<F, E>(&self, key: &CacheKey, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(hit) = self.get(key) {
            tracing::debug!("Cache hit {}", key);
            return Ok(hit);
        }
        tracing::debug!("Cache miss {}", key);
        let value = compute()?;
        self.insert(key.clone(), value.clone());
        Ok(value)
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.lock();
        let expired: Vec<CacheKey> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            inner.remove(key);
        }
        expired.len()
    }
}
