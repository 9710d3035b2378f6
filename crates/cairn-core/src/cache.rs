//! In-memory TTL + LRU cache with file-mtime validation.
//!
//! Entries remember the modification time of the document they were read
//! from. A cached value is only trusted while that recorded mtime is at least
//! the document's current mtime, so a file restored from backup or edited
//! outside the service is re-read instead of served stale. Entries also
//! expire after a period without access and the least recently used entry is
//! evicted when the cache is full.
//!
//! The cache has its own lock, independent from the service's mutation lock.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant, SystemTime};

use log::debug;
use lru::LruCache;
use serde::Serialize;

/// Default number of cached entries.
pub const DEFAULT_CAPACITY: usize = 128;

/// Default time an entry survives without being accessed.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Hit, miss and eviction counters plus current occupancy.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// `hits / (hits + misses)`, or 0.0 before any lookup
    pub hit_rate: f64,
    pub size: usize,
    pub capacity: usize,
}

#[derive(Debug)]
struct Entry<V> {
    data: V,
    recorded_mtime: SystemTime,
    last_access: Instant,
    access_count: u64,
}

struct State<V> {
    entries: LruCache<String, Entry<V>>,
    hits: u64,
    misses: u64,
    evictions: u64,
    /// Bumped by every invalidation
    generation: u64,
}

/// Bounded cache of values keyed by entity id.
pub struct Cache<V> {
    state: Mutex<State<V>>,
    ttl: Duration,
}

impl<V: Clone> Cache<V> {
    /// Creates a cache holding at most `capacity` entries (minimum one) that
    /// expire after `ttl` without access.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Mutex::new(State {
                entries: LruCache::new(capacity),
                hits: 0,
                misses: 0,
                evictions: 0,
                generation: 0,
            }),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &Entry<V>, now: Instant) -> bool {
        now.duration_since(entry.last_access) > self.ttl
    }

    /// Returns the cached value for `id`.
    ///
    /// An entry idle for longer than the TTL is evicted and reported as a
    /// miss.
    pub fn get(&self, id: &str) -> Option<V> {
        self.lookup(id, None)
    }

    /// Returns the cached value only if it is still valid for a document
    /// whose current mtime is `current_mtime`.
    ///
    /// A stale entry is dropped and counted as a miss.
    pub fn get_validated(&self, id: &str, current_mtime: SystemTime) -> Option<V> {
        self.lookup(id, Some(current_mtime))
    }

    fn lookup(&self, id: &str, current_mtime: Option<SystemTime>) -> Option<V> {
        let now = Instant::now();
        let mut state = self.lock();

        let checked = state.entries.peek(id).map(|entry| {
            (
                self.is_expired(entry, now),
                current_mtime.is_some_and(|m| entry.recorded_mtime < m),
            )
        });
        let Some((expired, stale)) = checked else {
            state.misses += 1;
            return None;
        };
        if expired {
            state.entries.pop(id);
            state.evictions += 1;
            state.misses += 1;
            debug!("Cache entry '{id}' expired");
            return None;
        }
        if stale {
            state.entries.pop(id);
            state.misses += 1;
            debug!("Cache entry '{id}' is stale");
            return None;
        }

        state.hits += 1;
        let entry = state.entries.get_mut(id)?;
        entry.last_access = now;
        entry.access_count += 1;
        Some(entry.data.clone())
    }

    /// Inserts or refreshes the entry for `id`, evicting the least recently
    /// used entry if the cache is full.
    pub fn put(&self, id: &str, data: V, mtime: SystemTime) {
        self.insert_locked(id, data, mtime, None);
    }

    fn insert_locked(
        &self,
        id: &str,
        data: V,
        mtime: SystemTime,
        generation: Option<u64>,
    ) -> bool {
        let now = Instant::now();
        let mut state = self.lock();
        if generation.is_some_and(|g| g != state.generation) {
            return false;
        }

        let access_count = state.entries.peek(id).map_or(0, |e| e.access_count);
        let displaced = state.entries.push(
            id.to_string(),
            Entry {
                data,
                recorded_mtime: mtime,
                last_access: now,
                access_count,
            },
        );
        if let Some((lru, _)) = displaced {
            if lru != id {
                state.evictions += 1;
                debug!("Evicted least recently used cache entry '{lru}'");
            }
        }
        true
    }

    /// Inserts the entry only if no invalidation happened since
    /// `generation` was read.
    ///
    /// Readers take the generation before reading a document so that a copy
    /// read concurrently with a write is never cached after that write
    /// invalidated the id. Returns whether the entry was stored.
    pub fn put_if_current(&self, id: &str, data: V, mtime: SystemTime, generation: u64) -> bool {
        self.insert_locked(id, data, mtime, Some(generation))
    }

    /// Current invalidation generation.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Removes the entry for `id`.
    pub fn invalidate(&self, id: &str) {
        let mut state = self.lock();
        state.entries.pop(id);
        state.generation += 1;
    }

    /// Removes every entry; counters are kept.
    pub fn invalidate_all(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.generation += 1;
    }

    /// Whether an unexpired entry for `id` exists and was recorded from a
    /// document at least as new as `current_mtime`.
    ///
    /// Does not count as an access.
    pub fn is_valid(&self, id: &str, current_mtime: SystemTime) -> bool {
        let now = Instant::now();
        let state = self.lock();
        state.entries.peek(id).is_some_and(|entry| {
            !self.is_expired(entry, now) && entry.recorded_mtime >= current_mtime
        })
    }

    /// Number of times the entry for `id` has been served.
    pub fn access_count(&self, id: &str) -> Option<u64> {
        self.lock().entries.peek(id).map(|e| e.access_count)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the counters.
    pub fn statistics(&self) -> CacheStatistics {
        let state = self.lock();
        let lookups = state.hits + state.misses;
        CacheStatistics {
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                state.hits as f64 / lookups as f64
            },
            size: state.entries.len(),
            capacity: state.entries.cap().get(),
        }
    }
}
