use crate::options::ResolvedOptionSet;
use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

///
/// CacheClearOutcome
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CacheClearOutcome {
    /// Number of entries purged.
    Cleared(usize),

    /// The store cannot delete by key prefix.
    Unsupported,
}

///
/// CacheStore
///
/// External key/value store holding resolved option sets.
/// Reads and writes are independent; there is no locking across them.
///

pub trait CacheStore: Send + Sync {
    /// Live entry for `key`; `None` on miss or expiry.
    fn get(&self, key: &str) -> Option<ResolvedOptionSet>;

    /// Unconditional write with a time-to-live.
    fn put(&self, key: &str, value: &ResolvedOptionSet, ttl: Duration);

    /// Purge every entry whose key starts with `prefix`.
    fn forget_prefix(&self, _prefix: &str) -> CacheClearOutcome {
        CacheClearOutcome::Unsupported
    }
}

///
/// Clock
///

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

///
/// SystemClock
///

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

///
/// ManualClock
///
/// Test clock that only moves when told to.
///

#[derive(Debug)]
pub struct ManualClock(Mutex<Instant>);

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self(Mutex::new(Instant::now()))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

///
/// MemoryCacheStore
///
/// Process-local store with per-entry expiry and prefix purge.
/// Expired entries are swept every `SWEEP_INTERVAL` writes.
///

pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, StoredEntry>>,
    clock: Arc<dyn Clock>,
    writes: AtomicUsize,
}

const SWEEP_INTERVAL: usize = 64;

struct StoredEntry {
    value: ResolvedOptionSet,
    // `None` when the TTL overflows the clock; the entry never expires.
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

impl MemoryCacheStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let now = self.clock.now();
        let mut keys: Vec<String> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();

        keys
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryCacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCacheStore")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Option<ResolvedOptionSet> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: &str, value: &ResolvedOptionSet, ttl: Duration) {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let writes = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if writes.is_multiple_of(SWEEP_INTERVAL) {
            entries.retain(|_, entry| entry.is_live(now));
        }

        entries.insert(
            key.to_string(),
            StoredEntry {
                value: value.clone(),
                expires_at: now.checked_add(ttl),
            },
        );
    }

    fn forget_prefix(&self, prefix: &str) -> CacheClearOutcome {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));

        CacheClearOutcome::Cleared(before - entries.len())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> ResolvedOptionSet {
        [("red", "Red"), ("blue", "Blue")].into_iter().collect()
    }

    #[test]
    fn entries_expire_after_ttl() {
        let clock = Arc::new(ManualClock::new());
        let store = MemoryCacheStore::with_clock(clock.clone());

        store.put("k", &colors(), Duration::from_secs(60));
        clock.advance(Duration::from_secs(59));
        assert_eq!(store.get("k"), Some(colors()));

        clock.advance(Duration::from_secs(1));
        assert_eq!(store.get("k"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn writes_sweep_expired_entries_that_are_never_read() {
        let clock = Arc::new(ManualClock::new());
        let store = MemoryCacheStore::with_clock(clock.clone());

        for n in 0..SWEEP_INTERVAL - 1 {
            store.put(&format!("once_{n}"), &colors(), Duration::from_secs(10));
        }
        clock.advance(Duration::from_secs(11));
        store.put("fresh", &colors(), Duration::from_secs(10));

        let stored = store.entries.lock().expect("lock").len();
        assert_eq!(stored, 1);
        assert_eq!(store.keys(), vec!["fresh"]);
    }

    #[test]
    fn forget_prefix_only_removes_matching_keys() {
        let store = MemoryCacheStore::new();
        let ttl = Duration::from_secs(60);
        store.put("dynamic_filter_user_1_a_status:status", &colors(), ttl);
        store.put("dynamic_filter_user_1_b_status:status", &colors(), ttl);
        store.put("dynamic_filter_user_2_a_status:status", &colors(), ttl);

        let outcome = store.forget_prefix("dynamic_filter_user_1_");

        assert_eq!(outcome, CacheClearOutcome::Cleared(2));
        assert_eq!(store.keys(), vec!["dynamic_filter_user_2_a_status:status"]);
    }

    #[test]
    fn stores_without_prefix_purge_report_unsupported() {
        struct NullStore;

        impl CacheStore for NullStore {
            fn get(&self, _key: &str) -> Option<ResolvedOptionSet> {
                None
            }

            fn put(&self, _key: &str, _value: &ResolvedOptionSet, _ttl: Duration) {}
        }

        assert_eq!(
            NullStore.forget_prefix("dynamic_filter_"),
            CacheClearOutcome::Unsupported
        );
    }
}
