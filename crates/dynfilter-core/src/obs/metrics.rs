use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// FilterMetrics
/// Ephemeral, in-memory counters for option resolution.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct FilterMetrics {
    // Cache
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_writes: u64,
    pub cache_skipped_disabled: u64,
    pub cache_skipped_no_scope: u64,

    // Resolution
    pub distinct_fallbacks: u64,
    pub resolution_failures: u64,
    pub key_collisions: u64,

    // Access gate
    pub access_suppressed: u64,
    pub access_lookup_failures: u64,

    /// Resolution failures keyed by column key.
    pub failures_by_column: BTreeMap<String, u64>,
}

thread_local! {
    static FILTER_METRICS: RefCell<FilterMetrics> = RefCell::new(FilterMetrics::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&FilterMetrics) -> R) -> R {
    FILTER_METRICS.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut FilterMetrics) -> R) -> R {
    FILTER_METRICS.with(|m| f(&mut m.borrow_mut()))
}

/// Snapshot the current counters.
#[must_use]
pub fn metrics_report() -> FilterMetrics {
    with_state(Clone::clone)
}

/// Reset all counters (useful in tests).
pub fn metrics_reset() {
    with_state_mut(|m| *m = FilterMetrics::default());
}
