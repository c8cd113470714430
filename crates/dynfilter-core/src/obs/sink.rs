//! Event sink boundary.
//!
//! Resolution logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through FilterEvent and EventSink.
use crate::{
    context::{ContextError, ResolutionContext},
    error::InternalError,
    format::OptionKey,
    obs::metrics,
    query::QueryError,
};
use derive_more::Display;

const TRACE_TARGET: &str = "dynfilter";

///
/// CacheSkipReason
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum CacheSkipReason {
    /// TTL absent or non-positive, or no store configured.
    #[display("disabled")]
    Disabled,

    /// Tenant scope with neither a resolver result nor a static key.
    #[display("no_scope")]
    NoScope,
}

///
/// FilterEvent
///
/// `column` is the column key `{filter}:{predicate_column}` for resolution
/// and cache events; `filter` is the filter name for access events.
///

#[derive(Clone, Copy, Debug)]
pub enum FilterEvent<'a> {
    CacheHit {
        column: &'a str,
        key: &'a str,
    },
    CacheMiss {
        column: &'a str,
        key: &'a str,
    },
    CacheWrite {
        column: &'a str,
        key: &'a str,
    },
    CacheSkipped {
        column: &'a str,
        reason: CacheSkipReason,
    },
    DistinctFallback {
        column: &'a str,
        cause: &'a QueryError,
    },
    ResolutionFailed {
        column: &'a str,
        error: &'a InternalError,
    },
    OptionKeyCollision {
        column: &'a str,
        key: &'a OptionKey,
    },
    AccessSuppressed {
        filter: &'a str,
        panel: Option<&'a str>,
    },
    AccessLookupFailed {
        filter: &'a str,
        error: &'a ContextError,
    },
}

///
/// EventSink
///

pub trait EventSink: Send + Sync {
    fn record(&self, event: &FilterEvent<'_>);
}

///
/// GlobalEventSink
/// Default process-local sink that writes into the thread-local counters.
/// Acts as the concrete sink when the context carries no override.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct GlobalEventSink;

impl EventSink for GlobalEventSink {
    fn record(&self, event: &FilterEvent<'_>) {
        metrics::with_state_mut(|m| match event {
            FilterEvent::CacheHit { .. } => m.cache_hits = m.cache_hits.saturating_add(1),
            FilterEvent::CacheMiss { .. } => m.cache_misses = m.cache_misses.saturating_add(1),
            FilterEvent::CacheWrite { .. } => m.cache_writes = m.cache_writes.saturating_add(1),
            FilterEvent::CacheSkipped { reason, .. } => match reason {
                CacheSkipReason::Disabled => {
                    m.cache_skipped_disabled = m.cache_skipped_disabled.saturating_add(1);
                }
                CacheSkipReason::NoScope => {
                    m.cache_skipped_no_scope = m.cache_skipped_no_scope.saturating_add(1);
                }
            },
            FilterEvent::DistinctFallback { .. } => {
                m.distinct_fallbacks = m.distinct_fallbacks.saturating_add(1);
            }
            FilterEvent::ResolutionFailed { column, .. } => {
                m.resolution_failures = m.resolution_failures.saturating_add(1);
                let entry = m.failures_by_column.entry((*column).to_string()).or_default();
                *entry = entry.saturating_add(1);
            }
            FilterEvent::OptionKeyCollision { .. } => {
                m.key_collisions = m.key_collisions.saturating_add(1);
            }
            FilterEvent::AccessSuppressed { .. } => {
                m.access_suppressed = m.access_suppressed.saturating_add(1);
            }
            FilterEvent::AccessLookupFailed { .. } => {
                m.access_lookup_failures = m.access_lookup_failures.saturating_add(1);
            }
        });
    }
}

pub(crate) const GLOBAL_EVENT_SINK: GlobalEventSink = GlobalEventSink;

/// Record one event: emit it to `tracing`, then hand it to the context's
/// sink, or the global sink when the context carries none.
pub fn record(cx: &ResolutionContext, event: &FilterEvent<'_>) {
    emit_trace(event);

    match cx.sink() {
        Some(sink) => sink.record(event),
        None => GLOBAL_EVENT_SINK.record(event),
    }
}

fn emit_trace(event: &FilterEvent<'_>) {
    match event {
        FilterEvent::ResolutionFailed { column, error } => tracing::warn!(
            target: TRACE_TARGET,
            event_name = "resolution_failed",
            column,
            error = %error.display_with_class(),
            "option resolution failed; serving an empty option set"
        ),
        FilterEvent::OptionKeyCollision { column, key } => tracing::warn!(
            target: TRACE_TARGET,
            event_name = "option_key_collision",
            column,
            key = %key,
            "distinct raw values formatted to the same option key"
        ),
        FilterEvent::AccessLookupFailed { filter, error } => tracing::warn!(
            target: TRACE_TARGET,
            event_name = "access_lookup_failed",
            filter,
            error = %error,
            "execution context lookup failed; filter stays visible"
        ),
        FilterEvent::CacheHit { column, key } => tracing::debug!(
            target: TRACE_TARGET,
            event_name = "cache_hit",
            column,
            key,
            "option cache hit"
        ),
        FilterEvent::CacheMiss { column, key } => tracing::debug!(
            target: TRACE_TARGET,
            event_name = "cache_miss",
            column,
            key,
            "option cache miss"
        ),
        FilterEvent::CacheWrite { column, key } => tracing::debug!(
            target: TRACE_TARGET,
            event_name = "cache_write",
            column,
            key,
            "option cache write"
        ),
        FilterEvent::CacheSkipped { column, reason } => tracing::debug!(
            target: TRACE_TARGET,
            event_name = "cache_skipped",
            column,
            reason = %reason,
            "option cache skipped"
        ),
        FilterEvent::DistinctFallback { column, cause } => tracing::debug!(
            target: TRACE_TARGET,
            event_name = "distinct_fallback",
            column,
            cause = %cause,
            "distinct query failed; materializing base query"
        ),
        FilterEvent::AccessSuppressed { filter, panel } => tracing::debug!(
            target: TRACE_TARGET,
            event_name = "access_suppressed",
            filter,
            panel = panel.unwrap_or("<none>"),
            "filter suppressed outside its panels"
        ),
    }
}

///
/// TESTS
///
