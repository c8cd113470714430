//! Observability: resolution events, the sink boundary, and process-local
//! counters.
//!
//! Engine logic never touches `metrics` directly; every recordable event
//! flows through `record` and the `EventSink` chosen by the resolution
//! context.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{FilterMetrics, metrics_report, metrics_reset};
pub use sink::{CacheSkipReason, EventSink, FilterEvent, GlobalEventSink, record};
