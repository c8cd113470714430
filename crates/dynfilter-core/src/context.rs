//! Module: context
//! Responsibility: per-request resolution state (viewer, fingerprint memo,
//! execution-context lookup, event sink).
//! Does not own: authentication or panel routing; both are host concerns
//! reached through `ContextResolver`.
//! Boundary: one `ResolutionContext` per inbound request, dropped at request
//! end. Nothing in it outlives the request.

use crate::{
    cache::{Fingerprint, fingerprint_query},
    obs::EventSink,
    query::{QueryHandle, Queryable},
};
use std::{cell::RefCell, collections::HashMap, fmt, sync::Arc};
use thiserror::Error as ThisError;

///
/// ContextError
///
/// The host could not report the current execution context.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("execution context lookup failed: {0}")]
pub struct ContextError(pub String);

///
/// ContextResolver
///
/// Optional host capability reporting which panel the request runs under.
///

pub trait ContextResolver: Send + Sync {
    /// Whether the host can answer panel lookups at all.
    fn is_available(&self) -> bool {
        true
    }

    /// The current panel identifier, `None` when no panel is active.
    fn current_panel(&self) -> Result<Option<String>, ContextError>;
}

///
/// NoContext
///
/// Default resolver for hosts without panels; access gates never suppress.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NoContext;

impl ContextResolver for NoContext {
    fn is_available(&self) -> bool {
        false
    }

    fn current_panel(&self) -> Result<Option<String>, ContextError> {
        Ok(None)
    }
}

///
/// StaticPanel
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StaticPanel(pub String);

impl StaticPanel {
    #[must_use]
    pub fn new(panel: impl Into<String>) -> Self {
        Self(panel.into())
    }
}

impl ContextResolver for StaticPanel {
    fn current_panel(&self) -> Result<Option<String>, ContextError> {
        Ok(Some(self.0.clone()))
    }
}

///
/// ResolutionContext
///

pub struct ResolutionContext {
    viewer: Option<String>,
    resolver: Arc<dyn ContextResolver>,
    sink: Option<Arc<dyn EventSink>>,
    fingerprints: RefCell<HashMap<QueryHandle, Fingerprint>>,
}

impl ResolutionContext {
    /// Guest context with no panel resolver and the global event sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            viewer: None,
            resolver: Arc::new(NoContext),
            sink: None,
            fingerprints: RefCell::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn for_viewer(viewer: impl Into<String>) -> Self {
        Self::new().with_viewer(viewer)
    }

    #[must_use]
    pub fn with_viewer(mut self, viewer: impl Into<String>) -> Self {
        self.viewer = Some(viewer.into()).filter(|v| !v.is_empty());
        self
    }

    #[must_use]
    pub fn with_context_resolver(mut self, resolver: Arc<dyn ContextResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Authenticated viewer identifier; `None` for guests.
    #[must_use]
    pub fn viewer(&self) -> Option<&str> {
        self.viewer.as_deref()
    }

    #[must_use]
    pub fn context_resolver(&self) -> &dyn ContextResolver {
        self.resolver.as_ref()
    }

    #[must_use]
    pub fn sink(&self) -> Option<&dyn EventSink> {
        self.sink.as_deref()
    }

    /// Fingerprint of `query`, memoized by query handle for this request.
    pub fn fingerprint<Q: Queryable>(&self, query: &Q) -> Fingerprint {
        let handle = query.handle();
        if let Some(fp) = self.fingerprints.borrow().get(&handle) {
            return *fp;
        }

        let fp = fingerprint_query(query);
        self.fingerprints.borrow_mut().insert(handle, fp);

        fp
    }

    #[must_use]
    pub fn memoized_fingerprints(&self) -> usize {
        self.fingerprints.borrow().len()
    }

    /// Drop every memoized fingerprint.
    pub fn clear(&self) {
        self.fingerprints.borrow_mut().clear();
    }
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResolutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("viewer", &self.viewer)
            .field("panel_lookup", &self.resolver.is_available())
            .field("custom_sink", &self.sink.is_some())
            .field("memoized_fingerprints", &self.memoized_fingerprints())
            .finish()
    }
}

///
/// TESTS
///
