use crate::{
    cache::CacheManager,
    context::ResolutionContext,
    error::InternalError,
    filter::{FilterSpec, SelectionArity},
    format::{format_option, label_of, label_text},
    obs::{self, FilterEvent},
    options::ResolvedOptionSet,
    query::Queryable,
    resolve::{DistinctRequest, resolve_distinct},
    value::Value,
};

///
/// AccessState
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AccessState {
    Active,
    /// Outside the declared panels: hidden, identity query, no options.
    Suppressed,
}

///
/// FilterContract
///
/// Per-request view of a declaration: options and search providers, query
/// mutation, label lookup, and the active-filter indicator.
///
/// Resolution errors never escape; they are recorded and served as an
/// empty option set.
///

#[derive(Debug)]
pub struct FilterContract<'a, Q> {
    spec: &'a FilterSpec<Q>,
    cx: &'a ResolutionContext,
    cache: &'a CacheManager,
    access: AccessState,
}

impl<Q: Queryable> FilterSpec<Q> {
    /// Run the access gate and bind this declaration to one request.
    #[must_use]
    pub fn contract<'a>(
        &'a self,
        cx: &'a ResolutionContext,
        cache: &'a CacheManager,
    ) -> FilterContract<'a, Q> {
        FilterContract::new(self, cx, cache)
    }
}

impl<'a, Q: Queryable> FilterContract<'a, Q> {
    #[must_use]
    pub fn new(spec: &'a FilterSpec<Q>, cx: &'a ResolutionContext, cache: &'a CacheManager) -> Self {
        let access = check_access(spec, cx);

        Self {
            spec,
            cx,
            cache,
            access,
        }
    }

    #[must_use]
    pub const fn spec(&self) -> &FilterSpec<Q> {
        self.spec
    }

    #[must_use]
    pub const fn access(&self) -> AccessState {
        self.access
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.spec.name()
    }

    #[must_use]
    pub fn label(&self) -> &str {
        self.spec.label()
    }

    #[must_use]
    pub fn placeholder(&self) -> &str {
        self.spec.placeholder()
    }

    #[must_use]
    pub const fn is_hidden(&self) -> bool {
        matches!(self.access, AccessState::Suppressed)
    }

    #[must_use]
    pub const fn is_searchable(&self) -> bool {
        !self.is_hidden() && self.spec.is_searchable()
    }

    #[must_use]
    pub const fn is_lazy(&self) -> bool {
        !self.is_hidden() && self.spec.is_lazy()
    }

    #[must_use]
    pub fn is_multiple(&self) -> bool {
        self.spec.arity() == SelectionArity::Multiple
    }

    /// Initial option set. Lazy filters start empty and fill via `search`.
    #[must_use]
    pub fn options(&self, base: &Q) -> ResolvedOptionSet {
        if self.is_hidden() || self.spec.is_lazy() {
            return ResolvedOptionSet::new();
        }

        let column_key = self.spec.column_key();
        let result = self.cache.remember(self.cx, base, &column_key, || {
            self.resolve(base, None, &column_key)
        });

        self.absorb(&column_key, result)
    }

    /// Options matching `term`, resolved uncached. A blank term yields the
    /// initial option set.
    #[must_use]
    pub fn search(&self, base: &Q, term: &str) -> ResolvedOptionSet {
        if self.is_hidden() {
            return ResolvedOptionSet::new();
        }

        let term = term.trim();
        if term.is_empty() {
            return self.options(base);
        }

        let column_key = self.spec.column_key();
        let result = self.resolve(base, Some(term), &column_key);

        self.absorb(&column_key, result)
    }

    /// Label for a previously selected raw value, without fetching options.
    #[must_use]
    pub fn label_for_key(&self, key: &Value) -> Option<String> {
        if self.is_hidden() || key.is_blank() {
            return None;
        }

        match label_of(key, self.spec.options_map(), self.spec.formatter()) {
            Ok(label) => Some(label),
            Err(err) => {
                let column_key = self.spec.column_key();
                obs::record(
                    self.cx,
                    &FilterEvent::ResolutionFailed {
                        column: &column_key,
                        error: &err,
                    },
                );
                None
            }
        }
    }

    /// Narrow `query` by the submitted value. Suppressed filters and
    /// absent or malformed input leave it unchanged.
    #[must_use]
    pub fn apply(&self, query: Q, input: &Value) -> Q {
        if self.is_hidden() {
            return query;
        }

        self.spec.apply_to(query, input)
    }

    /// Active-filter description: `{label}: {value}` or
    /// `{label}: {v1}, {v2}`; `None` when the filter does not apply.
    #[must_use]
    pub fn indicator(&self, input: &Value) -> Option<String> {
        if self.is_hidden() {
            return None;
        }
        self.spec.predicate_for(input)?;

        let shown = match input {
            Value::List(items) => items
                .iter()
                .filter(|v| !v.is_blank())
                .map(|v| self.display(v))
                .collect::<Vec<_>>()
                .join(", "),
            value => self.display(value),
        };

        Some(format!("{}: {shown}", self.spec.label()))
    }

    fn display(&self, value: &Value) -> String {
        label_of(value, self.spec.options_map(), self.spec.formatter())
            .unwrap_or_else(|_| value.text_projection())
    }

    fn resolve(
        &self,
        base: &Q,
        search: Option<&str>,
        column_key: &str,
    ) -> Result<ResolvedOptionSet, InternalError> {
        let source = self.spec.options_source(base)?;
        let request = DistinctRequest::new(self.spec.extract_column(), self.spec.predicate_column())
            .with_limit(self.cache.settings().option_limit())
            .with_search(search);

        let outcome = resolve_distinct(&source, &request)?;
        if let Some(cause) = &outcome.fallback_cause {
            obs::record(
                self.cx,
                &FilterEvent::DistinctFallback {
                    column: column_key,
                    cause,
                },
            );
        }

        let mut set = ResolvedOptionSet::new();
        for value in &outcome.values {
            let entry = format_option(value, self.spec.options_map(), self.spec.formatter())?;
            let label = label_text(&entry.label)?;

            // Later label wins; the key keeps its first position.
            if set.contains_key(&entry.key) {
                obs::record(
                    self.cx,
                    &FilterEvent::OptionKeyCollision {
                        column: column_key,
                        key: &entry.key,
                    },
                );
            }
            set.insert(entry.key, label);
        }

        Ok(set)
    }

    fn absorb(
        &self,
        column_key: &str,
        result: Result<ResolvedOptionSet, InternalError>,
    ) -> ResolvedOptionSet {
        result.unwrap_or_else(|err| {
            obs::record(
                self.cx,
                &FilterEvent::ResolutionFailed {
                    column: column_key,
                    error: &err,
                },
            );
            ResolvedOptionSet::new()
        })
    }
}

// Fail open: only a positive lookup naming another panel (or no panel)
// suppresses the filter.
fn check_access<Q>(spec: &FilterSpec<Q>, cx: &ResolutionContext) -> AccessState
where
    Q: Queryable,
{
    let Some(panels) = spec.access_panels().filter(|panels| !panels.is_empty()) else {
        return AccessState::Active;
    };
    let resolver = cx.context_resolver();
    if !resolver.is_available() {
        return AccessState::Active;
    }

    match resolver.current_panel() {
        Ok(Some(panel)) if panels.contains(&panel) => AccessState::Active,
        Ok(panel) => {
            obs::record(
                cx,
                &FilterEvent::AccessSuppressed {
                    filter: spec.name(),
                    panel: panel.as_deref(),
                },
            );
            AccessState::Suppressed
        }
        Err(err) => {
            obs::record(
                cx,
                &FilterEvent::AccessLookupFailed {
                    filter: spec.name(),
                    error: &err,
                },
            );
            AccessState::Active
        }
    }
}
