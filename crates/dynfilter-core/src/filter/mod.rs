//! Module: filter
//! Responsibility: filter declarations and the contracts that wire
//! extraction, formatting, resolution, and caching together.
//! Does not own: widget rendering or form handling (host concerns).
//! Boundary: a declaration is immutable once built; contracts are rebuilt
//! per request from a declaration plus a `ResolutionContext`.

mod apply;
mod contract;

#[cfg(test)]
mod tests;

use crate::{
    error::InternalError,
    format::{OptionFormatter, ValueLabelMap},
    query::{OptionsSource, Queryable},
};
use convert_case::{Case, Casing};
use std::{fmt, sync::Arc};
use thiserror::Error as ThisError;

// re-exports
pub use contract::{AccessState, FilterContract};

const SINGLE_PLACEHOLDER: &str = "Select an option";
const MULTIPLE_PLACEHOLDER: &str = "Select options";

///
/// FilterSpecError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum FilterSpecError {
    #[error("filter name must not be empty")]
    EmptyName,

    #[error("filter '{0}' is lazy but not searchable")]
    LazyRequiresSearchable(String),

    #[error("filter '{0}' needs a relationship name and column")]
    EmptyRelationship(String),
}

///
/// SelectionArity
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SelectionArity {
    #[default]
    Single,
    Multiple,
}

///
/// FilterShape
///
/// `Column` filters the base table directly. `Relationship` filters through
/// `exists (relation where column ...)` and reads options from the related
/// entity.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FilterShape {
    Column { query_column: String },
    Relationship { relation: String, column: String },
}

type SourceFn<Q> = dyn Fn(&Q) -> Result<OptionsSource<Q>, InternalError> + Send + Sync;

///
/// SourceOverride
///
/// Supplies the options source from the base query, decoupling option
/// values from the predicate's base query.
///

pub struct SourceOverride<Q>(Arc<SourceFn<Q>>);

impl<Q> SourceOverride<Q> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Q) -> Result<OptionsSource<Q>, InternalError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, base: &Q) -> Result<OptionsSource<Q>, InternalError> {
        (self.0)(base)
    }
}

impl<Q> Clone for SourceOverride<Q> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<Q> fmt::Debug for SourceOverride<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SourceOverride(..)")
    }
}

///
/// FilterSpec
///
/// Immutable filter declaration, produced by `DynamicFilter::build`.
///

#[derive(Clone, Debug)]
pub struct FilterSpec<Q> {
    name: String,
    label: String,
    placeholder: String,
    display_path: String,
    shape: FilterShape,
    arity: SelectionArity,
    searchable: bool,
    lazy: bool,
    access_panels: Option<Vec<String>>,
    options_map: Option<ValueLabelMap>,
    formatter: Option<OptionFormatter>,
    source_override: Option<SourceOverride<Q>>,
}

impl<Q: Queryable> FilterSpec<Q> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    #[must_use]
    pub fn display_path(&self) -> &str {
        &self.display_path
    }

    #[must_use]
    pub const fn shape(&self) -> &FilterShape {
        &self.shape
    }

    #[must_use]
    pub const fn arity(&self) -> SelectionArity {
        self.arity
    }

    #[must_use]
    pub const fn is_searchable(&self) -> bool {
        self.searchable
    }

    #[must_use]
    pub const fn is_lazy(&self) -> bool {
        self.lazy
    }

    #[must_use]
    pub fn access_panels(&self) -> Option<&[String]> {
        self.access_panels.as_deref()
    }

    #[must_use]
    pub const fn options_map(&self) -> Option<&ValueLabelMap> {
        self.options_map.as_ref()
    }

    #[must_use]
    pub const fn formatter(&self) -> Option<&OptionFormatter> {
        self.formatter.as_ref()
    }

    /// Store column the predicate and the distinct query target.
    #[must_use]
    pub fn predicate_column(&self) -> &str {
        match &self.shape {
            FilterShape::Column { query_column } => query_column,
            FilterShape::Relationship { column, .. } => column,
        }
    }

    /// Path read from materialized rows when the distinct query falls back.
    #[must_use]
    pub fn extract_column(&self) -> &str {
        match &self.shape {
            FilterShape::Column { .. } => &self.display_path,
            FilterShape::Relationship { column, .. } => column,
        }
    }

    /// Cache column key: `{name}:{predicate_column}`.
    #[must_use]
    pub fn column_key(&self) -> String {
        format!("{}:{}", self.name, self.predicate_column())
    }

    /// Options source for `base`: the override when declared, otherwise
    /// the base query itself or, for relationships, the related entity's
    /// own unscoped query.
    pub fn options_source(&self, base: &Q) -> Result<OptionsSource<Q>, InternalError> {
        if let Some(source) = &self.source_override {
            return source.call(base);
        }

        match &self.shape {
            FilterShape::Column { .. } => Ok(OptionsSource::Query(base.clone())),
            FilterShape::Relationship { relation, .. } => {
                Ok(OptionsSource::Query(base.related(relation)?))
            }
        }
    }
}

///
/// DynamicFilter
///
/// Declaration builder. `single`, `multiple`, and `relationship` choose the
/// shape; everything else is optional.
///

#[derive(Clone, Debug)]
pub struct DynamicFilter<Q> {
    name: String,
    shape: FilterShape,
    arity: SelectionArity,
    display_path: Option<String>,
    query_column: Option<String>,
    label: Option<String>,
    placeholder: Option<String>,
    searchable: bool,
    lazy: bool,
    access_panels: Option<Vec<String>>,
    options_map: Option<ValueLabelMap>,
    formatter: Option<OptionFormatter>,
    source_override: Option<SourceOverride<Q>>,
}

impl<Q: Queryable> DynamicFilter<Q> {
    fn with_shape(name: impl Into<String>, shape: FilterShape, arity: SelectionArity) -> Self {
        Self {
            name: name.into(),
            shape,
            arity,
            display_path: None,
            query_column: None,
            label: None,
            placeholder: None,
            searchable: false,
            lazy: false,
            access_panels: None,
            options_map: None,
            formatter: None,
            source_override: None,
        }
    }

    /// Single-value filter on a base-table column.
    #[must_use]
    pub fn single(name: impl Into<String>) -> Self {
        Self::with_shape(
            name,
            FilterShape::Column {
                query_column: String::new(),
            },
            SelectionArity::Single,
        )
    }

    /// Multi-value filter on a base-table column.
    #[must_use]
    pub fn multiple(name: impl Into<String>) -> Self {
        Self::with_shape(
            name,
            FilterShape::Column {
                query_column: String::new(),
            },
            SelectionArity::Multiple,
        )
    }

    /// Filter through `relation`, matching on the related entity's `column`.
    #[must_use]
    pub fn relationship(
        name: impl Into<String>,
        relation: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self::with_shape(
            name,
            FilterShape::Relationship {
                relation: relation.into(),
                column: column.into(),
            },
            SelectionArity::Single,
        )
    }

    /// Dot path used to read the value from result rows; defaults to the name.
    #[must_use]
    pub fn display_path(mut self, path: impl Into<String>) -> Self {
        self.display_path = Some(path.into());
        self
    }

    /// Predicate column; defaults to the display path. Ignored for
    /// relationship filters.
    #[must_use]
    pub fn query_column(mut self, column: impl Into<String>) -> Self {
        self.query_column = Some(column.into());
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    #[must_use]
    pub const fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    /// Defer option loading until a search term arrives. Requires
    /// `searchable(true)`.
    #[must_use]
    pub const fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// Allow several values on a relationship filter.
    #[must_use]
    pub const fn multiple_values(mut self, multiple: bool) -> Self {
        self.arity = if multiple {
            SelectionArity::Multiple
        } else {
            SelectionArity::Single
        };
        self
    }

    /// Restrict the filter to these panels; it is inert everywhere else.
    #[must_use]
    pub fn access_panels<I, S>(mut self, panels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.access_panels = Some(panels.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn options_map(mut self, map: ValueLabelMap) -> Self {
        self.options_map = Some(map);
        self
    }

    #[must_use]
    pub fn format_option(mut self, formatter: OptionFormatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    #[must_use]
    pub fn options_source(mut self, source: SourceOverride<Q>) -> Self {
        self.source_override = Some(source);
        self
    }

    /// Validate and freeze the declaration.
    pub fn build(self) -> Result<FilterSpec<Q>, FilterSpecError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(FilterSpecError::EmptyName);
        }
        if self.lazy && !self.searchable {
            return Err(FilterSpecError::LazyRequiresSearchable(name));
        }

        let display_path = self
            .display_path
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| name.clone());

        let shape = match self.shape {
            FilterShape::Column { .. } => FilterShape::Column {
                query_column: self
                    .query_column
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| display_path.clone()),
            },
            FilterShape::Relationship { relation, column } => {
                if relation.is_empty() || column.is_empty() {
                    return Err(FilterSpecError::EmptyRelationship(name));
                }
                FilterShape::Relationship { relation, column }
            }
        };

        let label = self
            .label
            .unwrap_or_else(|| name.to_case(Case::Title));
        let placeholder = self.placeholder.unwrap_or_else(|| {
            match self.arity {
                SelectionArity::Single => SINGLE_PLACEHOLDER,
                SelectionArity::Multiple => MULTIPLE_PLACEHOLDER,
            }
            .to_string()
        });

        Ok(FilterSpec {
            name,
            label,
            placeholder,
            display_path,
            shape,
            arity: self.arity,
            searchable: self.searchable,
            lazy: self.lazy,
            access_panels: self.access_panels,
            options_map: self.options_map,
            formatter: self.formatter,
            source_override: self.source_override,
        })
    }
}
