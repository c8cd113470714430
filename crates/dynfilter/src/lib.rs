//! ## Crate layout
//! - `core`: the option-resolution engine (values, queries, formatting,
//!   resolution, caching, filter contracts, observability).
//! - `config`: TOML loading for cache settings.
//! - `error`: public error type with a stable kind + origin taxonomy.
//!
//! The `prelude` module mirrors the surface a host needs to declare filters
//! and serve their options.

pub use dynfilter_core as core;
pub use dynfilter_core::{cache, context, filter, format, obs, options, query, resolve, value};

pub mod config;
pub mod error;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{Error, ErrorKind, ErrorOrigin};

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Error,
        core::{
            cache::{CacheManager, CacheScope, CacheSettings, MemoryCacheStore},
            context::{ResolutionContext, StaticPanel},
            filter::{AccessState, DynamicFilter, FilterContract, FilterSpec, SourceOverride},
            format::{FormatOutput, OptionFormatter, OptionKey, ValueLabelMap},
            options::ResolvedOptionSet,
            query::{OptionsSource, Predicate, Queryable as _, RecordSet},
            value::{Date, Record, Timestamp, Value, ValueEnum},
        },
    };
}
