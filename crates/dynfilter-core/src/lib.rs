//! Core engine for dynfilter: result-set-driven option resolution, scoped
//! option caching, and the filter contracts that wire them together.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod cache;
pub mod context;
pub mod error;
pub mod extract;
pub mod filter;
pub mod format;
pub mod obs;
pub mod options;
pub mod query;
pub mod resolve;
pub mod value;

///
/// CONSTANTS
///

/// Prefix shared by every option-cache key written by the engine.
pub const CACHE_KEY_PREFIX: &str = "dynamic_filter";

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No stores, sinks, or resolver internals are re-exported here.
///

pub mod prelude {
    pub use crate::{
        context::ResolutionContext,
        filter::{DynamicFilter, FilterContract, FilterSpec},
        options::ResolvedOptionSet,
        query::{OptionsSource, Predicate, Queryable, RecordSet},
        value::{Date, Record, Timestamp, Value, ValueEnum},
    };
}
