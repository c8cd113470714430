//! Cache settings loaded from TOML.
//!
//! Settings live under a `[dynamic_filter]` table; other tables are
//! ignored so the section can share a host's config file. The tenant
//! resolver is a runtime callback and is never read from config.

use dynfilter_core::cache::{CacheScope, CacheSettings, UnknownCacheScope};
use serde::Deserialize;
use std::{fs, io, path::Path};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io { path: String, source: io::Error },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    InvalidScope(#[from] UnknownCacheScope),
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    dynamic_filter: RawSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSettings {
    cache_ttl: Option<i64>,
    max_options: Option<i64>,
    cache_scope: Option<String>,
    tenant_key: Option<String>,
}

impl TryFrom<RawSettings> for CacheSettings {
    type Error = ConfigError;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        let cache_scope = match raw.cache_scope.as_deref() {
            Some(scope) => scope.parse::<CacheScope>()?,
            None => CacheScope::default(),
        };

        Ok(Self {
            cache_ttl: raw.cache_ttl,
            max_options: raw.max_options,
            cache_scope,
            tenant_key: raw.tenant_key,
        })
    }
}

/// Parse settings from TOML text. A missing `[dynamic_filter]` table yields
/// the defaults (caching disabled, unbounded, user scope).
pub fn load_str(text: &str) -> Result<CacheSettings, ConfigError> {
    let file: ConfigFile = toml::from_str(text)?;

    file.dynamic_filter.try_into()
}

/// Read and parse a TOML file.
pub fn load_path(path: impl AsRef<Path>) -> Result<CacheSettings, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    load_str(&text)
}
