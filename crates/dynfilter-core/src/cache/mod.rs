//! Module: cache
//! Responsibility: scoped read-through caching of resolved option sets.
//! Does not own: the backing store (host supplied) or resolution itself.
//! Boundary: a missing scope key disables caching for that resolution;
//! it never widens to another scope. Failed computations are never written.

mod fingerprint;
mod store;


use crate::{
    CACHE_KEY_PREFIX,
    context::ResolutionContext,
    error::InternalError,
    obs::{self, CacheSkipReason, FilterEvent},
    options::ResolvedOptionSet,
    query::Queryable,
};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::Arc, time::Duration};
use thiserror::Error as ThisError;

// re-exports
pub use fingerprint::{Fingerprint, fingerprint_parts, fingerprint_query};
pub use store::{CacheClearOutcome, CacheStore, Clock, ManualClock, MemoryCacheStore, SystemClock};

///
/// CacheScope
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheScope {
    #[default]
    #[display("user")]
    User,

    #[display("tenant")]
    Tenant,

    #[display("global")]
    Global,
}

///
/// UnknownCacheScope
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("unknown cache scope '{0}' (expected user, tenant, or global)")]
pub struct UnknownCacheScope(pub String);

impl FromStr for CacheScope {
    type Err = UnknownCacheScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "tenant" => Ok(Self::Tenant),
            "global" => Ok(Self::Global),
            _ => Err(UnknownCacheScope(s.to_string())),
        }
    }
}

///
/// CacheSettings
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Seconds; non-positive or absent disables option caching.
    pub cache_ttl: Option<i64>,
    /// Positive caps queried and returned options; otherwise unbounded.
    pub max_options: Option<i64>,
    pub cache_scope: CacheScope,
    /// Static tenant identifier used when no resolver answers.
    pub tenant_key: Option<String>,
}

impl CacheSettings {
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.cache_ttl
            .filter(|secs| *secs > 0)
            .and_then(|secs| u64::try_from(secs).ok())
            .map(Duration::from_secs)
    }

    #[must_use]
    pub fn option_limit(&self) -> Option<usize> {
        self.max_options
            .filter(|n| *n > 0)
            .and_then(|n| usize::try_from(n).ok())
    }
}

///
/// TenantResolver
///
/// Host callback naming the active tenant.
///

pub trait TenantResolver: Send + Sync {
    fn tenant_id(&self) -> Option<String>;
}

impl<F> TenantResolver for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn tenant_id(&self) -> Option<String> {
        self()
    }
}

///
/// ScopeKey
///
/// Caching partition: `user_{id}`, `user_guest`, `tenant_{id}`, or `global`.
/// Identifiers are escaped (`%` → `%25`, `_` → `%5F`) so a scope is never a
/// prefix of another scope.
///

#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
pub struct ScopeKey(String);

impl ScopeKey {
    #[must_use]
    pub fn user(viewer: Option<&str>) -> Self {
        Self(format!("user_{}", escape_segment(viewer.unwrap_or("guest"))))
    }

    #[must_use]
    pub fn tenant(tenant: &str) -> Self {
        Self(format!("tenant_{}", escape_segment(tenant)))
    }

    #[must_use]
    pub fn global() -> Self {
        Self("global".to_string())
    }

    /// Parse an unescaped scope identifier such as `user_4_2` or
    /// `tenant_acme`. Anything else is taken verbatim.
    #[must_use]
    pub fn from_identifier(identifier: &str) -> Self {
        if let Some(viewer) = identifier.strip_prefix("user_") {
            Self::user(Some(viewer))
        } else if let Some(tenant) = identifier.strip_prefix("tenant_") {
            Self::tenant(tenant)
        } else {
            Self(identifier.to_string())
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn escape_segment(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for c in id.chars() {
        match c {
            '%' => out.push_str("%25"),
            '_' => out.push_str("%5F"),
            c => out.push(c),
        }
    }

    out
}

///
/// CacheKey
///
/// Renders as `dynamic_filter_{scope}_{fingerprint}_{column}`.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CacheKey {
    pub scope: ScopeKey,
    pub fingerprint: Fingerprint,
    pub column: String,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{CACHE_KEY_PREFIX}_{}_{}_{}",
            self.scope, self.fingerprint, self.column
        )
    }
}

///
/// CacheManager
///

#[derive(Clone)]
pub struct CacheManager {
    settings: CacheSettings,
    store: Option<Arc<dyn CacheStore>>,
    tenant_resolver: Option<Arc<dyn TenantResolver>>,
}

impl CacheManager {
    #[must_use]
    pub fn new(settings: CacheSettings, store: Arc<dyn CacheStore>) -> Self {
        Self {
            settings,
            store: Some(store),
            tenant_resolver: None,
        }
    }

    /// Manager with no store; every resolution is computed.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            settings: CacheSettings::default(),
            store: None,
            tenant_resolver: None,
        }
    }

    #[must_use]
    pub fn with_tenant_resolver(mut self, resolver: Arc<dyn TenantResolver>) -> Self {
        self.tenant_resolver = Some(resolver);
        self
    }

    #[must_use]
    pub const fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Caching partition for this request, or `None` when tenant scope
    /// has neither a resolver answer nor a static key.
    #[must_use]
    pub fn scope_key(&self, cx: &ResolutionContext) -> Option<ScopeKey> {
        match self.settings.cache_scope {
            CacheScope::User => Some(ScopeKey::user(cx.viewer())),
            CacheScope::Tenant => self
                .tenant_resolver
                .as_ref()
                .and_then(|resolver| resolver.tenant_id())
                .filter(|id| !id.is_empty())
                .or_else(|| self.settings.tenant_key.clone().filter(|k| !k.is_empty()))
                .map(|id| ScopeKey::tenant(&id)),
            CacheScope::Global => Some(ScopeKey::global()),
        }
    }

    #[must_use]
    pub fn key_for<Q: Queryable>(
        &self,
        cx: &ResolutionContext,
        query: &Q,
        column_key: &str,
    ) -> Option<CacheKey> {
        self.scope_key(cx).map(|scope| CacheKey {
            scope,
            fingerprint: cx.fingerprint(query),
            column: column_key.to_string(),
        })
    }

    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<ResolvedOptionSet> {
        self.store.as_ref()?.get(&key.to_string())
    }

    /// Unconditional write; a no-op when caching is disabled.
    pub fn put(&self, key: &CacheKey, value: &ResolvedOptionSet) {
        if let (Some(store), Some(ttl)) = (&self.store, self.settings.ttl()) {
            store.put(&key.to_string(), value, ttl);
        }
    }

    /// Read-through lookup. `compute` runs on a miss or whenever caching is
    /// skipped; an `Err` from it is returned without writing anything.
    pub fn remember<Q, F>(
        &self,
        cx: &ResolutionContext,
        query: &Q,
        column_key: &str,
        compute: F,
    ) -> Result<ResolvedOptionSet, InternalError>
    where
        Q: Queryable,
        F: FnOnce() -> Result<ResolvedOptionSet, InternalError>,
    {
        let (Some(store), Some(ttl)) = (&self.store, self.settings.ttl()) else {
            obs::record(
                cx,
                &FilterEvent::CacheSkipped {
                    column: column_key,
                    reason: CacheSkipReason::Disabled,
                },
            );
            return compute();
        };
        let Some(key) = self.key_for(cx, query, column_key) else {
            obs::record(
                cx,
                &FilterEvent::CacheSkipped {
                    column: column_key,
                    reason: CacheSkipReason::NoScope,
                },
            );
            return compute();
        };

        let key = key.to_string();
        if let Some(hit) = store.get(&key) {
            obs::record(cx, &FilterEvent::CacheHit { column: column_key, key: &key });
            return Ok(hit);
        }
        obs::record(cx, &FilterEvent::CacheMiss { column: column_key, key: &key });

        let value = compute()?;
        store.put(&key, &value, ttl);
        obs::record(cx, &FilterEvent::CacheWrite { column: column_key, key: &key });

        Ok(value)
    }

    /// Purge every entry for `scope` (e.g. `user_42`, `tenant_acme`,
    /// `global`), or every option-cache entry when `None`.
    #[must_use]
    pub fn clear(&self, scope: Option<&str>) -> CacheClearOutcome {
        match scope {
            Some(scope) => self.clear_scope(&ScopeKey::from_identifier(scope)),
            None => self.forget_prefix(&format!("{CACHE_KEY_PREFIX}_")),
        }
    }

    #[must_use]
    pub fn clear_scope(&self, scope: &ScopeKey) -> CacheClearOutcome {
        self.forget_prefix(&format!("{CACHE_KEY_PREFIX}_{scope}_"))
    }

    fn forget_prefix(&self, prefix: &str) -> CacheClearOutcome {
        match &self.store {
            Some(store) => store.forget_prefix(prefix),
            None => CacheClearOutcome::Cleared(0),
        }
    }
}

impl fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheManager")
            .field("settings", &self.settings)
            .field("store", &self.store.is_some())
            .field("tenant_resolver", &self.tenant_resolver.is_some())
            .finish()
    }
}
