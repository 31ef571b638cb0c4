//! Per-call options for [`Cachex::get`](super::Cachex::get)

use std::sync::Arc;

use super::query::Querier;

/// TTL sentinel: bypass the cache entirely for this call.
pub const TTL_BYPASS: i64 = -1;
/// TTL sentinel: ignore the cached value, query fresh, and write back.
pub const TTL_REFRESH: i64 = -2;

/// Options recognised by a single read-through get.
///
/// All knobs chain:
///
/// ```
/// use cachebear::cachex::{GetOptions, QueryFunc};
///
/// let opts = GetOptions::new()
///     .query(QueryFunc::new(|_key: &str| Ok(42i64)))
///     .ttl(300)
///     .add_ttl(-60);
/// ```
#[derive(Clone, Default)]
pub struct GetOptions {
    pub(crate) querier: Option<Arc<dyn Querier>>,
    pub(crate) ttl: i64,
    pub(crate) ttl_delta: i64,
    pub(crate) disable_cache_usage: bool,
    pub(crate) use_fresh_data: bool,
}

impl GetOptions {
    pub fn new() -> Self {
        GetOptions::default()
    }

    /// Override the wrapper's default origin for this call.
    pub fn query(mut self, querier: impl Querier + 'static) -> Self {
        self.querier = Some(Arc::new(querier));
        self
    }

    /// Override the write-back TTL in seconds. `0` keeps the default;
    /// [`TTL_BYPASS`] and [`TTL_REFRESH`] select the corresponding modes.
    pub fn ttl(mut self, ttl: i64) -> Self {
        self.ttl = ttl;
        self
    }

    /// Adjust whatever TTL is in effect — per-call or default — by `delta`
    /// seconds. A negative result is stored as already expired.
    pub fn add_ttl(mut self, delta: i64) -> Self {
        self.ttl_delta += delta;
        self
    }

    /// Skip the cache for this call and go straight to the origin.
    /// Useful during debugging.
    pub fn disable_cache_usage(mut self, disable: bool) -> Self {
        self.disable_cache_usage = disable;
        self
    }

    /// Ignore the cached value, pull fresh data, and write it back.
    pub fn use_fresh_data(mut self, fresh: bool) -> Self {
        self.use_fresh_data = fresh;
        self
    }
}
