//! Single-flight read-through caching
//!
//! [`Cachex`] layers on top of any started [`Cache`]: it serves hits from
//! the backend, coalesces concurrent misses for the same key into exactly
//! one origin query, writes successful answers back with a configurable
//! TTL, and can hand out the last stale value when the origin fails.
//!
//! The wrapper holds a shared, non-owning handle on the cache: dropping the
//! wrapper never closes the backend.

pub mod options;
pub mod query;
mod sentinel;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::errors::{CacheError, Result};
use crate::cache::facade::Cache;
use crate::cache::item::ValueKind;

pub use options::{GetOptions, TTL_BYPASS, TTL_REFRESH};
pub use query::{Querier, QueryFunc};
use sentinel::Sentinel;

/// Default write-back TTL: effectively "keep until replaced".
pub const DEFAULT_TTL: i64 = 86400 * 10 * 366;

/// Read-through wrapper with per-key request coalescing.
pub struct Cachex {
    storage: Arc<Cache>,
    querier: Option<Arc<dyn Querier>>,
    use_stale: bool,
    default_ttl: i64,
    flights: Mutex<HashMap<String, Arc<Sentinel>>>,
}

impl Cachex {
    /// Wrap a started cache. Without a default querier, every get must
    /// carry its own [`GetOptions::query`].
    pub fn new(storage: Arc<Cache>) -> Self {
        Cachex {
            storage,
            querier: None,
            use_stale: false,
            default_ttl: DEFAULT_TTL,
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Install the default origin consulted when a get carries no override.
    pub fn with_querier(mut self, querier: impl Querier + 'static) -> Self {
        self.querier = Some(Arc::new(querier));
        self
    }

    /// Change the default write-back TTL in seconds.
    pub fn with_default_ttl(mut self, ttl: i64) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Serve the last expired value when the origin fails. The stale value
    /// is written into the destination and the origin error is still
    /// returned, so callers can tell the difference. Off by default.
    pub fn use_stale_when_error(mut self, use_stale: bool) -> Self {
        self.use_stale = use_stale;
        self
    }

    /// The wrapped cache.
    pub fn storage(&self) -> &Arc<Cache> {
        &self.storage
    }

    /// Read `key` into `dest`, consulting the origin on a miss.
    ///
    /// Concurrent callers missing on the same key share one origin query;
    /// every caller ends up with its own copy of the produced value.
    pub fn get<T>(&self, key: &str, dest: &mut T, options: GetOptions) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut options = options;
        match options.ttl {
            TTL_BYPASS => {
                options.disable_cache_usage = true;
                options.ttl = 0;
            }
            TTL_REFRESH => {
                options.use_fresh_data = true;
                options.ttl = 0;
            }
            _ => {}
        }
        let querier = options.querier.take().or_else(|| self.querier.clone());
        let base = if options.ttl != 0 {
            options.ttl
        } else {
            self.default_ttl
        };
        let ttl = base + options.ttl_delta;
        let codec = self.storage.codec();

        if options.disable_cache_usage {
            let querier = querier.ok_or(CacheError::NotFound)?;
            let bytes = querier.query(key, codec)?;
            *dest = codec.unmarshal(&bytes)?;
            return Ok(());
        }

        if options.use_fresh_data {
            let querier = querier.ok_or(CacheError::NotFound)?;
            let bytes = querier.query(key, codec)?;
            let value: T = codec.unmarshal(&bytes)?;
            self.storage
                .put_raw(key, bytes, ttl, ValueKind::probe(&value))?;
            *dest = value;
            return Ok(());
        }

        match self.storage.fetch(key) {
            Ok(item) if !item.has_expired() => {
                *dest = codec.unmarshal(&item.value)?;
                return Ok(());
            }
            // Expired or missing: coalesce with other callers below. The
            // expired record stays put so its payload is still available as
            // a stale value inside the barrier.
            Ok(_) | Err(CacheError::NotFound) => {}
            Err(e) => return Err(e),
        }

        let querier = querier.ok_or(CacheError::NotFound)?;
        self.coalesce(key, dest, querier.as_ref(), ttl)
    }

    /// Write through to the backend.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: i64) -> Result<()> {
        self.storage.put(key, value, ttl)
    }

    /// Delete each key, stopping at the first backend failure.
    pub fn delete(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.storage.delete(key)?;
        }
        Ok(())
    }

    fn remove_flight(&self, key: &str) {
        self.flights
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    fn coalesce<T>(&self, key: &str, dest: &mut T, querier: &dyn Querier, ttl: i64) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        let codec = self.storage.codec();

        let (sentinel, is_producer) = {
            let mut flights = self.flights.lock().unwrap_or_else(PoisonError::into_inner);
            match flights.get(key) {
                Some(existing) => (Arc::clone(existing), false),
                None => {
                    let fresh = Arc::new(Sentinel::new());
                    flights.insert(key.to_string(), Arc::clone(&fresh));
                    (fresh, true)
                }
            }
        };

        if !is_producer {
            let bytes = sentinel.wait()?;
            *dest = codec.unmarshal(&bytes)?;
            return Ok(());
        }

        // Producer path. The guard completes the sentinel and clears the
        // in-flight entry on every exit, including unwinds, so waiters can
        // never be stranded.
        let guard = FlightGuard {
            cachex: self,
            key,
            sentinel: &sentinel,
            done: false,
        };

        enum Produced {
            Hit(Vec<u8>),
            Fresh(Vec<u8>),
            Failed(CacheError, Option<Vec<u8>>),
        }

        // Double-check the cache now that we own the flight: another caller
        // may have populated the key between our miss and here.
        let produced = match self.storage.fetch(key) {
            Ok(item) if !item.has_expired() => Produced::Hit(item.value),
            Ok(item) => match querier.query(key, codec) {
                Ok(bytes) => Produced::Fresh(bytes),
                Err(e) => Produced::Failed(e, Some(item.value)),
            },
            Err(CacheError::NotFound) => match querier.query(key, codec) {
                Ok(bytes) => Produced::Fresh(bytes),
                Err(e) => Produced::Failed(e, None),
            },
            Err(e) => Produced::Failed(e, None),
        };

        match produced {
            Produced::Hit(bytes) => {
                guard.finish(Ok(bytes.clone()));
                *dest = codec.unmarshal(&bytes)?;
                Ok(())
            }
            Produced::Fresh(bytes) => {
                let value: T = match codec.unmarshal(&bytes) {
                    Ok(value) => value,
                    Err(e) => {
                        guard.finish(Err(e.clone()));
                        return Err(e);
                    }
                };
                if let Err(e) = self
                    .storage
                    .put_raw(key, bytes.clone(), ttl, ValueKind::probe(&value))
                {
                    guard.finish(Err(e.clone()));
                    return Err(e);
                }
                guard.finish(Ok(bytes));
                *dest = value;
                Ok(())
            }
            Produced::Failed(err, stale) => {
                guard.finish(Err(err.clone()));
                if self.use_stale {
                    if let Some(stale) = stale {
                        if let Ok(value) = codec.unmarshal::<T>(&stale) {
                            *dest = value;
                        }
                    }
                }
                Err(err)
            }
        }
    }
}

/// Completes a flight on every producer exit path.
struct FlightGuard<'a> {
    cachex: &'a Cachex,
    key: &'a str,
    sentinel: &'a Arc<Sentinel>,
    done: bool,
}

impl FlightGuard<'_> {
    fn finish(mut self, outcome: Result<Vec<u8>>) {
        self.done = true;
        // The entry leaves the table before waiters wake, so the next
        // arrival after completion starts a fresh flight.
        self.cachex.remove_flight(self.key);
        self.sentinel.complete(outcome);
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.cachex.remove_flight(self.key);
            self.sentinel
                .complete(Err(CacheError::origin("origin query aborted")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::config::Options;
    use crate::cache::registry::open;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn memory_cachex() -> Cachex {
        Cachex::new(Arc::new(open(Options::memory(0)).unwrap()))
    }

    #[test]
    fn hit_skips_the_origin() {
        let cx = memory_cachex();
        cx.set("k", "cached", 0).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut out = String::new();
        cx.get(
            "k",
            &mut out,
            GetOptions::new().query(QueryFunc::new(move |_: &str| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok("fresh".to_string())
            })),
        )
        .unwrap();

        assert_eq!(out, "cached");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn miss_queries_once_and_writes_back() {
        let cx = memory_cachex();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let origin = QueryFunc::new(move |key: &str| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(format!("origin:{key}"))
        });

        let mut out = String::new();
        cx.get("k", &mut out, GetOptions::new().query(origin))
            .unwrap();
        assert_eq!(out, "origin:k");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Second read is served from the cache.
        let mut out2 = String::new();
        cx.get("k", &mut out2, GetOptions::new()).unwrap();
        assert_eq!(out2, "origin:k");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn miss_without_any_querier_is_not_found() {
        let cx = memory_cachex();
        let mut out = String::new();
        let err = cx.get("missing", &mut out, GetOptions::new()).unwrap_err();
        assert_eq!(err, CacheError::NotFound);
    }

    #[test]
    fn default_querier_is_used_when_no_override() {
        let cx = memory_cachex()
            .with_querier(QueryFunc::new(|key: &str| Ok(format!("default:{key}"))));
        let mut out = String::new();
        cx.get("a", &mut out, GetOptions::new()).unwrap();
        assert_eq!(out, "default:a");
    }

    #[test]
    fn ttl_bypass_always_hits_origin_and_never_caches() {
        let cx = memory_cachex();
        let calls = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let seen = Arc::clone(&calls);
            let mut out = 0i64;
            cx.get(
                "n",
                &mut out,
                GetOptions::new()
                    .ttl(TTL_BYPASS)
                    .query(QueryFunc::new(move |_: &str| {
                        Ok(seen.fetch_add(1, Ordering::SeqCst) as i64 + 1)
                    })),
            )
            .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!cx.storage().is_exist("n").unwrap());
    }

    #[test]
    fn ttl_refresh_replaces_the_cached_value() {
        let cx = memory_cachex();
        cx.set("k", "old", 0).unwrap();

        let mut out = String::new();
        cx.get(
            "k",
            &mut out,
            GetOptions::new()
                .ttl(TTL_REFRESH)
                .query(QueryFunc::new(|_: &str| Ok("new".to_string()))),
        )
        .unwrap();
        assert_eq!(out, "new");
        assert_eq!(cx.storage().string("k"), "new");
    }

    #[test]
    fn write_back_honours_the_per_call_ttl() {
        let cx = memory_cachex();
        let mut out = String::new();
        cx.get(
            "k",
            &mut out,
            GetOptions::new()
                .ttl(1)
                .query(QueryFunc::new(|_: &str| Ok("v".to_string()))),
        )
        .unwrap();

        thread::sleep(Duration::from_millis(1200));
        assert_eq!(
            cx.storage().get::<String>("k").unwrap_err(),
            CacheError::Expired
        );
    }

    #[test]
    fn add_ttl_adjusts_the_default() {
        let cx = memory_cachex();
        let mut out = String::new();
        cx.get(
            "k",
            &mut out,
            GetOptions::new()
                .add_ttl(1 - DEFAULT_TTL)
                .query(QueryFunc::new(|_: &str| Ok("v".to_string()))),
        )
        .unwrap();

        assert_eq!(cx.storage().fetch("k").unwrap().expire, 1);
    }

    #[test]
    fn stale_is_served_alongside_the_origin_error() {
        let cx = memory_cachex().use_stale_when_error(true);
        cx.set("k", "stale-value", 1).unwrap();
        thread::sleep(Duration::from_millis(1200));

        let mut out = String::new();
        let err = cx
            .get(
                "k",
                &mut out,
                GetOptions::new().query(QueryFunc::new(|_: &str| {
                    Err::<String, _>(CacheError::origin("db down"))
                })),
            )
            .unwrap_err();

        assert_eq!(err, CacheError::origin("db down"));
        assert_eq!(out, "stale-value");
    }

    #[test]
    fn without_stale_mode_the_error_stands_alone() {
        let cx = memory_cachex();
        cx.set("k", "stale-value", 1).unwrap();
        thread::sleep(Duration::from_millis(1200));

        let mut out = String::new();
        let err = cx
            .get(
                "k",
                &mut out,
                GetOptions::new().query(QueryFunc::new(|_: &str| {
                    Err::<String, _>(CacheError::origin("db down"))
                })),
            )
            .unwrap_err();

        assert_eq!(err, CacheError::origin("db down"));
        assert_eq!(out, "");
    }

    #[test]
    fn written_back_integers_work_as_counters() {
        let cx = memory_cachex();
        let mut out = 0i64;
        cx.get(
            "hits",
            &mut out,
            GetOptions::new().query(QueryFunc::new(|_: &str| Ok(10i64))),
        )
        .unwrap();
        assert_eq!(out, 10);

        cx.storage().incr("hits").unwrap();
        assert_eq!(cx.storage().int64("hits"), 11);
    }

    #[test]
    fn waiters_are_released_when_the_producer_panics() {
        let cx = Arc::new(memory_cachex());

        let producer = {
            let cx = Arc::clone(&cx);
            thread::spawn(move || {
                let mut out = String::new();
                let _ = cx.get(
                    "k",
                    &mut out,
                    GetOptions::new().query(QueryFunc::new(|_: &str| -> Result<String> {
                        thread::sleep(Duration::from_millis(200));
                        panic!("origin blew up");
                    })),
                );
            })
        };

        thread::sleep(Duration::from_millis(50));
        let waiter = {
            let cx = Arc::clone(&cx);
            thread::spawn(move || {
                let mut out = String::new();
                // This querier never runs: the waiter joins the existing
                // flight and receives the producer's outcome.
                let opts = GetOptions::new()
                    .query(QueryFunc::new(|_: &str| Ok("unused".to_string())));
                cx.get("k", &mut out, opts).unwrap_err()
            })
        };

        assert!(producer.join().is_err(), "producer should have panicked");
        assert_eq!(
            waiter.join().unwrap(),
            CacheError::origin("origin query aborted")
        );
        // The flight table is clean; a later call starts a fresh cycle.
        assert!(cx.flights.lock().unwrap().is_empty());
    }
}
