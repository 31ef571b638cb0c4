//! Typed cache surface over a boxed backend
//!
//! `Cache` is what the registry hands out: it bridges caller types through
//! the backend's codec, applies the expiry policy on reads, and forwards the
//! rest of the contract untouched.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::codec::Codec;
use super::errors::{CacheError, Result};
use super::item::{Item, ValueKind};
use super::traits::Backend;

/// A started cache over some registered backend.
pub struct Cache {
    backend: Box<dyn Backend>,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

impl Cache {
    /// Wrap an already-started backend.
    ///
    /// Prefer [`open`](crate::cache::registry::open), which resolves the
    /// backend by name and starts it; this constructor exists for backends
    /// built outside the registry.
    pub fn new(backend: Box<dyn Backend>) -> Self {
        Cache { backend }
    }

    /// The codec values are marshalled with.
    pub fn codec(&self) -> Codec {
        self.backend.codec()
    }

    /// Swap the codec. Only safe before any data is written.
    pub fn set_codec(&mut self, codec: Codec) {
        self.backend.set_codec(codec);
    }

    /// Store `value` under `key`.
    ///
    /// `ttl` is a relative lifetime in seconds; `0` stores the value without
    /// expiry, until an explicit delete or flush.
    pub fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: i64) -> Result<()> {
        let kind = ValueKind::probe(value);
        let payload = self.backend.codec().marshal(value)?;
        self.backend.put(key, Item::new(payload, ttl, kind))
    }

    /// Read the value stored under `key`.
    ///
    /// Returns `NotFound` for a missing key. An entry whose lifetime has
    /// elapsed is deleted opportunistically (deletion failures are swallowed,
    /// the sweep will retry) and reported as `Expired`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let item = self.backend.fetch(key)?;
        if item.has_expired() {
            let _ = self.backend.delete(key);
            return Err(CacheError::Expired);
        }
        self.backend.codec().unmarshal(&item.value)
    }

    /// Read the raw record for `key`, expired or not.
    ///
    /// This is the escape hatch for layers that need an expired payload —
    /// the read-through wrapper uses it to keep a stale value available.
    /// Most callers want [`get`](Cache::get).
    pub fn fetch(&self, key: &str) -> Result<Item> {
        self.backend.fetch(key)
    }

    /// Store an already-marshalled payload. The payload must have been
    /// produced by this cache's codec.
    pub(crate) fn put_raw(
        &self,
        key: &str,
        payload: Vec<u8>,
        ttl: i64,
        kind: ValueKind,
    ) -> Result<()> {
        self.backend.put(key, Item::new(payload, ttl, kind))
    }

    /// Remove any entry for `key`.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.backend.delete(key)
    }

    /// Report presence without decoding.
    pub fn is_exist(&self, key: &str) -> Result<bool> {
        self.backend.is_exist(key)
    }

    /// Increment a stored integer counter by one.
    pub fn incr(&self, key: &str) -> Result<()> {
        self.backend.incr(key)
    }

    /// Decrement a stored integer counter by one.
    pub fn decr(&self, key: &str) -> Result<()> {
        self.backend.decr(key)
    }

    /// Remove every entry owned by this cache.
    pub fn flush(&self) -> Result<()> {
        self.backend.flush()
    }

    /// Stop the background sweep and release the backend's storage.
    pub fn close(&self) -> Result<()> {
        self.backend.close()
    }
}
