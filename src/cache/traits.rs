//! The backend contract
//!
//! Backends store and retrieve raw `Item` records; the typed surface, the
//! expiry policy on reads, and codec bridging live in [`Cache`]. Keeping the
//! trait object-safe is what lets the registry hand out `Box<dyn Backend>`
//! while callers keep a fully generic put/get API.
//!
//! [`Cache`]: super::facade::Cache

use super::codec::Codec;
use super::config::Options;
use super::errors::Result;
use super::item::Item;

/// A storage backend implementing the uniform cache contract.
///
/// All methods must be safe to call from multiple threads. A backend owns
/// its codec, its storage handle, and — when a sweep interval is configured —
/// the background task that deletes expired records.
pub trait Backend: Send + Sync {
    /// The codec this backend marshals payloads with.
    fn codec(&self) -> Codec;

    /// Swap the codec. Must happen before any data is written; a store
    /// written with one codec cannot be read with another.
    fn set_codec(&mut self, codec: Codec);

    /// Store a record, replacing any prior record for the key.
    fn put(&self, key: &str, item: Item) -> Result<()>;

    /// Read the raw record for a key.
    ///
    /// Returns `NotFound` if no record exists. Expired records are returned
    /// as-is; callers decide whether to surface `Expired` (the façade does)
    /// or to keep the payload around as a stale value (the read-through
    /// wrapper does).
    fn fetch(&self, key: &str) -> Result<Item>;

    /// Remove any record for the key. Backends may surface a storage-level
    /// not-found; the in-memory backend treats missing keys as success.
    fn delete(&self, key: &str) -> Result<()>;

    /// Report presence without decoding. Expired records may still be
    /// reported present; use a read for an authoritative answer.
    fn is_exist(&self, key: &str) -> Result<bool>;

    /// Increment a stored integer by one, re-anchoring its age clock while
    /// keeping its configured lifetime.
    fn incr(&self, key: &str) -> Result<()>;

    /// Decrement a stored integer by one; fails on an unsigned zero without
    /// mutating storage. Same re-anchoring as `incr`.
    fn decr(&self, key: &str) -> Result<()>;

    /// Remove every record owned by this backend instance.
    fn flush(&self) -> Result<()>;

    /// Initialise from options: connect or create storage, and launch the
    /// sweep task when `options.interval > 0`.
    fn start(&mut self, options: &Options) -> Result<()>;

    /// Stop the sweep task and release storage. Idempotent, and safe on a
    /// backend that was never started.
    fn close(&self) -> Result<()>;
}
