//! Cachebear - pluggable key/value caching behind one contract
//!
//! A uniform cache surface over swappable storage backends, with a
//! single-flight read-through layer for protecting origin data sources.
//!
//! # Features
//!
//! - **Uniform contract**: put/get/delete/exists, integer counters, flush,
//!   and close behave the same on every backend
//! - **Pluggable backends**: in-memory and file-tree backends built in;
//!   custom backends join through the process-wide registry
//! - **Interchangeable codecs**: bincode (default), JSON, and MessagePack
//!   bridge arbitrary serde values in and out of storage
//! - **TTL with background sweep**: relative lifetimes, logical expiry on
//!   read, and a per-backend sweep task that collects expired entries
//! - **Single-flight read-through**: concurrent misses for a key share one
//!   origin query, with optional stale-on-error fallback
//!
//! # Quick start
//!
//! ```
//! use cachebear::{open, Options};
//!
//! let cache = open(Options::memory(30))?;
//! cache.put("greeting", "hello", 60)?;
//! assert_eq!(cache.string("greeting"), "hello");
//! cache.close()?;
//! # Ok::<(), cachebear::CacheError>(())
//! ```
//!
//! # Read-through
//!
//! ```
//! use std::sync::Arc;
//! use cachebear::{open, Options};
//! use cachebear::cachex::{Cachex, GetOptions, QueryFunc};
//!
//! let cache = Arc::new(open(Options::memory(0))?);
//! let cx = Cachex::new(Arc::clone(&cache))
//!     .with_querier(QueryFunc::new(|key: &str| Ok(format!("origin:{key}"))));
//!
//! let mut value = String::new();
//! cx.get("user:1", &mut value, GetOptions::new())?;
//! assert_eq!(value, "origin:user:1");
//! # Ok::<(), cachebear::CacheError>(())
//! ```

pub mod cache;
pub mod cachex;
pub mod prelude;

pub use cache::errors::{is_data_status_error, is_expired, is_not_found, is_not_supported};
pub use cache::{
    open, register, Backend, BackendFactory, Cache, CacheError, Codec, Item, Options, Result,
};
pub use cachex::Cachex;
