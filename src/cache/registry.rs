//! Process-wide adapter registry
//!
//! Backends register a factory under a unique name; [`open`] resolves an
//! [`Options`] into a started [`Cache`]. Factories are prototypical: every
//! `open` constructs a fresh backend instance. Registration mistakes —
//! duplicate names, opening an unknown name — are programmer errors and
//! panic rather than returning an error.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;

use super::adapter::file::FileBackend;
use super::adapter::memory::MemoryBackend;
use super::config::Options;
use super::errors::Result;
use super::facade::Cache;
use super::traits::Backend;

/// Constructor for an unstarted backend instance.
pub type BackendFactory = fn() -> Box<dyn Backend>;

static REGISTRY: Lazy<RwLock<HashMap<String, BackendFactory>>> = Lazy::new(|| {
    let mut builtin: HashMap<String, BackendFactory> = HashMap::new();
    builtin.insert("memory".to_string(), || Box::new(MemoryBackend::new()));
    builtin.insert("file".to_string(), || Box::new(FileBackend::new()));
    RwLock::new(builtin)
});

/// Register a backend factory under `name`.
///
/// # Panics
///
/// Panics if `name` is already taken (the built-in names `memory` and `file`
/// are reserved). Call this during program start-up, before any `open`.
pub fn register(name: &str, factory: BackendFactory) {
    let mut registry = REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    if registry.contains_key(name) {
        panic!("cache: adapter {name:?} is already registered");
    }
    registry.insert(name.to_string(), factory);
}

/// Resolve `options` into a started cache.
///
/// An empty adapter name selects the in-memory backend. Configuration and
/// connection problems come back as errors; an unknown adapter name is a
/// programmer error and panics.
pub fn open(options: Options) -> Result<Cache> {
    let name = if options.adapter.is_empty() {
        "memory"
    } else {
        options.adapter.as_str()
    };
    let factory = {
        let registry = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);
        registry.get(name).copied()
    };
    let factory =
        factory.unwrap_or_else(|| panic!("cache: unknown adapter {name:?}, forgot to register?"));

    let mut backend = factory();
    backend.start(&options)?;
    Ok(Cache::new(backend))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_adapter_defaults_to_memory() {
        let c = open(Options::default()).unwrap();
        c.put("k", "v", 0).unwrap();
        assert_eq!(c.string("k"), "v");
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn builtin_names_are_reserved() {
        register("memory", || Box::new(MemoryBackend::new()));
    }

    #[test]
    #[should_panic(expected = "unknown adapter")]
    fn unknown_adapter_panics() {
        let _ = open(Options {
            adapter: "fake".into(),
            ..Options::default()
        });
    }

    #[test]
    fn custom_registrations_resolve() {
        register("memory-alias", || Box::new(MemoryBackend::new()));
        let c = open(Options {
            adapter: "memory-alias".into(),
            ..Options::default()
        })
        .unwrap();
        c.put("k", &1i64, 0).unwrap();
        assert_eq!(c.int64("k"), 1);
    }

    #[test]
    fn each_open_gets_a_fresh_instance() {
        let a = open(Options::memory(0)).unwrap();
        let b = open(Options::memory(0)).unwrap();
        a.put("k", "v", 0).unwrap();
        assert_eq!(b.get::<String>("k").unwrap_err(), crate::cache::errors::CacheError::NotFound);
    }
}
