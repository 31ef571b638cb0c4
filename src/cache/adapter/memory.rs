//! In-memory backend
//!
//! The reference implementation of the contract and the fastest path: a
//! sharded concurrent map of marshalled records. Counter mutations happen in
//! place under the entry guard, so writes to a single key stay linearisable.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use dashmap::DashMap;
use log::debug;

use crate::cache::codec::Codec;
use crate::cache::config::Options;
use crate::cache::errors::{CacheError, Result};
use crate::cache::item::{step_counter, unix_now, Item};
use crate::cache::sweep::SweepTask;
use crate::cache::traits::Backend;

/// Memory-backed cache adapter.
pub struct MemoryBackend {
    codec: Codec,
    items: Arc<DashMap<String, Item>>,
    sweep: Mutex<Option<SweepTask>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend {
            codec: Codec::default(),
            items: Arc::new(DashMap::new()),
            sweep: Mutex::new(None),
        }
    }

    fn stop_sweep(&self) {
        let task = self
            .sweep
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.stop();
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn sweep_pass(items: &DashMap<String, Item>) -> usize {
    let mut removed = 0usize;
    items.retain(|_, item| {
        if item.has_expired() {
            removed += 1;
            false
        } else {
            true
        }
    });
    removed
}

impl Backend for MemoryBackend {
    fn codec(&self) -> Codec {
        self.codec
    }

    fn set_codec(&mut self, codec: Codec) {
        self.codec = codec;
    }

    fn put(&self, key: &str, item: Item) -> Result<()> {
        self.items.insert(key.to_string(), item);
        Ok(())
    }

    fn fetch(&self, key: &str) -> Result<Item> {
        self.items
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or(CacheError::NotFound)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }

    fn is_exist(&self, key: &str) -> Result<bool> {
        Ok(self.items.contains_key(key))
    }

    fn incr(&self, key: &str) -> Result<()> {
        let mut entry = self.items.get_mut(key).ok_or(CacheError::NotFound)?;
        let payload = step_counter(self.codec, entry.value(), true)?;
        let item = entry.value_mut();
        item.value = payload;
        item.created = unix_now();
        Ok(())
    }

    fn decr(&self, key: &str) -> Result<()> {
        let mut entry = self.items.get_mut(key).ok_or(CacheError::NotFound)?;
        let payload = step_counter(self.codec, entry.value(), false)?;
        let item = entry.value_mut();
        item.value = payload;
        item.created = unix_now();
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.items.clear();
        Ok(())
    }

    fn start(&mut self, options: &Options) -> Result<()> {
        self.stop_sweep();
        if options.interval > 0 {
            let items = Arc::clone(&self.items);
            let task = SweepTask::spawn(
                "cachebear-memory-sweep",
                Duration::from_secs(options.interval),
                move || {
                    let removed = sweep_pass(&items);
                    if removed > 0 {
                        debug!("memory sweep removed {removed} expired entries");
                    }
                },
            );
            *self.sweep.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.stop_sweep();
        self.flush()
    }
}

impl Drop for MemoryBackend {
    fn drop(&mut self) {
        self.stop_sweep();
    }
}
