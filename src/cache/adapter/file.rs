//! File-tree backend
//!
//! Durable storage under a configured root. Keys are fingerprinted with a
//! 128-bit digest rendered as lowercase hex, and entries are sharded by the
//! first two hex characters to cap per-directory entry counts:
//! `ROOT/<h0>/<h1>/<h32>`. Writes go through a temp file and an atomic
//! rename; reads rely on unlink atomicity.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use log::{debug, warn};
use md5::{Digest, Md5};

use crate::cache::codec::Codec;
use crate::cache::config::Options;
use crate::cache::errors::{CacheError, Result};
use crate::cache::item::{step_counter, Item};
use crate::cache::sweep::SweepTask;
use crate::cache::traits::Backend;

/// File cache adapter.
pub struct FileBackend {
    codec: Codec,
    root: PathBuf,
    sweep: Mutex<Option<SweepTask>>,
}

impl FileBackend {
    pub fn new() -> Self {
        FileBackend {
            codec: Codec::default(),
            root: PathBuf::new(),
            sweep: Mutex::new(None),
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        entry_path(&self.root, key)
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

impl Default for FileBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn entry_path(root: &Path, key: &str) -> PathBuf {
    let hash = hex::encode(Md5::digest(key.as_bytes()));
    root.join(&hash[..1]).join(&hash[1..2]).join(&hash)
}

/// Walk the storage tree, deleting expired entries.
///
/// Unreadable directories and files are skipped (a concurrent delete is not
/// a sweep failure); records the codec cannot decode abort the pass, since
/// that points at a codec swap mid-lifetime rather than a transient problem.
fn sweep_dir(dir: &Path, codec: Codec) -> Result<u64> {
    let mut removed = 0u64;
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(0),
    };
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(_) => continue,
        };
        if file_type.is_dir() {
            removed += sweep_dir(&path, codec)?;
            continue;
        }
        // In-flight writes are staged as .tmp files next to their target.
        if entry.file_name().to_string_lossy().starts_with(".tmp") {
            continue;
        }
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(_) => continue,
        };
        let item: Item = codec.unmarshal(&data)?;
        if item.has_expired() {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(removed)
}

impl Backend for FileBackend {
    fn codec(&self) -> Codec {
        self.codec
    }

    fn set_codec(&mut self, codec: Codec) {
        self.codec = codec;
    }

    fn put(&self, key: &str, item: Item) -> Result<()> {
        let path = self.entry_path(key);
        let parent = path
            .parent()
            .ok_or_else(|| CacheError::io("entry path has no parent directory"))?;
        fs::create_dir_all(parent)?;

        let data = self.codec.marshal(&item)?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(&data)?;
        tmp.persist(&path)
            .map_err(|e| CacheError::io(e.to_string()))?;
        Ok(())
    }

    fn fetch(&self, key: &str) -> Result<Item> {
        match fs::read(self.entry_path(key)) {
            Ok(data) => self.codec.unmarshal(&data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(CacheError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, key: &str) -> Result<()> {
        fs::remove_file(self.entry_path(key)).map_err(CacheError::from)
    }

    fn is_exist(&self, key: &str) -> Result<bool> {
        Ok(self.entry_path(key).exists())
    }

    fn incr(&self, key: &str) -> Result<()> {
        let item = self.fetch(key)?;
        let payload = step_counter(self.codec, &item, true)?;
        self.put(key, Item::new(payload, item.expire, item.kind))
    }

    fn decr(&self, key: &str) -> Result<()> {
        let item = self.fetch(key)?;
        let payload = step_counter(self.codec, &item, false)?;
        self.put(key, Item::new(payload, item.expire, item.kind))
    }

    fn flush(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() || !self.root.exists() {
            return Ok(());
        }
        fs::remove_dir_all(&self.root).map_err(CacheError::from)
    }

    fn start(&mut self, options: &Options) -> Result<()> {
        self.stop_sweep();

        let configured = options.adapter_config.trim();
        if configured.is_empty() {
            return Err(CacheError::config("file adapter requires a storage root path"));
        }
        // Relative roots stay relative to the working directory.
        self.root = PathBuf::from(configured);
        fs::create_dir_all(&self.root)?;

        if options.interval > 0 {
            let root = self.root.clone();
            let codec = self.codec;
            let task = SweepTask::spawn(
                "cachebear-file-sweep",
                Duration::from_secs(options.interval),
                move || match sweep_dir(&root, codec) {
                    Ok(0) => {}
                    Ok(removed) => debug!("file sweep removed {removed} expired entries"),
                    Err(e) => warn!("error garbage collecting cache files: {e}"),
                },
            );
            *self.sweep.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.stop_sweep();
        Ok(())
    }
}

impl Drop for FileBackend {
    fn drop(&mut self) {
        self.stop_sweep();
    }
}
