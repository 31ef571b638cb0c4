//! Backend configuration

/// Configuration handed to the registry to produce a started backend.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Name of a registered backend. Empty selects the in-memory backend.
    pub adapter: String,
    /// Backend-specific location string: a filesystem path for the file
    /// backend, a connection string for out-of-tree remote backends. The
    /// in-memory backend ignores it.
    pub adapter_config: String,
    /// Seconds between background sweep passes; `0` disables the periodic
    /// sweep (entries still expire logically on read).
    pub interval: u64,
    /// Hint for out-of-tree remote backends that this instance owns the
    /// whole namespace and may skip its secondary key index.
    pub occupy_mode: bool,
}

impl Options {
    /// Options for the in-memory backend.
    pub fn memory(interval: u64) -> Self {
        Options {
            adapter: "memory".into(),
            interval,
            ..Options::default()
        }
    }

    /// Options for the file backend rooted at `path`.
    pub fn file(path: impl Into<String>, interval: u64) -> Self {
        Options {
            adapter: "file".into(),
            adapter_config: path.into(),
            interval,
            ..Options::default()
        }
    }
}
