//! Error types shared by every cache backend
//!
//! The sentinel variants (`NotFound`, `Expired`, `NotSupported`) are part of
//! the public contract: callers branch on them, everything else is context.

use std::error::Error as StdError;
use std::fmt;

/// Errors produced by cache operations across all backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// No entry exists for the requested key.
    NotFound,
    /// An entry exists but its lifetime has elapsed.
    Expired,
    /// The backend cannot honour this operation.
    NotSupported,
    /// The stored value is not usable the way the operation requires,
    /// e.g. incrementing a non-integer or decrementing an unsigned zero.
    TypeMismatch(String),
    /// Marshalling or unmarshalling through the codec failed.
    Codec(String),
    /// Backend storage failure (filesystem, connection, ...).
    Io(String),
    /// `Options` could not be turned into a running backend.
    Config(String),
    /// An origin query handed to the read-through wrapper failed.
    Origin(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::NotFound => write!(f, "not found"),
            CacheError::Expired => write!(f, "expired"),
            CacheError::NotSupported => write!(f, "not supported operation"),
            CacheError::TypeMismatch(msg) => write!(f, "type mismatch: {}", msg),
            CacheError::Codec(msg) => write!(f, "codec error: {}", msg),
            CacheError::Io(msg) => write!(f, "io error: {}", msg),
            CacheError::Config(msg) => write!(f, "configuration error: {}", msg),
            CacheError::Origin(msg) => write!(f, "origin query error: {}", msg),
        }
    }
}

impl StdError for CacheError {}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io(err.to_string())
    }
}

impl CacheError {
    /// Create a type mismatch error
    #[inline]
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::TypeMismatch(msg.into())
    }

    /// Create a codec error
    #[inline]
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    /// Create an I/O error
    #[inline]
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Create a configuration error
    #[inline]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an origin query error
    #[inline]
    pub fn origin(msg: impl Into<String>) -> Self {
        Self::Origin(msg.into())
    }

    /// True for the two entry-status errors, `NotFound` and `Expired`.
    #[inline]
    pub fn is_data_status(&self) -> bool {
        matches!(self, CacheError::NotFound | CacheError::Expired)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CacheError>;

fn find_cache_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a CacheError> {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = cur {
        if let Some(ce) = e.downcast_ref::<CacheError>() {
            return Some(ce);
        }
        cur = e.source();
    }
    None
}

/// Reports whether the error is `NotFound`, unwrapping wrapped chains.
pub fn is_not_found(err: &(dyn StdError + 'static)) -> bool {
    matches!(find_cache_error(err), Some(CacheError::NotFound))
}

/// Reports whether the error indicates an expired cache entry.
pub fn is_expired(err: &(dyn StdError + 'static)) -> bool {
    matches!(find_cache_error(err), Some(CacheError::Expired))
}

/// Reports whether the error is either `NotFound` or `Expired`.
pub fn is_data_status_error(err: &(dyn StdError + 'static)) -> bool {
    find_cache_error(err).is_some_and(CacheError::is_data_status)
}

/// Reports whether the error indicates an unsupported operation.
pub fn is_not_supported(err: &(dyn StdError + 'static)) -> bool {
    matches!(find_cache_error(err), Some(CacheError::NotSupported))
}
