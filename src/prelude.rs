//! Cachebear prelude - convenient imports for users

// The cache surface and its configuration
pub use crate::cache::{open, register, Backend, Cache, CacheError, Codec, Options, Result};

// Error classifiers
pub use crate::cache::errors::{is_data_status_error, is_expired, is_not_found, is_not_supported};

// The read-through wrapper
pub use crate::cachex::{Cachex, GetOptions, Querier, QueryFunc, DEFAULT_TTL};

// Re-export serde traits that cached types need to implement
pub use serde::{Deserialize, Serialize};
