//! Interchangeable serialization codecs
//!
//! A codec is a pair of pure operations bridging arbitrary serde values to
//! and from bytes. Codecs are plain `Copy` values, safe to share across
//! threads, and are owned per backend instance: a store written with one
//! codec must be read with the same codec for its whole lifetime.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::{CacheError, Result};

/// The serialization format used by a backend.
///
/// `Binary` (bincode) is the default: compact and structural, it round-trips
/// anything serde can represent. `Json` trades size for readability and is
/// restricted to JSON-representable graphs. `MessagePack` is the smallest of
/// the three for typical payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codec {
    #[default]
    Binary,
    Json,
    MessagePack,
}

impl Codec {
    /// Marshal a value into bytes.
    pub fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        match self {
            Codec::Binary => bincode::serde::encode_to_vec(value, bincode::config::standard())
                .map_err(|e| CacheError::codec(e.to_string())),
            Codec::Json => serde_json::to_vec(value).map_err(|e| CacheError::codec(e.to_string())),
            Codec::MessagePack => {
                rmp_serde::to_vec(value).map_err(|e| CacheError::codec(e.to_string()))
            }
        }
    }

    /// Unmarshal bytes back into a value.
    pub fn unmarshal<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T> {
        match self {
            Codec::Binary => {
                bincode::serde::decode_from_slice(data, bincode::config::standard())
                    .map(|(value, _)| value)
                    .map_err(|e| CacheError::codec(e.to_string()))
            }
            Codec::Json => {
                serde_json::from_slice(data).map_err(|e| CacheError::codec(e.to_string()))
            }
            Codec::MessagePack => {
                rmp_serde::from_slice(data).map_err(|e| CacheError::codec(e.to_string()))
            }
        }
    }

    /// Short name, used in logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Codec::Binary => "binary",
            Codec::Json => "json",
            Codec::MessagePack => "msgpack",
        }
    }
}
