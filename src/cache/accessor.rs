//! Zero-default typed accessors
//!
//! Read-side helpers that swallow every failure — missing key, expired
//! entry, codec mismatch — and hand back the type's zero value instead.
//! Callers that need to distinguish those cases use [`Cache::get`].

use serde::de::DeserializeOwned;

use super::facade::Cache;

impl Cache {
    /// Read a value, or its `Default` on any error.
    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.get(key).unwrap_or_default()
    }

    /// String value, or `""`.
    pub fn string(&self, key: &str) -> String {
        self.get_or_default(key)
    }

    /// Byte sequence, or empty.
    pub fn bytes(&self, key: &str) -> Vec<u8> {
        self.get_or_default(key)
    }

    /// `i8` value, or `0`.
    pub fn int8(&self, key: &str) -> i8 {
        self.get_or_default(key)
    }

    /// `i16` value, or `0`.
    pub fn int16(&self, key: &str) -> i16 {
        self.get_or_default(key)
    }

    /// `i32` value, or `0`.
    pub fn int32(&self, key: &str) -> i32 {
        self.get_or_default(key)
    }

    /// `i64` value, or `0`.
    pub fn int64(&self, key: &str) -> i64 {
        self.get_or_default(key)
    }

    /// `u8` value, or `0`.
    pub fn uint8(&self, key: &str) -> u8 {
        self.get_or_default(key)
    }

    /// `u16` value, or `0`.
    pub fn uint16(&self, key: &str) -> u16 {
        self.get_or_default(key)
    }

    /// `u32` value, or `0`.
    pub fn uint32(&self, key: &str) -> u32 {
        self.get_or_default(key)
    }

    /// `u64` value, or `0`.
    pub fn uint64(&self, key: &str) -> u64 {
        self.get_or_default(key)
    }

    /// `f32` value, or `0.0`.
    pub fn float32(&self, key: &str) -> f32 {
        self.get_or_default(key)
    }

    /// `f64` value, or `0.0`.
    pub fn float64(&self, key: &str) -> f64 {
        self.get_or_default(key)
    }
}
