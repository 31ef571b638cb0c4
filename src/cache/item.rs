//! The stored cache record and its integer-counter support
//!
//! Every backend stores the same record shape: the codec-marshalled payload,
//! the creation timestamp, the relative lifetime, and the integer kind probed
//! at put time. The probe is the serde rendering of a runtime type switch:
//! it classifies the value being stored without ever allocating, so the
//! counter operations can later decode, adjust, and re-encode the payload at
//! the width the caller originally used.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::ser::Impossible;
use serde::{Deserialize, Serialize, Serializer};

use super::codec::Codec;
use super::errors::{CacheError, Result};

/// Seconds since the unix epoch.
pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Width of a recognised integer payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

/// Classification of a stored payload, recorded at put time.
///
/// Only bare integers are recognised; anything else (structs, strings,
/// floats, options, newtypes) is `Opaque` and cannot be used as a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Opaque,
    Int(IntWidth),
    Uint(IntWidth),
}

impl ValueKind {
    /// Classify a value without marshalling it.
    pub fn probe<T: Serialize + ?Sized>(value: &T) -> ValueKind {
        value.serialize(IntProbe).unwrap_or(ValueKind::Opaque)
    }
}

/// A cache record as held by a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Codec-marshalled payload.
    pub value: Vec<u8>,
    /// Unix timestamp (seconds) of the put that created this record.
    pub created: i64,
    /// Relative lifetime in seconds; `0` means unbounded.
    pub expire: i64,
    /// Integer classification of the payload.
    pub kind: ValueKind,
}

impl Item {
    /// Build a record stamped with the current time.
    pub fn new(value: Vec<u8>, expire: i64, kind: ValueKind) -> Self {
        Item {
            value,
            created: unix_now(),
            expire,
            kind,
        }
    }

    /// Whether the record's lifetime has elapsed.
    ///
    /// A negative `expire` counts as already elapsed; `0` never elapses.
    pub fn has_expired(&self) -> bool {
        self.expire != 0 && unix_now() - self.created >= self.expire
    }
}

/// Step an integer payload by one in either direction.
///
/// Decodes at the recorded width, adjusts, and re-encodes with the same
/// codec. Signed counters wrap on overflow; decrementing an unsigned zero
/// fails without producing a payload.
pub(crate) fn step_counter(codec: Codec, item: &Item, up: bool) -> Result<Vec<u8>> {
    match item.kind {
        ValueKind::Opaque => Err(CacheError::type_mismatch("item value is not int-type")),
        ValueKind::Int(width) => {
            let delta: i64 = if up { 1 } else { -1 };
            match width {
                IntWidth::W8 => {
                    let v: i8 = codec.unmarshal(&item.value)?;
                    codec.marshal(&v.wrapping_add(delta as i8))
                }
                IntWidth::W16 => {
                    let v: i16 = codec.unmarshal(&item.value)?;
                    codec.marshal(&v.wrapping_add(delta as i16))
                }
                IntWidth::W32 => {
                    let v: i32 = codec.unmarshal(&item.value)?;
                    codec.marshal(&v.wrapping_add(delta as i32))
                }
                IntWidth::W64 => {
                    let v: i64 = codec.unmarshal(&item.value)?;
                    codec.marshal(&v.wrapping_add(delta))
                }
            }
        }
        ValueKind::Uint(width) => {
            macro_rules! step_unsigned {
                ($ty:ty) => {{
                    let v: $ty = codec.unmarshal(&item.value)?;
                    if up {
                        codec.marshal(&v.wrapping_add(1))
                    } else if v == 0 {
                        Err(CacheError::type_mismatch("item value is less than 0"))
                    } else {
                        codec.marshal(&(v - 1))
                    }
                }};
            }
            match width {
                IntWidth::W8 => step_unsigned!(u8),
                IntWidth::W16 => step_unsigned!(u16),
                IntWidth::W32 => step_unsigned!(u32),
                IntWidth::W64 => step_unsigned!(u64),
            }
        }
    }
}

#[derive(Debug)]
struct NotInteger;

impl fmt::Display for NotInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("value is not a bare integer")
    }
}

impl std::error::Error for NotInteger {}

impl serde::ser::Error for NotInteger {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        NotInteger
    }
}

/// Serializer that classifies a value as a bare integer, or refuses.
struct IntProbe;

macro_rules! probe_int {
    ($method:ident, $ty:ty, $kind:expr) => {
        fn $method(self, _v: $ty) -> std::result::Result<ValueKind, NotInteger> {
            Ok($kind)
        }
    };
}

macro_rules! probe_reject {
    ($method:ident $(, $arg:ty)*) => {
        fn $method(self $(, _: $arg)*) -> std::result::Result<ValueKind, NotInteger> {
            Err(NotInteger)
        }
    };
}

impl Serializer for IntProbe {
    type Ok = ValueKind;
    type Error = NotInteger;

    type SerializeSeq = Impossible<ValueKind, NotInteger>;
    type SerializeTuple = Impossible<ValueKind, NotInteger>;
    type SerializeTupleStruct = Impossible<ValueKind, NotInteger>;
    type SerializeTupleVariant = Impossible<ValueKind, NotInteger>;
    type SerializeMap = Impossible<ValueKind, NotInteger>;
    type SerializeStruct = Impossible<ValueKind, NotInteger>;
    type SerializeStructVariant = Impossible<ValueKind, NotInteger>;

    probe_int!(serialize_i8, i8, ValueKind::Int(IntWidth::W8));
    probe_int!(serialize_i16, i16, ValueKind::Int(IntWidth::W16));
    probe_int!(serialize_i32, i32, ValueKind::Int(IntWidth::W32));
    probe_int!(serialize_i64, i64, ValueKind::Int(IntWidth::W64));
    probe_int!(serialize_u8, u8, ValueKind::Uint(IntWidth::W8));
    probe_int!(serialize_u16, u16, ValueKind::Uint(IntWidth::W16));
    probe_int!(serialize_u32, u32, ValueKind::Uint(IntWidth::W32));
    probe_int!(serialize_u64, u64, ValueKind::Uint(IntWidth::W64));

    probe_reject!(serialize_bool, bool);
    probe_reject!(serialize_f32, f32);
    probe_reject!(serialize_f64, f64);
    probe_reject!(serialize_char, char);
    probe_reject!(serialize_str, &str);
    probe_reject!(serialize_bytes, &[u8]);
    probe_reject!(serialize_none);
    probe_reject!(serialize_unit);
    probe_reject!(serialize_unit_struct, &'static str);

    fn serialize_some<T: Serialize + ?Sized>(
        self,
        _value: &T,
    ) -> std::result::Result<ValueKind, NotInteger> {
        Err(NotInteger)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
    ) -> std::result::Result<ValueKind, NotInteger> {
        Err(NotInteger)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _value: &T,
    ) -> std::result::Result<ValueKind, NotInteger> {
        Err(NotInteger)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> std::result::Result<ValueKind, NotInteger> {
        Err(NotInteger)
    }

    fn serialize_seq(
        self,
        _len: Option<usize>,
    ) -> std::result::Result<Self::SerializeSeq, NotInteger> {
        Err(NotInteger)
    }

    fn serialize_tuple(self, _len: usize) -> std::result::Result<Self::SerializeTuple, NotInteger> {
        Err(NotInteger)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeTupleStruct, NotInteger> {
        Err(NotInteger)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeTupleVariant, NotInteger> {
        Err(NotInteger)
    }

    fn serialize_map(
        self,
        _len: Option<usize>,
    ) -> std::result::Result<Self::SerializeMap, NotInteger> {
        Err(NotInteger)
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeStruct, NotInteger> {
        Err(NotInteger)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeStructVariant, NotInteger> {
        Err(NotInteger)
    }
}
