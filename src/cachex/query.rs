//! Origin query abstraction

use std::marker::PhantomData;

use serde::Serialize;

use crate::cache::codec::Codec;
use crate::cache::errors::Result;

/// An origin data source consulted on cache misses.
///
/// The origin's value is returned marshalled with the cache's codec: the
/// single-flight barrier hands those bytes to every waiter, and each waiter
/// decodes its own copy.
pub trait Querier: Send + Sync {
    fn query(&self, key: &str, codec: Codec) -> Result<Vec<u8>>;
}

/// Adapts a typed closure into a [`Querier`].
///
/// ```
/// use cachebear::cachex::QueryFunc;
///
/// let origin = QueryFunc::new(|key: &str| Ok(format!("value for {key}")));
/// ```
pub struct QueryFunc<T, F> {
    f: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> QueryFunc<T, F>
where
    T: Serialize,
    F: Fn(&str) -> Result<T> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        QueryFunc {
            f,
            _marker: PhantomData,
        }
    }
}

impl<T, F> Querier for QueryFunc<T, F>
where
    T: Serialize,
    F: Fn(&str) -> Result<T> + Send + Sync,
{
    fn query(&self, key: &str, codec: Codec) -> Result<Vec<u8>> {
        let value = (self.f)(key)?;
        codec.marshal(&value)
    }
}
