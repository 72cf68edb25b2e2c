//! Dynamically Typed Keys and Values
//!
//! The generic [`CacheMap`](crate::store::CacheMap) rejects unusable key types
//! at compile time through its `Eq + Hash` bound. Some callers instead want
//! one map holding keys and values of mixed runtime types — the shape of a
//! classic `interface{}`-keyed cache. [`DynCacheMap`] provides that: keys are
//! any [`Any`] value checked against an allow-list at call time, values are
//! type-erased behind `Arc<dyn Any>`.
//!
//! ## Supported Key Types
//!
//! Integers of every width (signedness preserved), `bool`, `char`,
//! `&'static str` and `String`. Anything else — maps, vectors, slices,
//! function pointers, arbitrary structs — fails with
//! [`StoreError::InvalidKeyType`] naming the rejected type, and no mutation
//! takes place. Types whose equality is unstable or undefined for map use
//! never reach the store.
//!
//! Two deliberate normalizations: numeric keys of the same signedness compare
//! by value regardless of width (`7u8` and `7u64` are the same key), and
//! `&'static str` keys unify with `String` keys of the same text.
//!
//! ## Example
//!
//! ```no_run
//! use ttlmap::DynCacheMap;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache = DynCacheMap::new();
//!
//!     cache.add("greeting", "hello".to_owned(), Duration::ZERO, None).unwrap();
//!     cache.add(7u32, vec![1, 2, 3], Duration::from_secs(30), None).unwrap();
//!
//!     let entry = cache.get("greeting").unwrap();
//!     assert_eq!(entry.value.downcast_ref::<String>().unwrap(), "hello");
//!
//!     cache.stop();
//! }
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::store::{CacheMap, Entry, ExpireCallback, Options, StoreError};

/// Type-erased value stored by a [`DynCacheMap`]. Downcast on read.
pub type DynValue = Arc<dyn Any + Send + Sync>;

/// An entry as returned by [`DynCacheMap`] reads and expiry callbacks.
pub type DynEntry = Entry<DynKey, DynValue>;

/// Expiry callback for dynamically keyed entries.
pub type DynExpireCallback = ExpireCallback<DynKey, DynValue>;

/// A key coerced from one of the supported runtime types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DynKey {
    /// Any signed integer key.
    Int(i128),
    /// Any unsigned integer key.
    UInt(u128),
    /// A boolean key.
    Bool(bool),
    /// A character key.
    Char(char),
    /// A string key, from `&'static str` or `String`.
    Str(String),
}

macro_rules! coerce_ints {
    ($any:expr, $( $ty:ty => $variant:ident ),+ $(,)?) => {
        $(
            if let Some(v) = $any.downcast_ref::<$ty>() {
                return Ok(DynKey::$variant(*v as _));
            }
        )+
    };
}

/// Coerces a runtime-typed key into a [`DynKey`], or rejects it.
fn coerce_key<K: Any>(key: &K) -> Result<DynKey, StoreError> {
    let any = key as &dyn Any;

    coerce_ints!(any,
        i8 => Int, i16 => Int, i32 => Int, i64 => Int, i128 => Int, isize => Int,
        u8 => UInt, u16 => UInt, u32 => UInt, u64 => UInt, u128 => UInt, usize => UInt,
    );
    if let Some(v) = any.downcast_ref::<bool>() {
        return Ok(DynKey::Bool(*v));
    }
    if let Some(v) = any.downcast_ref::<char>() {
        return Ok(DynKey::Char(*v));
    }
    if let Some(v) = any.downcast_ref::<&'static str>() {
        return Ok(DynKey::Str((*v).to_owned()));
    }
    if let Some(v) = any.downcast_ref::<String>() {
        return Ok(DynKey::Str(v.clone()));
    }

    Err(StoreError::InvalidKeyType {
        type_name: std::any::type_name::<K>(),
    })
}

/// A [`CacheMap`] over runtime-typed keys and values.
///
/// Every operation validates the key's type before touching the store and
/// mirrors the semantics of the generic map: `add` never overwrites, `del` of
/// a logically expired entry is a destructive miss, reads do not filter
/// expired entries, and the background sweeper evicts on its interval.
///
/// Construction spawns the sweeper, so a tokio runtime must be available.
pub struct DynCacheMap {
    inner: CacheMap<DynKey, DynValue>,
}

impl fmt::Debug for DynCacheMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynCacheMap")
            .field("entries", &self.inner.len())
            .field("running", &self.inner.is_running())
            .finish()
    }
}

impl Default for DynCacheMap {
    fn default() -> Self {
        Self::new()
    }
}

impl DynCacheMap {
    /// Creates a map with the default sweep interval and starts its sweeper.
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    /// Creates a map with the given options and starts its sweeper.
    pub fn with_options(options: Options) -> Self {
        Self {
            inner: CacheMap::with_options(options),
        }
    }

    /// Inserts a new entry. Fails with [`StoreError::InvalidKeyType`] for an
    /// unsupported key type, or [`StoreError::KeyExists`] if the key is
    /// already present (expired or not).
    pub fn add<K, V>(
        &self,
        key: K,
        value: V,
        ttl: Duration,
        on_expire: Option<DynExpireCallback>,
    ) -> Result<(), StoreError>
    where
        K: Any,
        V: Any + Send + Sync,
    {
        let key = coerce_key(&key)?;
        self.inner.add(key, Arc::new(value), ttl, on_expire)
    }

    /// Removes the entry for `key`. A logically expired entry is still
    /// removed but reported as [`StoreError::KeyNotFound`].
    pub fn del<K: Any>(&self, key: K) -> Result<(), StoreError> {
        self.inner.del(&coerce_key(&key)?)
    }

    /// Returns a copy of the entry for `key`, without checking expiry.
    pub fn get<K: Any>(&self, key: K) -> Result<DynEntry, StoreError> {
        self.inner.get(&coerce_key(&key)?)
    }

    /// Replaces the value in place; `ttl` and `updated_at` are untouched.
    pub fn set_value<K, V>(&self, key: K, value: V) -> Result<(), StoreError>
    where
        K: Any,
        V: Any + Send + Sync,
    {
        self.inner.set_value(&coerce_key(&key)?, Arc::new(value))
    }

    /// Replaces the TTL, optionally restarting the expiry window.
    pub fn set_ttl<K: Any>(
        &self,
        key: K,
        ttl: Duration,
        reset_update_time: bool,
    ) -> Result<(), StoreError> {
        self.inner.set_ttl(&coerce_key(&key)?, ttl, reset_update_time)
    }

    /// Replaces the expiry callback used by future sweeps.
    pub fn set_callback<K: Any>(
        &self,
        key: K,
        on_expire: Option<DynExpireCallback>,
    ) -> Result<(), StoreError> {
        self.inner.set_callback(&coerce_key(&key)?, on_expire)
    }

    /// Invokes `visit` once per stored entry, expired-but-unswept included.
    pub fn for_each<F>(&self, visit: F)
    where
        F: FnMut(DynEntry),
    {
        self.inner.for_each(visit);
    }

    /// Atomically removes every entry without firing callbacks.
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Signals the background sweeper to exit. Idempotent.
    pub fn stop(&self) {
        self.inner.stop();
    }

    /// Whether the background sweeper is still running.
    pub fn is_running(&self) -> bool {
        self.inner.is_running()
    }
}
