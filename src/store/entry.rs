//! The stored unit: key, value, TTL, last-update timestamp, expiry callback.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Callback invoked when an entry is evicted by a sweep.
///
/// The callback receives an owned copy of the evicted entry. It runs
/// synchronously inside the sweeper's write-lock critical section, so it must
/// not call back into operations on the same store (that would deadlock) and
/// a slow callback stalls all other store access until it returns.
pub type ExpireCallback<K, V> = Arc<dyn Fn(Entry<K, V>) + Send + Sync>;

/// A single cached entry.
///
/// An entry with `ttl == Duration::ZERO` never expires. Otherwise it is
/// *logically expired* once `updated_at + ttl` is strictly in the past;
/// logically expired entries stay visible to [`get`](crate::store::Store::get)
/// and [`for_each`](crate::store::Store::for_each) until the next sweep
/// physically removes them.
pub struct Entry<K, V> {
    /// The key this entry is stored under.
    pub key: K,
    /// The cached payload.
    pub value: V,
    /// Time-to-live measured from `updated_at`. `Duration::ZERO` disables expiry.
    pub ttl: Duration,
    /// When the entry was created or last had its expiry window restarted.
    pub updated_at: Instant,
    pub(crate) on_expire: Option<ExpireCallback<K, V>>,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(key: K, value: V, ttl: Duration, on_expire: Option<ExpireCallback<K, V>>) -> Self {
        Self {
            key,
            value,
            ttl,
            updated_at: Instant::now(),
            on_expire,
        }
    }

    /// Checks whether this entry is logically expired.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Expiry check against a caller-supplied clock reading, so a whole sweep
    /// pass compares every entry to the same instant.
    #[inline]
    pub(crate) fn is_expired_at(&self, now: Instant) -> bool {
        self.ttl > Duration::ZERO && self.updated_at + self.ttl < now
    }

    /// The instant at which this entry expires, or `None` if it never does.
    pub fn expires_at(&self) -> Option<Instant> {
        (self.ttl > Duration::ZERO).then(|| self.updated_at + self.ttl)
    }
}

impl<K: Clone, V: Clone> Clone for Entry<K, V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            value: self.value.clone(),
            ttl: self.ttl,
            updated_at: self.updated_at,
            on_expire: self.on_expire.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Entry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("ttl", &self.ttl)
            .field("updated_at", &self.updated_at)
            .field("on_expire", &self.on_expire.as_ref().map(|_| ".."))
            .finish()
    }
}
