//! Thread-Safe TTL Store
//!
//! This module implements the core of the crate: a guarded map from keys to
//! [`Entry`] values, plus the [`CacheMap`] handle that pairs a store with its
//! background sweeper.
//!
//! ## Concurrency Model
//!
//! A single `RwLock` guards the whole map:
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                 Store<K, V>                   │
//! │        RwLock<HashMap<K, Entry<K, V>>>        │
//! │                                               │
//! │   readers: get, for_each, len                 │
//! │   writers: add, del, set_value, set_ttl,      │
//! │            set_callback, clear, sweep_expired │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Every operation holds the lock for its full duration, so no operation
//! partially applies under contention: once a mutation returns, every later
//! lock-acquirer observes it. Lock hold times are bounded by a single map scan
//! or a single-entry mutation.
//!
//! ## Expiry Is Sweep-Driven
//!
//! Reads do **not** filter expired entries. An entry whose TTL window has
//! elapsed stays visible to `get` and `for_each` until the next sweep removes
//! it. The one exception is `del`: deleting a logically expired entry removes
//! it but reports [`StoreError::KeyNotFound`], telling the caller the state it
//! destroyed was already stale.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::store::entry::{Entry, ExpireCallback};
use crate::store::error::StoreError;
use crate::store::sweeper::{Options, Sweeper};

/// The guarded mapping from keys to entries.
///
/// `Store` is the engine without a lifecycle: it never spawns anything and can
/// be used standalone (call [`sweep_expired`](Store::sweep_expired) yourself)
/// or wrapped in a [`CacheMap`], which runs the sweep on a background task.
///
/// # Example
///
/// ```
/// use ttlmap::Store;
/// use std::time::Duration;
///
/// let store: Store<&str, u32> = Store::new();
///
/// store.add("answer", 42, Duration::ZERO, None).unwrap();
/// assert_eq!(store.get(&"answer").unwrap().value, 42);
///
/// store.del(&"answer").unwrap();
/// assert!(store.is_empty());
/// ```
pub struct Store<K, V> {
    entries: RwLock<HashMap<K, Entry<K, V>>>,
}

impl<K, V> fmt::Debug for Store<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("entries", &self.entries.read().unwrap().len())
            .finish()
    }
}

impl<K, V> Default for Store<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Store<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a new entry with `updated_at` set to now.
    ///
    /// `add` never overwrites: if the key is already present the call fails
    /// with [`StoreError::KeyExists`], even when the existing entry is
    /// logically expired. Overwriting requires `del` then `add`, or
    /// [`set_value`](Store::set_value).
    ///
    /// A `ttl` of `Duration::ZERO` means the entry never expires. `on_expire`,
    /// if given, is invoked exactly once when a sweep evicts the entry (not on
    /// explicit deletion, and not on [`clear`](Store::clear)). The callback
    /// runs while the sweep holds the write lock; it must not reenter
    /// operations on this store.
    pub fn add(
        &self,
        key: K,
        value: V,
        ttl: Duration,
        on_expire: Option<ExpireCallback<K, V>>,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap();
        if entries.contains_key(&key) {
            return Err(StoreError::KeyExists);
        }
        entries.insert(key.clone(), Entry::new(key, value, ttl, on_expire));
        Ok(())
    }

    /// Removes the entry for `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(())` if a live entry was removed.
    /// - [`StoreError::KeyNotFound`] if the key was absent, **or** if the
    ///   entry was present but logically expired — the stale entry is still
    ///   removed, but the call reports a miss.
    pub fn del(&self, key: &K) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap();
        match entries.remove(key) {
            Some(entry) if entry.is_expired() => Err(StoreError::KeyNotFound),
            Some(_) => Ok(()),
            None => Err(StoreError::KeyNotFound),
        }
    }

    /// Returns a copy of the entry for `key`.
    ///
    /// `get` does **not** check expiry: a logically-expired-but-not-yet-swept
    /// entry is returned as if valid. Use [`Entry::is_expired`] on the result
    /// if staleness matters to the caller.
    pub fn get(&self, key: &K) -> Result<Entry<K, V>, StoreError> {
        let entries = self.entries.read().unwrap();
        entries.get(key).cloned().ok_or(StoreError::KeyNotFound)
    }

    /// Replaces the value in place, leaving `ttl` and `updated_at` untouched.
    pub fn set_value(&self, key: &K, value: V) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap();
        match entries.get_mut(key) {
            Some(entry) => {
                entry.value = value;
                Ok(())
            }
            None => Err(StoreError::KeyNotFound),
        }
    }

    /// Replaces the TTL.
    ///
    /// With `reset_update_time` set, `updated_at` is also set to now, which
    /// restarts the expiry window; otherwise the new TTL is measured against
    /// the existing `updated_at` (and can make the entry logically expired
    /// immediately).
    pub fn set_ttl(&self, key: &K, ttl: Duration, reset_update_time: bool) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap();
        match entries.get_mut(key) {
            Some(entry) => {
                entry.ttl = ttl;
                if reset_update_time {
                    entry.updated_at = Instant::now();
                }
                Ok(())
            }
            None => Err(StoreError::KeyNotFound),
        }
    }

    /// Replaces the expiry callback used by future sweeps. `None` clears it.
    pub fn set_callback(
        &self,
        key: &K,
        on_expire: Option<ExpireCallback<K, V>>,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap();
        match entries.get_mut(key) {
            Some(entry) => {
                entry.on_expire = on_expire;
                Ok(())
            }
            None => Err(StoreError::KeyNotFound),
        }
    }

    /// Invokes `visit` once per stored entry, with a copy of each.
    ///
    /// Runs under the read lock, in unspecified order, and includes
    /// logically-expired-but-not-yet-swept entries. `visit` must not reenter
    /// mutating operations on this store.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(Entry<K, V>),
    {
        let entries = self.entries.read().unwrap();
        for entry in entries.values() {
            visit(entry.clone());
        }
    }

    /// Atomically removes every entry.
    ///
    /// No expiry callbacks fire, even for entries that were already logically
    /// expired: `clear` is a hard reset, distinct from expiry.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap();
        entries.clear();
    }

    /// Returns the number of stored entries, expired-but-unswept included.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs one eviction pass over the whole map.
    ///
    /// Holds the write lock for the entire scan. Every entry with a positive
    /// TTL whose deadline is strictly in the past has its `on_expire` callback
    /// invoked synchronously with a copy of the entry, then is removed. All
    /// entries are compared against a single clock reading taken at the start
    /// of the pass.
    ///
    /// Called by the background sweeper; also usable directly on a standalone
    /// store.
    ///
    /// # Returns
    ///
    /// The number of entries evicted.
    pub fn sweep_expired(&self) -> usize {
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        let now = Instant::now();

        entries.retain(|_, entry| {
            if entry.is_expired_at(now) {
                if let Some(on_expire) = &entry.on_expire {
                    on_expire(entry.clone());
                }
                false
            } else {
                true
            }
        });

        before - entries.len()
    }
}

/// The caller-facing handle: a [`Store`] plus its sweeper's lifecycle.
///
/// Construction spawns the background sweeper (a tokio task, so a runtime must
/// be available); [`stop`](CacheMap::stop) halts it, and dropping the handle
/// stops it as well. After a stop, the store itself remains fully usable —
/// only automatic eviction ceases.
///
/// `CacheMap` derefs to [`Store`], so the whole operation surface is available
/// directly on the handle.
///
/// # Example
///
/// ```no_run
/// use ttlmap::{CacheMap, Options};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let sessions: CacheMap<String, String> = CacheMap::with_options(
///         Options::default().with_sweep_interval(Duration::from_millis(100)),
///     );
///
///     sessions
///         .add("sid:1".to_owned(), "alice".to_owned(), Duration::from_secs(30), None)
///         .unwrap();
///
///     assert_eq!(sessions.get(&"sid:1".to_owned()).unwrap().value, "alice");
///
///     sessions.stop();
/// }
/// ```
pub struct CacheMap<K, V> {
    store: Arc<Store<K, V>>,
    sweeper: Sweeper,
}

impl<K, V> fmt::Debug for CacheMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheMap")
            .field("entries", &self.store.entries.read().unwrap().len())
            .field("running", &self.sweeper.is_running())
            .finish()
    }
}

impl<K, V> CacheMap<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a map with the default sweep interval and starts its sweeper.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    /// Creates a map with the given options and starts its sweeper.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_options(options: Options) -> Self {
        let store = Arc::new(Store::new());
        let sweeper = Sweeper::start(Arc::clone(&store), options);
        Self { store, sweeper }
    }

    /// Returns a shared handle to the underlying store, usable from other
    /// tasks or threads independently of this handle's lifetime.
    pub fn store(&self) -> Arc<Store<K, V>> {
        Arc::clone(&self.store)
    }

    /// Signals the background sweeper to exit.
    ///
    /// Idempotent: calling `stop` again after the first call is a no-op. The
    /// sweeper exits at its next wait point without a final sweep; once
    /// stopped, expired entries are never evicted automatically again, though
    /// every manual operation (including [`sweep_expired`](Store::sweep_expired))
    /// keeps working.
    pub fn stop(&self) {
        self.sweeper.stop();
    }

    /// Whether the background sweeper is still running.
    pub fn is_running(&self) -> bool {
        self.sweeper.is_running()
    }
}

impl<K, V> Default for CacheMap<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Deref for CacheMap<K, V> {
    type Target = Store<K, V>;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::thread;

    fn counting_callback<K, V>(hits: &Arc<AtomicUsize>) -> ExpireCallback<K, V> {
        let hits = Arc::clone(hits);
        Arc::new(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn add_then_get_roundtrip() {
        let store: Store<String, u32> = Store::new();
        store.add("a".to_owned(), 1, Duration::ZERO, None).unwrap();

        let entry = store.get(&"a".to_owned()).unwrap();
        assert_eq!(entry.key, "a");
        assert_eq!(entry.value, 1);
        assert_eq!(entry.ttl, Duration::ZERO);

        // Same contract for non-string key types.
        let ints: Store<i64, &str> = Store::new();
        ints.add(-7, "neg", Duration::ZERO, None).unwrap();
        assert_eq!(ints.get(&-7).unwrap().value, "neg");

        let pairs: Store<(u8, bool), u8> = Store::new();
        pairs.add((1, true), 9, Duration::ZERO, None).unwrap();
        assert_eq!(pairs.get(&(1, true)).unwrap().value, 9);
    }

    #[test]
    fn add_existing_key_fails_and_preserves_original() {
        let store: Store<&str, u32> = Store::new();
        store.add("k", 1, Duration::ZERO, None).unwrap();

        let err = store.add("k", 2, Duration::from_secs(5), None).unwrap_err();
        assert_eq!(err, StoreError::KeyExists);

        let entry = store.get(&"k").unwrap();
        assert_eq!(entry.value, 1);
        assert_eq!(entry.ttl, Duration::ZERO);
    }

    #[test]
    fn add_fails_even_when_existing_entry_is_expired() {
        let store: Store<&str, u32> = Store::new();
        store.add("k", 1, Duration::from_millis(1), None).unwrap();
        thread::sleep(Duration::from_millis(10));

        assert!(store.get(&"k").unwrap().is_expired());
        assert_eq!(store.add("k", 2, Duration::ZERO, None), Err(StoreError::KeyExists));
    }

    #[test]
    fn operations_on_absent_key_fail_not_found() {
        let store: Store<&str, u32> = Store::new();

        assert_eq!(store.get(&"missing").unwrap_err(), StoreError::KeyNotFound);
        assert_eq!(store.del(&"missing").unwrap_err(), StoreError::KeyNotFound);
        assert_eq!(store.set_value(&"missing", 1).unwrap_err(), StoreError::KeyNotFound);
        assert_eq!(
            store.set_ttl(&"missing", Duration::from_secs(1), true).unwrap_err(),
            StoreError::KeyNotFound
        );
        assert_eq!(store.set_callback(&"missing", None).unwrap_err(), StoreError::KeyNotFound);

        assert!(store.is_empty());
    }

    #[test]
    fn del_of_expired_entry_removes_but_reports_miss() {
        let store: Store<&str, u32> = Store::new();
        store.add("stale", 1, Duration::from_millis(1), None).unwrap();
        thread::sleep(Duration::from_millis(10));

        assert_eq!(store.del(&"stale").unwrap_err(), StoreError::KeyNotFound);
        // Destructive: the entry is gone despite the miss report.
        assert!(store.is_empty());
    }

    #[test]
    fn del_of_live_entry_succeeds() {
        let store: Store<&str, u32> = Store::new();
        store.add("live", 1, Duration::from_secs(60), None).unwrap();
        assert!(store.del(&"live").is_ok());
        assert!(store.is_empty());
    }

    #[test]
    fn get_returns_logically_expired_entry() {
        let store: Store<&str, u32> = Store::new();
        store.add("stale", 7, Duration::from_millis(1), None).unwrap();
        thread::sleep(Duration::from_millis(10));

        let entry = store.get(&"stale").unwrap();
        assert_eq!(entry.value, 7);
        assert!(entry.is_expired());
    }

    #[test]
    fn set_value_does_not_touch_ttl_or_updated_at() {
        let store: Store<&str, u32> = Store::new();
        store.add("k", 1, Duration::from_secs(60), None).unwrap();
        let before = store.get(&"k").unwrap();

        store.set_value(&"k", 2).unwrap();

        let after = store.get(&"k").unwrap();
        assert_eq!(after.value, 2);
        assert_eq!(after.ttl, before.ttl);
        assert_eq!(after.updated_at, before.updated_at);
    }

    #[test]
    fn set_ttl_with_reset_restarts_expiry_window() {
        let store: Store<&str, u32> = Store::new();
        store.add("k", 1, Duration::from_millis(300), None).unwrap();

        thread::sleep(Duration::from_millis(200));
        store.set_ttl(&"k", Duration::from_millis(300), true).unwrap();

        // Past the original deadline but inside the restarted window.
        thread::sleep(Duration::from_millis(200));
        assert_eq!(store.sweep_expired(), 0);
        assert!(store.get(&"k").is_ok());

        // Past the restarted window too.
        thread::sleep(Duration::from_millis(200));
        assert_eq!(store.sweep_expired(), 1);
        assert_eq!(store.get(&"k").unwrap_err(), StoreError::KeyNotFound);
    }

    #[test]
    fn set_ttl_without_reset_measures_against_old_update_time() {
        let store: Store<&str, u32> = Store::new();
        store.add("k", 1, Duration::from_secs(60), None).unwrap();

        thread::sleep(Duration::from_millis(20));
        // Shrinking the TTL below the already-elapsed time expires the entry
        // immediately, because updated_at is left alone.
        store.set_ttl(&"k", Duration::from_millis(10), false).unwrap();

        assert_eq!(store.sweep_expired(), 1);
    }

    #[test]
    fn sweep_fires_callback_exactly_once_with_matching_copy() {
        let store: Store<String, u32> = Store::new();
        let seen: Arc<Mutex<Vec<(String, u32)>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_in_cb = Arc::clone(&seen);

        store
            .add(
                "k".to_owned(),
                42,
                Duration::from_millis(1),
                Some(Arc::new(move |entry: Entry<String, u32>| {
                    seen_in_cb.lock().unwrap().push((entry.key, entry.value));
                })),
            )
            .unwrap();

        thread::sleep(Duration::from_millis(10));
        assert_eq!(store.sweep_expired(), 1);
        assert_eq!(store.sweep_expired(), 0);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[("k".to_owned(), 42)]);
    }

    #[test]
    fn sweep_evicts_only_expired_entries() {
        let store: Store<String, u32> = Store::new();
        for i in 0..3 {
            store
                .add(format!("stale:{i}"), i, Duration::from_millis(1), None)
                .unwrap();
        }
        store.add("live".to_owned(), 9, Duration::from_secs(60), None).unwrap();
        store.add("pinned".to_owned(), 9, Duration::ZERO, None).unwrap();

        thread::sleep(Duration::from_millis(10));
        assert_eq!(store.sweep_expired(), 3);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn zero_ttl_entry_is_never_swept() {
        let store: Store<&str, u32> = Store::new();
        let hits = Arc::new(AtomicUsize::new(0));
        store
            .add("pinned", 1, Duration::ZERO, Some(counting_callback(&hits)))
            .unwrap();

        thread::sleep(Duration::from_millis(20));
        assert_eq!(store.sweep_expired(), 0);
        assert!(store.get(&"pinned").is_ok());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn for_each_visits_every_entry_including_expired() {
        let store: Store<String, u32> = Store::new();
        store.add("live".to_owned(), 1, Duration::from_secs(60), None).unwrap();
        store.add("stale".to_owned(), 2, Duration::from_millis(1), None).unwrap();
        thread::sleep(Duration::from_millis(10));

        let mut keys = Vec::new();
        store.for_each(|entry| keys.push(entry.key));
        keys.sort();
        assert_eq!(keys, vec!["live".to_owned(), "stale".to_owned()]);
    }

    #[test]
    fn clear_removes_everything_and_fires_no_callbacks() {
        let store: Store<String, u32> = Store::new();
        let hits = Arc::new(AtomicUsize::new(0));

        store
            .add("stale".to_owned(), 1, Duration::from_millis(1), Some(counting_callback(&hits)))
            .unwrap();
        store
            .add("live".to_owned(), 2, Duration::from_secs(60), Some(counting_callback(&hits)))
            .unwrap();
        thread::sleep(Duration::from_millis(10));

        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.sweep_expired(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn set_callback_replaces_callback_for_future_sweeps() {
        let store: Store<&str, u32> = Store::new();
        let original = Arc::new(AtomicUsize::new(0));
        let replacement = Arc::new(AtomicUsize::new(0));

        store
            .add("k", 1, Duration::from_millis(1), Some(counting_callback(&original)))
            .unwrap();
        store
            .set_callback(&"k", Some(counting_callback(&replacement)))
            .unwrap();

        thread::sleep(Duration::from_millis(10));
        assert_eq!(store.sweep_expired(), 1);
        assert_eq!(original.load(Ordering::SeqCst), 0);
        assert_eq!(replacement.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_adds_of_distinct_keys_lose_nothing() {
        let store: Arc<Store<String, usize>> = Arc::new(Store::new());
        let threads = 8;
        let keys_per_thread = 125;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..keys_per_thread {
                        store
                            .add(format!("key:{t}:{i}"), t * keys_per_thread + i, Duration::ZERO, None)
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), threads * keys_per_thread);
        for t in 0..threads {
            for i in 0..keys_per_thread {
                let entry = store.get(&format!("key:{t}:{i}")).unwrap();
                assert_eq!(entry.value, t * keys_per_thread + i);
            }
        }
    }

    #[test]
    fn concurrent_adds_of_same_key_race_first_writer_wins() {
        let store: Arc<Store<&str, usize>> = Arc::new(Store::new());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.add("contested", t, Duration::ZERO, None).is_ok())
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();

        assert_eq!(wins, 1);
        assert_eq!(store.len(), 1);
    }
}
