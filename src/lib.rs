//! # ttlmap - A Self-Cleaning In-Memory TTL Cache
//!
//! `ttlmap` is an embeddable, generic key-value store where every entry
//! carries an optional time-to-live and an optional callback fired at expiry.
//! A background sweeper task evicts stale entries on a fixed interval, so the
//! cache cleans itself without an external cache service.
//!
//! ## Features
//!
//! - **Generic**: keys are any `Eq + Hash + Clone` type, values any `Clone` type
//! - **Per-Entry TTL**: `Duration::ZERO` pins an entry forever; anything else
//!   expires it after its window elapses
//! - **Expiry Callbacks**: each entry may register a callback invoked exactly
//!   once when a sweep evicts it
//! - **Background Sweeping**: a single tokio task scans on a configurable
//!   interval (default 800 ms) with idempotent stop and stop-on-drop
//! - **Dynamic Keys**: [`DynCacheMap`] accepts mixed runtime key types with a
//!   validated allow-list, for callers who need one map across types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     CacheMap<K, V>                      │
//! │                                                         │
//! │   callers ──┐                                           │
//! │             ▼                                           │
//! │  ┌──────────────────────┐      ┌────────────────────┐   │
//! │  │     Store<K, V>      │◀─────│      Sweeper       │   │
//! │  │ RwLock<HashMap<K,    │ scan │ (background tokio  │   │
//! │  │       Entry<K, V>>>  │      │  task, watch-based │   │
//! │  └──────────────────────┘      │  shutdown)         │   │
//! │                                └────────────────────┘   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! All operations, and the sweeper's eviction pass, go through the store's
//! reader/writer lock. Reads never filter expired entries; eviction happens
//! only at sweep boundaries. That sweep lag is part of the contract: an entry
//! whose TTL elapsed but which has not been swept yet stays visible to `get`
//! and `for_each` until the next pass.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ttlmap::{CacheMap, Options};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache: CacheMap<String, String> = CacheMap::with_options(
//!         Options::default().with_sweep_interval(Duration::from_millis(100)),
//!     );
//!
//!     // Entry that expires after 5 seconds, with an eviction callback.
//!     cache
//!         .add(
//!             "session:1".to_owned(),
//!             "alice".to_owned(),
//!             Duration::from_secs(5),
//!             Some(Arc::new(|entry| {
//!                 println!("evicted {} = {}", entry.key, entry.value);
//!             })),
//!         )
//!         .unwrap();
//!
//!     // Entry that never expires.
//!     cache
//!         .add("config".to_owned(), "v2".to_owned(), Duration::ZERO, None)
//!         .unwrap();
//!
//!     assert_eq!(cache.get(&"session:1".to_owned()).unwrap().value, "alice");
//!
//!     // Halt background sweeping; manual operations keep working.
//!     cache.stop();
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`store`]: the guarded map, its operations, and the background sweeper
//! - [`dynamic`]: the runtime-typed key layer with allow-list validation
//!
//! ## Hazards Worth Knowing
//!
//! Expiry callbacks execute synchronously while the sweep holds the write
//! lock. A callback that blocks stalls every store operation until it
//! returns, and a callback that calls back into the same map deadlocks. A
//! panic inside a callback is not contained and will poison the store's lock.

pub mod dynamic;
pub mod store;

// Re-export commonly used types for convenience
pub use dynamic::{DynCacheMap, DynEntry, DynExpireCallback, DynKey, DynValue};
pub use store::{
    CacheMap, Entry, ExpireCallback, Options, Store, StoreError, Sweeper, DEFAULT_SWEEP_INTERVAL,
};

/// Version of ttlmap
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
