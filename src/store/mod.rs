//! TTL Store Module
//!
//! The engine of the crate: a guarded map with per-entry TTLs plus the
//! background sweeper that evicts stale entries and fires their callbacks.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                CacheMap<K, V>                │
//! │                                              │
//! │  ┌─────────────────────┐   ┌─────────────┐   │
//! │  │     Store<K, V>     │◀──│   Sweeper   │   │
//! │  │ RwLock<HashMap<..>> │   │ (tokio task)│   │
//! │  └─────────────────────┘   └─────────────┘   │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! [`Store`] carries the operations, [`Sweeper`] the eviction loop, and
//! [`CacheMap`] ties one of each together with start/stop lifecycle.

pub mod entry;
pub mod error;
pub mod map;
pub mod sweeper;

pub use entry::{Entry, ExpireCallback};
pub use error::StoreError;
pub use map::{CacheMap, Store};
pub use sweeper::{Options, Sweeper, DEFAULT_SWEEP_INTERVAL};
