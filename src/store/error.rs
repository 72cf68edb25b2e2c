//! Error taxonomy for store operations.
//!
//! Every fallible operation returns exactly one of these three kinds.
//! Nothing is retried or recovered internally; errors surface synchronously
//! to the immediate caller.

use thiserror::Error;

/// Errors returned by [`Store`](crate::store::Store) and
/// [`DynCacheMap`](crate::dynamic::DynCacheMap) operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The key's runtime type is not in the supported key-type set.
    ///
    /// Only produced by the dynamic layer ([`crate::dynamic`]); the generic
    /// [`Store`](crate::store::Store) rejects unusable key types at compile
    /// time via its `Eq + Hash` bound.
    #[error("invalid key type: {type_name}")]
    InvalidKeyType {
        /// Name of the rejected type, as reported by [`std::any::type_name`].
        type_name: &'static str,
    },

    /// The operation targeted a key absent from the store, or a key whose
    /// entry was logically expired at the moment of a `del` (the entry is
    /// still removed, but the call reports a miss).
    #[error("key not found")]
    KeyNotFound,

    /// `add` targeted a key already present, whether or not that entry is
    /// logically expired. `add` never overwrites.
    #[error("key already exists")]
    KeyExists,
}
