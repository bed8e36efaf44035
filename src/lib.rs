//! Per-key mutual exclusion.
//!
//! A keyed mutex lets callers lock and unlock arbitrary, runtime-known keys
//! (per-user, per-file, per-shard state) without allocating one mutex per key
//! up front and without serializing unrelated keys through a single global
//! lock.
//!
//! Two implementations of the same contract are provided:
//!
//! - [`RegistryMutex`]: one guard lock over the set of currently held keys,
//!   with a condition variable shared across all keys that is broadcast on
//!   every release. Compact, but every release wakes every waiter.
//! - [`StripedMutex`]: a concurrent map holding one private lock object per
//!   active key. A release only wakes waiters of that key, at the cost of a
//!   retry loop when a lock object is torn down mid-acquisition.
//!
//! Both implement [`KeyedMutex`], so callers can pick a strategy at
//! construction time and stay agnostic afterwards.

mod guard;
mod registry;
mod striped;

pub use guard::{Guard, OwnedGuard};
pub use registry::RegistryMutex;
pub use striped::StripedMutex;

/// Exclusive ownership of individual keys.
///
/// A key is either free or held by exactly one caller. Holding one key has no
/// effect on any other key.
pub trait KeyedMutex<K> {
    /// Blocks the calling thread until exclusive ownership of `key` is
    /// acquired. Never fails.
    ///
    /// There is no timeout and no fairness guarantee among waiters. Locking a
    /// key the calling thread already holds deadlocks, as with any
    /// non-reentrant mutex.
    fn lock(&self, key: K);

    /// Releases ownership of `key`.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not currently locked. This is a caller contract
    /// violation, not a recoverable condition.
    fn unlock(&self, key: &K);
}
