use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::lock_api::RawMutex as _;
use parking_lot::RawMutex;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use crate::guard::{Guard, OwnedGuard};
use crate::KeyedMutex;

/// A keyed mutex backed by a concurrent map of per-key lock objects.
///
/// Each currently held key maps to its own exclusive lock object, created on
/// acquisition and removed on release. Contention for a key is resolved by
/// contending on that key's private lock, so releasing a key wakes only the
/// threads waiting for that key; unrelated keys share nothing but the map's
/// internal sharding.
///
/// A waiter that acquires a lock object just as its entry is being torn down
/// discards the stale acquisition and retries, so an acquisition may take a
/// small number of attempts under churn on the same key.
pub struct StripedMutex<K> {
    table: DashMap<K, Arc<RawMutex>>,
}

impl<K: Eq + Hash + Clone + Debug> StripedMutex<K> {
    /// Creates a new `StripedMutex` with no keys held.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: DashMap::new(),
        }
    }

    /// Acquires `key` and returns an RAII guard releasing it on drop.
    pub fn guard(&self, key: K) -> Guard<'_, K, Self> {
        self.lock(key.clone());
        Guard::new(self, key)
    }

    /// Acquires `key` and returns a guard holding its own handle to the
    /// mutex, for use with `Arc<StripedMutex>` across threads.
    pub fn guard_owned(self: &Arc<Self>, key: K) -> OwnedGuard<K, Self> {
        self.lock(key.clone());
        OwnedGuard::new(Arc::clone(self), key)
    }

    #[cfg(test)]
    fn table_len(&self) -> usize {
        self.table.len()
    }
}

impl<K: Eq + Hash + Clone + Debug> Default for StripedMutex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone + Debug> KeyedMutex<K> for StripedMutex<K> {
    fn lock(&self, key: K) {
        loop {
            let current = match self.table.entry(key.clone()) {
                Entry::Vacant(slot) => {
                    // Acquire before publishing: the moment the entry is
                    // visible, other callers may contend on it.
                    let fresh = Arc::new(RawMutex::INIT);
                    fresh.lock();
                    slot.insert(fresh);
                    return;
                }
                Entry::Occupied(slot) => Arc::clone(slot.get()),
            };

            // The entry's shard lock is released above; blocking on the key
            // lock while holding it would deadlock against an unlock removing
            // the entry on the same shard.
            current.lock();

            let authoritative = self
                .table
                .get(&key)
                .map_or(false, |entry| Arc::ptr_eq(entry.value(), &current));
            if authoritative {
                return;
            }

            // The holder removed the entry (and another caller may have
            // installed a replacement) while this thread slept, so the lock
            // it acquired no longer stands for `key`. Discard it and retry.
            //
            // SAFETY: paired with the successful `current.lock()` above.
            unsafe { current.unlock() };
        }
    }

    fn unlock(&self, key: &K) {
        // Remove before releasing, so a waiter waking on this object cannot
        // observe a stale entry and conclude it holds the key.
        let Some((_, raw)) = self.table.remove(key) else {
            panic!("unlock of key {:?} that is not locked", key);
        };
        // SAFETY: an entry is present exactly while some caller holds the
        // key, so `raw` is locked by the acquisition being released here.
        unsafe { raw.unlock() };
    }
}
