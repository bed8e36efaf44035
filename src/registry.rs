use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use crate::guard::{Guard, OwnedGuard};
use crate::KeyedMutex;

/// A keyed mutex backed by a single registry of held keys.
///
/// One guard lock protects the set of currently held keys; a key is locked by
/// inserting it and unlocked by removing it. Waiters park on a condition
/// variable shared across all keys and are broadcast-woken on every release,
/// so each of them re-checks its own key and most go back to sleep.
///
/// The guard lock is only held for the constant-time critical sections of
/// checking, inserting and removing a key, never for the duration the key
/// itself is held.
pub struct RegistryMutex<K> {
    held: Mutex<HashSet<K>>,
    released: Condvar,
}

impl<K: Eq + Hash + Debug> RegistryMutex<K> {
    /// Creates a new `RegistryMutex` with no keys held.
    #[must_use]
    pub fn new() -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
        }
    }

    /// Acquires `key` and returns an RAII guard releasing it on drop.
    pub fn guard(&self, key: K) -> Guard<'_, K, Self>
    where
        K: Clone,
    {
        self.lock(key.clone());
        Guard::new(self, key)
    }

    /// Acquires `key` and returns a guard holding its own handle to the
    /// mutex, for use with `Arc<RegistryMutex>` across threads.
    pub fn guard_owned(self: &Arc<Self>, key: K) -> OwnedGuard<K, Self>
    where
        K: Clone,
    {
        self.lock(key.clone());
        OwnedGuard::new(Arc::clone(self), key)
    }

    #[cfg(test)]
    fn registry_len(&self) -> usize {
        self.held.lock().len()
    }
}

impl<K: Eq + Hash + Debug> Default for RegistryMutex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Debug> KeyedMutex<K> for RegistryMutex<K> {
    fn lock(&self, key: K) {
        let mut held = self.held.lock();
        // Wait loop re-checks the predicate after every wakeup, spurious or
        // broadcast for an unrelated key.
        while held.contains(&key) {
            self.released.wait(&mut held);
        }
        held.insert(key);
    }

    fn unlock(&self, key: &K) {
        let mut held = self.held.lock();
        if !held.remove(key) {
            panic!(
                "unlock of key {:?} that is not locked (currently held: {:?})",
                key, *held
            );
        }
        // The condvar is shared across all keys, so every waiter must be
        // woken to find the one(s) waiting on this key.
        self.released.notify_all();
    }
}
