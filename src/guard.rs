use std::sync::Arc;

use crate::KeyedMutex;

/// An RAII implementation of a scoped per-key lock. When this structure is
/// dropped (falls out of scope), the key is unlocked.
pub struct Guard<'m, K, M: KeyedMutex<K>> {
    mutex: &'m M,
    key: K,
}

impl<'m, K, M: KeyedMutex<K>> Guard<'m, K, M> {
    pub(crate) fn new(mutex: &'m M, key: K) -> Self {
        Self { mutex, key }
    }
}

impl<K, M: KeyedMutex<K>> Drop for Guard<'_, K, M> {
    fn drop(&mut self) {
        self.mutex.unlock(&self.key);
    }
}

/// An RAII implementation of a scoped per-key lock that keeps its own handle
/// to the mutex, so it can outlive the borrow it was created from and move
/// across threads. The key is unlocked on drop.
pub struct OwnedGuard<K, M: KeyedMutex<K>> {
    mutex: Arc<M>,
    key: K,
}

impl<K, M: KeyedMutex<K>> OwnedGuard<K, M> {
    pub(crate) fn new(mutex: Arc<M>, key: K) -> Self {
        Self { mutex, key }
    }
}

impl<K, M: KeyedMutex<K>> Drop for OwnedGuard<K, M> {
    fn drop(&mut self) {
        self.mutex.unlock(&self.key);
    }
}
