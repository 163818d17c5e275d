//! Weak identity cache keyed by row id
//!
//! The cache never keeps an entity alive: it holds `Weak` references and a
//! lookup whose instance was dropped is a miss. Callers must never depend on
//! a hit for correctness.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};

/// Dead entries are purged on `put` once the map reaches this size.
const PURGE_THRESHOLD: usize = 256;

pub struct IdentityCache<T> {
    entries: Mutex<HashMap<i64, Weak<T>>>,
}

impl<T> Default for IdentityCache<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> IdentityCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: i64) -> Option<Arc<T>> {
        self.lock().get(id)
    }

    pub fn put(&self, id: i64, entity: &Arc<T>) {
        self.lock().put(id, entity);
    }

    pub fn remove(&self, id: i64) {
        self.lock().remove(id);
    }

    pub fn remove_all(&self, ids: impl IntoIterator<Item = i64>) {
        let mut guard = self.lock();
        for id in ids {
            guard.remove(id);
        }
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of entries, including ones whose instance was already dropped
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries whose instance is gone. Returns how many were removed.
    pub fn purge(&self) -> usize {
        self.lock().purge()
    }

    /// Hold the cache lock across several operations.
    pub fn lock(&self) -> CacheGuard<'_, T> {
        CacheGuard {
            entries: self.entries.lock(),
        }
    }
}

/// Cache operations for a caller that already holds the lock.
pub struct CacheGuard<'a, T> {
    entries: MutexGuard<'a, HashMap<i64, Weak<T>>>,
}

impl<T> CacheGuard<'_, T> {
    pub fn get(&self, id: i64) -> Option<Arc<T>> {
        self.entries.get(&id).and_then(Weak::upgrade)
    }

    pub fn put(&mut self, id: i64, entity: &Arc<T>) {
        if self.entries.len() >= PURGE_THRESHOLD {
            self.purge();
        }
        self.entries.insert(id, Arc::downgrade(entity));
    }

    pub fn remove(&mut self, id: i64) {
        self.entries.remove(&id);
    }

    pub fn purge(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, weak| weak.strong_count() > 0);
        before - self.entries.len()
    }
}
