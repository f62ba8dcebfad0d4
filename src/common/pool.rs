//! Bounded object pool for per-call scratch storage.

use std::{
    ops::{Deref, DerefMut},
    sync::{Mutex, PoisonError},
};

/// Storage that can be emptied for reuse without giving back its allocation.
pub trait Reset {
    fn reset(&mut self);
}

/// Keeps up to `capacity` idle objects around for reuse.
///
/// Objects are reset when their guard drops, so a checkout never sees state
/// left by a previous caller, whichever way that caller exited.
pub struct Pool<T> {
    idle: Mutex<Vec<T>>,
    capacity: usize,
}

/// Checked-out pool object, returned to the pool on drop.
pub struct Pooled<'a, T: Reset + Default> {
    pool: &'a Pool<T>,
    item: T,
}

impl<T: Reset + Default> Pool<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn checkout(&self) -> Pooled<'_, T> {
        let item = self.idle.lock().unwrap_or_else(PoisonError::into_inner).pop().unwrap_or_default();
        Pooled {
            pool: self,
            item,
        }
    }

    /// Number of idle objects ready for checkout.
    pub fn idle(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl<T> Pool<T> {
    fn give_back(
        &self,
        item: T,
    ) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.capacity {
            idle.push(item);
        }
    }
}

impl<T: Reset + Default> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.item
    }
}

impl<T: Reset + Default> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.item
    }
}

impl<T: Reset + Default> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        let mut item = std::mem::take(&mut self.item);
        item.reset();
        self.pool.give_back(item);
    }
}
