//! Callback registries with detachable subscriptions.
//!
//! Callbacks are invoked in registration order on the task that emits. The
//! registry lock is released before any callback runs, so a callback may
//! subscribe or unsubscribe (itself included) without deadlocking; such
//! changes take effect from the next emission.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    entries: BTreeMap<u64, Callback<T>>,
}

trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

impl<T: 'static> Detach for Mutex<Registry<T>> {
    fn detach(&self, id: u64) {
        let _ = self.lock().entries.remove(&id);
    }
}

/// Ordered set of callbacks receiving `&T`.
pub struct Observers<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> Observers<T> {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                entries: BTreeMap::new(),
            })),
        }
    }

    /// Register `callback`; it stays registered until the returned
    /// [`Subscription`] is unsubscribed.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut registry = self.registry.lock();
            registry.next_id += 1;
            let id = registry.next_id;
            let _ = registry.entries.insert(id, Arc::new(callback));
            id
        };
        let handle: Arc<dyn Detach> = self.registry.clone();
        Subscription {
            registry: Arc::downgrade(&handle),
            id,
        }
    }

    /// Invoke every registered callback with `value`.
    pub fn emit(&self, value: &T) {
        let callbacks: Vec<Callback<T>> = self.registry.lock().entries.values().cloned().collect();
        for callback in callbacks {
            callback(value);
        }
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.registry.lock().entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to one registered callback.
///
/// Dropping the handle leaves the callback registered.
#[derive(Clone)]
pub struct Subscription {
    registry: Weak<dyn Detach>,
    id: u64,
}

impl Subscription {
    /// Remove the callback. Idempotent, and a no-op once the owning client
    /// is gone.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.detach(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
