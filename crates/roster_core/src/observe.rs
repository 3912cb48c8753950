//! Callback registry with cancellable subscriptions.
//!
//! # Responsibility
//! - Keep the set of live observers for one published value type.
//! - Hand out `Subscription` handles that unregister on cancel or drop.
//!
//! # Invariants
//! - Callbacks run outside the registry lock, so a callback may cancel its
//!   own (or any other) subscription.
//! - A cancelled subscription never receives another value.

use parking_lot::Mutex;
use std::borrow::Borrow;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T: ?Sized> {
    next_id: u64,
    entries: Vec<(u64, Callback<T>)>,
}

/// Observer list for values of type `T`.
#[allow(clippy::len_without_is_empty)]
pub struct Observers<T: ?Sized> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: ?Sized + 'static> Observers<T> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Registers `callback` and immediately delivers `initial` to it alone.
    pub fn subscribe_with(
        &self,
        initial: &T,
        callback: impl Fn(&T) + Send + Sync + 'static,
    ) -> Subscription {
        let (callback, subscription) = self.subscribe_arc(Arc::new(callback));
        callback(initial);
        subscription
    }

    /// Registers `callback`, then reads `latest` and delivers it.
    ///
    /// Reading after registration means a value published concurrently is
    /// either part of `latest` or delivered through `notify`; it is never
    /// lost between the two.
    pub fn subscribe_with_latest<V: Borrow<T>>(
        &self,
        latest: impl FnOnce() -> V,
        callback: impl Fn(&T) + Send + Sync + 'static,
    ) -> Subscription {
        let (callback, subscription) = self.subscribe_arc(Arc::new(callback));
        let value = latest();
        callback(value.borrow());
        subscription
    }

    /// Delivers `value` to every registered observer.
    pub fn notify(&self, value: &T) {
        let callbacks: Vec<Callback<T>> = {
            let registry = self.registry.lock();
            registry
                .entries
                .iter()
                .map(|(_, callback)| Arc::clone(callback))
                .collect()
        };
        for callback in callbacks {
            callback(value);
        }
    }

    pub fn len(&self) -> usize {
        self.registry.lock().entries.len()
    }

    fn subscribe_arc(&self, callback: Callback<T>) -> (Callback<T>, Subscription) {
        let id = {
            let mut registry = self.registry.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push((id, Arc::clone(&callback)));
            id
        };

        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.registry);
        let subscription = Subscription::new(move || {
            if let Some(registry) = weak.upgrade() {
                registry.lock().entries.retain(|(entry_id, _)| *entry_id != id);
            }
        });
        (callback, subscription)
    }
}

impl<T: ?Sized + 'static> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a registered observer. Dropping it unsubscribes.
#[must_use = "dropping a Subscription cancels it immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stops delivery. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
