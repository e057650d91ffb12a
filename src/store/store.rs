use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, trace};

use super::builder::{Equality, StoreBuilder};
use super::subscription::{SubscriptionId, Unsubscribe};

type Subscriber<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// State shared by every clone of a [`Store`] and weakly by its handles.
pub(crate) struct Shared<T> {
    initial: T,
    state: RwLock<Arc<T>>,
    subscribers: RwLock<Vec<(SubscriptionId, Subscriber<T>)>>,
    equality: Equality<T>,
    name: Option<String>,
    next_id: AtomicU64,
}

// Caller code never runs under a write lock, so a poisoned lock still
// guards a consistent value.
fn read<L>(lock: &RwLock<L>) -> RwLockReadGuard<'_, L> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<L>(lock: &RwLock<L>) -> RwLockWriteGuard<'_, L> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl<T> Shared<T> {
    pub(crate) fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("anonymous")
    }

    fn current(&self) -> Arc<T> {
        Arc::clone(&read(&self.state))
    }

    pub(crate) fn contains(&self, id: SubscriptionId) -> bool {
        read(&self.subscribers).iter().any(|(sid, _)| *sid == id)
    }

    /// Remove one registration. Returns `false` if it was not present.
    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let removed = {
            let mut subscribers = write(&self.subscribers);
            subscribers
                .iter()
                .position(|(sid, _)| *sid == id)
                .map(|idx| subscribers.remove(idx))
        };
        // The callback is dropped here, outside the lock.
        removed.is_some()
    }

    /// Run one notification pass over a snapshot of the subscriber list.
    ///
    /// Each subscriber receives the value current at the moment it is
    /// called, so a re-entrant `set` from an earlier subscriber is visible
    /// to the later ones.
    fn notify(&self) {
        let snapshot: Vec<Subscriber<T>> = read(&self.subscribers)
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();

        trace!(
            store = self.label(),
            subscribers = snapshot.len(),
            "notifying subscribers"
        );

        for subscriber in snapshot {
            let value = self.current();
            subscriber(&*value);
        }
    }
}

/// An observable container for a single value.
///
/// Subscribers are called synchronously, in registration order, every time
/// the value changes. Whether a new value counts as a change is decided by
/// the store's equality policy (`PartialEq` unless configured otherwise).
///
/// Cloning a store yields another handle to the same value and subscribers.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use watchbox::Store;
///
/// let store = Store::new("a");
/// let log = Arc::new(Mutex::new(Vec::new()));
///
/// let sink = Arc::clone(&log);
/// store.subscribe(move |v| sink.lock().unwrap().push(*v));
///
/// store.set("b");
/// store.set("b");
/// store.set("c");
///
/// assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
/// ```
pub struct Store<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone + PartialEq + 'static> Store<T> {
    /// Create a new store with the given initial value.
    ///
    /// Changes are detected with `PartialEq`.
    pub fn new(initial: T) -> Self {
        StoreBuilder::new(initial).build()
    }

    /// Start configuring a store with the given initial value.
    pub fn builder(initial: T) -> StoreBuilder<T> {
        StoreBuilder::new(initial)
    }
}

impl<T: Clone + 'static> Store<T> {
    /// Create a store whose change detection uses `equality`.
    ///
    /// `equality(current, candidate)` returning `true` means the candidate is
    /// treated as unchanged. Pass `Arc::ptr_eq` for identity comparison.
    pub fn with_equality<F>(initial: T, equality: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        StoreBuilder::with_equality(initial, equality).build()
    }
}

impl<T: Clone> Store<T> {
    pub(crate) fn from_parts(initial: T, equality: Equality<T>, name: Option<String>) -> Self {
        let state = Arc::new(initial.clone());
        Self {
            shared: Arc::new(Shared {
                initial,
                state: RwLock::new(state),
                subscribers: RwLock::new(Vec::new()),
                equality,
                name,
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        T::clone(&self.shared.current())
    }

    /// Read the current value without cloning it.
    ///
    /// `f` runs while the value is read-locked; it must not write to this
    /// store.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        let state = read(&self.shared.state);
        f(&**state)
    }

    /// Set a new value.
    ///
    /// If the value differs from the current one under the store's equality
    /// policy, it is stored and every subscriber is notified. Otherwise
    /// nothing happens.
    pub fn set(&self, new_value: T) {
        let new_value = Arc::new(new_value);
        let replaced = loop {
            let current = self.shared.current();
            if (self.shared.equality)(&*current, &*new_value) {
                trace!(store = self.shared.label(), "value unchanged");
                return;
            }

            let mut state = write(&self.shared.state);
            // Another writer got in between the check and the swap: compare again.
            if Arc::ptr_eq(&*state, &current) {
                break std::mem::replace(&mut *state, Arc::clone(&new_value));
            }
        };
        // The old value is dropped outside the lock.
        drop(replaced);

        trace!(store = self.shared.label(), "value changed");
        self.shared.notify();
    }

    /// Replace the value with `f(current)`.
    ///
    /// `f` is called exactly once; its result goes through [`set`](Store::set).
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let current = self.shared.current();
        self.set(f(&*current));
    }

    /// Like [`update`](Store::update), but `f` may fail.
    ///
    /// On error the store is left untouched and the error is returned.
    pub fn try_update<F, E>(&self, f: F) -> Result<(), E>
    where
        F: FnOnce(&T) -> Result<T, E>,
    {
        let current = self.shared.current();
        let next = f(&*current)?;
        self.set(next);
        Ok(())
    }

    /// Mutate a copy of the current value and submit it through
    /// [`set`](Store::set).
    pub fn modify<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        let mut next = self.get();
        f(&mut next);
        self.set(next);
    }

    /// Restore the value the store was created with.
    pub fn reset(&self) {
        self.set(self.shared.initial.clone());
    }

    /// Subscribe to value changes.
    ///
    /// The callback is called once immediately with the current value, then
    /// again after every change. The returned handle removes exactly this
    /// registration.
    pub fn subscribe<F>(&self, callback: F) -> Unsubscribe<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let callback: Subscriber<T> = Arc::new(callback);
        write(&self.shared.subscribers).push((id, Arc::clone(&callback)));
        debug!(store = self.shared.label(), %id, "subscribed");

        let value = self.shared.current();
        callback(&*value);

        Unsubscribe::new(id, Arc::downgrade(&self.shared))
    }

    /// Number of active registrations.
    pub fn subscriber_count(&self) -> usize {
        read(&self.shared.subscribers).len()
    }

    /// The name given to this store, if any.
    pub fn name(&self) -> Option<&str> {
        self.shared.name.as_deref()
    }
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.shared.name)
            .field("value", &self.shared.current())
            .field("subscribers", &read(&self.shared.subscribers).len())
            .finish()
    }
}
