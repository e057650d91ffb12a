use std::fmt;
use std::sync::Weak;

use tracing::debug;

use super::store::Shared;
use crate::error::{Result, StoreError};

/// Opaque token identifying one registration made by [`Store::subscribe`].
///
/// Ids are unique per store and never reused, so removing a registration
/// can never hit another registration of the same callback.
///
/// [`Store::subscribe`]: crate::Store::subscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub(crate) u64);

impl SubscriptionId {
    /// Raw numeric value of the id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle returned by [`Store::subscribe`] that removes exactly one registration.
///
/// The handle only holds a weak reference to the store: it never keeps the
/// store alive, and unsubscribing after the store is gone does nothing.
/// Dropping the handle does **not** unsubscribe; use [`into_guard`] for that.
///
/// [`Store::subscribe`]: crate::Store::subscribe
/// [`into_guard`]: Unsubscribe::into_guard
pub struct Unsubscribe<T> {
    id: SubscriptionId,
    store: Weak<Shared<T>>,
}

impl<T> Unsubscribe<T> {
    pub(crate) fn new(id: SubscriptionId, store: Weak<Shared<T>>) -> Self {
        Self { id, store }
    }

    /// The registration this handle refers to.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Remove this registration from the store.
    ///
    /// Calling this more than once, or after the store has been dropped,
    /// is a no-op.
    pub fn unsubscribe(&self) {
        let _ = self.try_unsubscribe();
    }

    /// Remove this registration, reporting why nothing happened if it was
    /// already gone.
    pub fn try_unsubscribe(&self) -> Result<()> {
        let store = self.store.upgrade().ok_or(StoreError::Dropped)?;
        if store.remove(self.id) {
            debug!(store = store.label(), id = %self.id, "unsubscribed");
            Ok(())
        } else {
            Err(StoreError::NotSubscribed(self.id))
        }
    }

    /// Whether the registration is still present in a live store.
    pub fn is_active(&self) -> bool {
        self.store
            .upgrade()
            .is_some_and(|store| store.contains(self.id))
    }

    /// Turn this handle into a guard that unsubscribes when dropped.
    pub fn into_guard(self) -> SubscriptionGuard<T> {
        SubscriptionGuard {
            handle: self,
            armed: true,
        }
    }
}

impl<T> Clone for Unsubscribe<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            store: Weak::clone(&self.store),
        }
    }
}

impl<T> fmt::Debug for Unsubscribe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// RAII guard for a store subscription.
///
/// Unsubscribes the wrapped registration when dropped.
#[must_use = "dropping the guard unsubscribes immediately"]
pub struct SubscriptionGuard<T> {
    handle: Unsubscribe<T>,
    armed: bool,
}

impl<T> SubscriptionGuard<T> {
    /// The registration this guard owns.
    pub fn id(&self) -> SubscriptionId {
        self.handle.id()
    }

    /// Give up the guard without unsubscribing, returning the plain handle.
    pub fn disarm(mut self) -> Unsubscribe<T> {
        self.armed = false;
        self.handle.clone()
    }
}

impl<T> Drop for SubscriptionGuard<T> {
    fn drop(&mut self) {
        if self.armed {
            self.handle.unsubscribe();
        }
    }
}

impl<T> fmt::Debug for SubscriptionGuard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionGuard")
            .field("handle", &self.handle)
            .field("armed", &self.armed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::error::StoreError;
    use crate::Store;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn unsubscribe_is_idempotent() {
        let store = Store::new(0);
        let handle = store.subscribe(|_| {});

        assert!(handle.is_active());
        assert_eq!(handle.try_unsubscribe(), Ok(()));
        assert!(!handle.is_active());
        assert_eq!(
            handle.try_unsubscribe(),
            Err(StoreError::NotSubscribed(handle.id()))
        );

        // Silent form never complains
        handle.unsubscribe();
        handle.unsubscribe();
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn unsubscribe_after_store_dropped() {
        let store = Store::new(0);
        let handle = store.subscribe(|_| {});
        drop(store);

        assert!(!handle.is_active());
        assert_eq!(handle.try_unsubscribe(), Err(StoreError::Dropped));
        handle.unsubscribe();
    }

    #[test]
    fn cloned_handles_share_registration() {
        let store = Store::new(0);
        let handle = store.subscribe(|_| {});
        let other = handle.clone();

        other.unsubscribe();
        assert!(!handle.is_active());
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn guard_unsubscribes_on_drop() {
        let store = Store::new(0);
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        {
            let _guard = store
                .subscribe(move |_| {
                    call_count_clone.fetch_add(1, Ordering::SeqCst);
                })
                .into_guard();
            store.set(1);
            assert_eq!(store.subscriber_count(), 1);
        }

        store.set(2);
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn disarmed_guard_keeps_subscription() {
        let store = Store::new(0);
        let guard = store.subscribe(|_| {}).into_guard();
        let handle = guard.disarm();

        assert!(handle.is_active());
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn ids_are_unique_per_registration() {
        let store = Store::new(0);
        let a = store.subscribe(|_| {});
        let b = store.subscribe(|_| {});
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id().to_string(), format!("#{}", a.id().get()));
    }
}
