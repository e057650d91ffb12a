//! # Watchbox
//!
//! A small observable value store for Rust.
//!
//! A [`Store<T>`] holds a single value and calls its subscribers
//! synchronously whenever that value changes:
//! - `subscribe` registers a callback and calls it once right away
//! - `set`, `update`, `modify` and `reset` change the value, notifying only
//!   when the new value differs from the old one
//! - `get` and `with` read the current value
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use watchbox::Store;
//!
//! let store = Store::new(2);
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&seen);
//! let unsubscribe = store.subscribe(move |v| sink.lock().unwrap().push(*v));
//!
//! store.update(|x| x + 3);
//! unsubscribe.unsubscribe();
//! store.set(10);
//!
//! assert_eq!(*seen.lock().unwrap(), vec![2, 5]);
//! ```

pub mod error;
pub mod store;

// Re-export main types for convenience
pub use error::StoreError;
pub use store::{Store, StoreBuilder, SubscriptionGuard, SubscriptionId, Unsubscribe};
