//! The observable store and the handles it hands out.
//!
//! A [`Store`] owns one value and an ordered list of subscribers. Every
//! accepted change runs one synchronous notification pass; registrations are
//! removed through the [`Unsubscribe`] handle returned by `subscribe`.

mod builder;
mod store;
mod subscription;

pub use builder::StoreBuilder;
pub use store::Store;
pub use subscription::{SubscriptionGuard, SubscriptionId, Unsubscribe};
