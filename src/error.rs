//! Error types for watchbox.
//!
//! Store operations themselves are total. The only fallible surface is the
//! checked form of unsubscribing, which reports why a handle had no effect.

use thiserror::Error;

use crate::store::SubscriptionId;

/// Errors reported by [`Unsubscribe::try_unsubscribe`](crate::Unsubscribe::try_unsubscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store has been dropped")]
    Dropped,

    #[error("subscription {0} is not registered")]
    NotSubscribed(SubscriptionId),
}

/// Result alias for fallible store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
