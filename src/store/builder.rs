use super::store::Store;

/// Change-detection predicate: `true` means "unchanged".
pub(crate) type Equality<T> = Box<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// Configuration for a [`Store`].
///
/// ```
/// use std::sync::Arc;
/// use watchbox::Store;
///
/// let store = Store::builder(Arc::new(vec![1, 2]))
///     .name("items")
///     .equality(Arc::ptr_eq)
///     .build();
///
/// assert_eq!(store.name(), Some("items"));
/// ```
pub struct StoreBuilder<T> {
    initial: T,
    name: Option<String>,
    equality: Equality<T>,
}

impl<T: PartialEq + 'static> StoreBuilder<T> {
    /// Builder that detects changes with `PartialEq`.
    pub fn new(initial: T) -> Self {
        Self::with_equality(initial, |current: &T, candidate: &T| current == candidate)
    }
}

impl<T: 'static> StoreBuilder<T> {
    /// Builder for types without `PartialEq`, or that want a different rule.
    pub fn with_equality<F>(initial: T, equality: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Self {
            initial,
            name: None,
            equality: Box::new(equality),
        }
    }

    /// Label the store in log records.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the change-detection rule.
    pub fn equality<F>(mut self, equality: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.equality = Box::new(equality);
        self
    }
}

impl<T: Clone> StoreBuilder<T> {
    /// Create the store.
    pub fn build(self) -> Store<T> {
        Store::from_parts(self.initial, self.equality, self.name)
    }
}
