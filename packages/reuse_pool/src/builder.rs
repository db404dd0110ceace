use std::num::NonZero;

use crate::{Constructor, Destructor, Pool, Result};

/// Builder for creating an instance of [`Pool`].
///
/// The constructor and destructor are mandatory and given up front. Both capacity settings
/// default to zero, which means nothing is reserved in advance and retention is unbounded.
///
/// # Examples
///
/// ```
/// use reuse_pool::{Pool, fixed_buffer};
///
/// let pool = Pool::builder(fixed_buffer::<4096>, drop)
///     .initial_capacity(16)
///     .max_capacity(64)
///     .build()?;
///
/// assert_eq!(pool.initial_capacity(), 16);
/// assert_eq!(pool.max_capacity().map(|max| max.get()), Some(64));
/// # Ok::<(), reuse_pool::Error>(())
/// ```
#[must_use]
pub struct PoolBuilder<T> {
    initial_capacity: usize,
    max_capacity: Option<NonZero<usize>>,
    constructor: Constructor<T>,
    destructor: Destructor<T>,
}

impl<T> std::fmt::Debug for PoolBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolBuilder")
            .field(
                "element_type",
                &std::format_args!("{}", std::any::type_name::<T>()),
            )
            .field("initial_capacity", &self.initial_capacity)
            .field("max_capacity", &self.max_capacity)
            .finish_non_exhaustive()
    }
}

impl<T> PoolBuilder<T> {
    pub(crate) fn new(constructor: Constructor<T>, destructor: Destructor<T>) -> Self {
        Self {
            initial_capacity: 0,
            max_capacity: None,
            constructor,
            destructor,
        }
    }

    /// Sets how many elements the pool reserves free list storage for when it is created.
    ///
    /// This is a hint to avoid reallocation in the common case, not a limit on retention.
    pub fn initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Sets the maximum number of released elements the pool retains at the same time.
    ///
    /// Elements released while the pool already retains this many are destroyed immediately.
    /// Zero means retention is unbounded, which is the default.
    ///
    /// A ceiling smaller than the initial capacity is accepted; the surplus reservation is
    /// simply never used.
    pub fn max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = NonZero::new(max_capacity);
        self
    }

    /// Builds the pool with the specified configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Reserve`][crate::Error::Reserve] if storage for the initial capacity
    /// cannot be reserved.
    pub fn build(self) -> Result<Pool<T>> {
        Pool::new_inner(
            self.initial_capacity,
            self.max_capacity,
            self.constructor,
            self.destructor,
        )
    }

    /// Calls the configured constructor directly, without creating a pool.
    pub(crate) fn construct(&self) -> Result<T> {
        (self.constructor)()
    }

    /// Calls the configured destructor directly, without creating a pool.
    pub(crate) fn destruct(&self, element: T) {
        (self.destructor)(element);
    }
}
