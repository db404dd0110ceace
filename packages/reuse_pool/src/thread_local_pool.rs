use std::thread::{self, LocalKey};

use tracing::trace;

use crate::__private::PoolSlot;
use crate::{Error, Pool, PoolBuilder, Result};

/// A registry that gives every thread its own private [`Pool<T>`].
///
/// Instances of this type are created by the [`thread_local_pool!` macro][1], never directly by
/// user code. The pool of a thread is created on the first access from that thread, using the
/// builder expression from the macro declaration, and is destroyed automatically when the thread
/// terminates. No pool is ever shared between threads, so elements obtained on one thread never
/// show up in the free list of another.
///
/// # Example
///
/// ```
/// use reuse_pool::{Pool, fixed_buffer, thread_local_pool};
///
/// thread_local_pool! {
///     static SCRATCH: Box<[u8]> = Pool::builder(fixed_buffer::<1024>, drop)
///         .initial_capacity(4)
///         .max_capacity(16);
/// }
///
/// let buffer = SCRATCH.get()?;
/// assert_eq!(buffer.len(), 1024);
/// SCRATCH.release(buffer);
///
/// assert_eq!(SCRATCH.with(|pool| pool.len())?, 1);
///
/// std::thread::spawn(|| {
///     // Every thread starts with an empty pool of its own.
///     assert_eq!(SCRATCH.with(|pool| pool.len()).unwrap(), 0);
/// })
/// .join()
/// .unwrap();
/// # Ok::<(), reuse_pool::Error>(())
/// ```
///
/// [1]: crate::thread_local_pool
pub struct ThreadLocalPool<T: 'static> {
    slot: fn() -> &'static LocalKey<PoolSlot<T>>,
    configure: fn() -> PoolBuilder<T>,
}

impl<T: 'static> std::fmt::Debug for ThreadLocalPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadLocalPool")
            .field(
                "element_type",
                &std::format_args!("{}", std::any::type_name::<T>()),
            )
            .finish_non_exhaustive()
    }
}

impl<T: 'static> ThreadLocalPool<T> {
    /// Note: this function exists to serve the inner workings of the
    /// `thread_local_pool!` macro and should not be used directly.
    /// It is not part of the public API and may be removed or changed at any time.
    // Only ever called in const context by macros. Coverage instrumentation
    // cannot detect const context execution.
    #[cfg_attr(coverage_nightly, coverage(off))]
    #[doc(hidden)]
    #[must_use]
    pub const fn new(
        slot: fn() -> &'static LocalKey<PoolSlot<T>>,
        configure: fn() -> PoolBuilder<T>,
    ) -> Self {
        Self { slot, configure }
    }

    /// Executes a closure with the current thread's pool, creating the pool first if this is the
    /// first access from the current thread.
    ///
    /// # Errors
    ///
    /// Returns the error from [`PoolBuilder::build()`] if the pool had to be created and that
    /// failed. The thread is left without a pool, so the next call tries again.
    ///
    /// Returns [`Error::ThreadTerminating`] if the current thread's pool has already been
    /// destroyed as part of thread shutdown.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a closure that is itself executing against the same
    /// registry on the same thread.
    ///
    /// # Example
    ///
    /// ```
    /// use reuse_pool::{Pool, boxed_default, thread_local_pool};
    ///
    /// thread_local_pool!(static CONTEXTS: Box<Vec<u8>> = Pool::builder(boxed_default, drop));
    ///
    /// let (first, second) = CONTEXTS.with(|pool| -> reuse_pool::Result<_> {
    ///     Ok((pool.get()?, pool.get()?))
    /// })??;
    ///
    /// CONTEXTS.with(|pool| {
    ///     pool.release(first);
    ///     pool.release(second);
    /// })?;
    /// # Ok::<(), reuse_pool::Error>(())
    /// ```
    pub fn with<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Pool<T>) -> R,
    {
        match (self.slot)().try_with(|slot| self.with_slot(slot, f)) {
            Ok(result) => result,
            Err(_access_error) => Err(Error::ThreadTerminating),
        }
    }

    /// Obtains an element from the current thread's pool.
    ///
    /// See [`Pool::get()`]. If the current thread is already shutting down and its pool is gone,
    /// the element is produced by calling the constructor directly.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool had to be created and that failed, or if a new element was
    /// needed and the constructor failed.
    ///
    /// # Panics
    ///
    /// Panics on re-entrant access, see [`with()`][Self::with].
    pub fn get(&self) -> Result<T> {
        match self.with(Pool::get) {
            Ok(result) => result,
            Err(Error::ThreadTerminating) => (self.configure)().construct(),
            Err(error) => Err(error),
        }
    }

    /// Hands an element back to the current thread's pool.
    ///
    /// See [`Pool::release()`]. If the pool cannot be reached, either because the thread is
    /// shutting down or because creating the pool failed, the element is destroyed immediately.
    ///
    /// # Panics
    ///
    /// Panics on re-entrant access, see [`with()`][Self::with].
    pub fn release(&self, element: T) {
        let mut element = Some(element);

        // The closure does not run if the pool cannot be reached, leaving the element with us.
        let outcome = self.with(|pool| {
            if let Some(element) = element.take() {
                pool.release(element);
            }
        });

        if let Err(error) = outcome {
            if let Some(element) = element.take() {
                trace!(
                    %error,
                    element_type = std::any::type_name::<T>(),
                    "thread-local pool unreachable, destroying released element"
                );

                (self.configure)().destruct(element);
            }
        }
    }

    /// Whether the current thread has created its pool and still has it.
    ///
    /// # Example
    ///
    /// ```
    /// use reuse_pool::{Pool, boxed_default, thread_local_pool};
    ///
    /// thread_local_pool!(static NUMBERS: Box<u64> = Pool::builder(boxed_default, drop));
    ///
    /// assert!(!NUMBERS.is_initialized());
    ///
    /// let number = NUMBERS.get()?;
    /// assert!(NUMBERS.is_initialized());
    /// # NUMBERS.release(number);
    /// # Ok::<(), reuse_pool::Error>(())
    /// ```
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        (self.slot)()
            .try_with(|slot| {
                // A slot that is borrowed is in use by with(), so the pool exists.
                slot.try_borrow().map_or(true, |slot| slot.is_some())
            })
            .unwrap_or(false)
    }

    fn with_slot<F, R>(&self, slot: &PoolSlot<T>, f: F) -> Result<R>
    where
        F: FnOnce(&mut Pool<T>) -> R,
    {
        let mut slot = slot.borrow_mut();

        if let Some(pool) = slot.as_mut() {
            return Ok(f(pool));
        }

        let pool = slot.insert(self.create_pool()?);
        Ok(f(pool))
    }

    fn create_pool(&self) -> Result<Pool<T>> {
        let pool = (self.configure)().build()?;

        trace!(
            thread = ?thread::current().id(),
            element_type = std::any::type_name::<T>(),
            initial_capacity = pool.initial_capacity(),
            max_capacity = ?pool.max_capacity(),
            "created thread-local pool"
        );

        Ok(pool)
    }
}

/// Declares one or more registries that give every thread its own private [`Pool`].
///
/// Each declaration names the element type and gives an expression that evaluates to a
/// [`PoolBuilder`] for it. The expression is evaluated on each thread's first access, and the
/// pool it builds is destroyed, along with every element it retains, when that thread terminates.
///
/// The declared name is a [`ThreadLocalPool<T>`] through which the current thread's pool is
/// accessed.
///
/// No initialization call is needed at startup: the standard library registers the teardown of
/// each thread's pool when that thread first touches it, so every thread that ever created a
/// pool destroys it exactly once on exit and threads that never touched it have nothing to clean.
///
/// # Example
///
/// ```
/// use reuse_pool::{Pool, boxed_default, fixed_buffer, thread_local_pool};
///
/// thread_local_pool! {
///     static READ_BUFFERS: Box<[u8]> = Pool::builder(fixed_buffer::<4096>, drop)
///         .initial_capacity(8)
///         .max_capacity(32);
///
///     static HEADERS: Box<Vec<(String, String)>> =
///         Pool::builder(boxed_default, drop).max_capacity(128);
/// }
///
/// let buffer = READ_BUFFERS.get()?;
/// let headers = HEADERS.get()?;
///
/// READ_BUFFERS.release(buffer);
/// HEADERS.release(headers);
/// # Ok::<(), reuse_pool::Error>(())
/// ```
#[macro_export]
macro_rules! thread_local_pool {
    () => {};

    ($(#[$attr:meta])* $vis:vis static $NAME:ident: $t:ty = $e:expr; $($rest:tt)*) => (
        $crate::thread_local_pool!($(#[$attr])* $vis static $NAME: $t = $e);
        $crate::thread_local_pool!($($rest)*);
    );

    ($(#[$attr:meta])* $vis:vis static $NAME:ident: $t:ty = $e:expr) => {
        $crate::__private::paste! {
            ::std::thread_local!(#[doc(hidden)] static [< $NAME _SLOT >]: $crate::__private::PoolSlot<$t> = const { $crate::__private::empty_slot() });

            $(#[$attr])* $vis const $NAME: $crate::ThreadLocalPool<$t> =
                $crate::ThreadLocalPool::new(move || &[< $NAME _SLOT >], move || $e);
        }
    };
}
