use std::num::NonZero;

use tracing::{debug, trace};

use crate::{Error, PoolBuilder, PoolStats, Result};

/// A stateless function that produces one new element for a [`Pool`].
///
/// Called whenever the pool has no retained element to hand out. The function may allocate and
/// may fail; failures are propagated to the caller of [`Pool::get()`].
pub type Constructor<T> = fn() -> Result<T>;

/// A stateless function that releases the resources of one element owned by a [`Pool`].
///
/// The pool calls it at most once per element: when an element is released into a pool that is
/// already at its retention ceiling, and for every retained element when the pool is destroyed.
/// Use [`drop`] if the element needs no cleanup beyond its own `Drop` implementation.
pub type Destructor<T> = fn(T);

/// A pool of reusable elements of type `T` that recycles released elements instead of
/// destroying them.
///
/// Elements are obtained via [`get()`][1] and handed back via [`release()`][2]. Released elements
/// are kept on a free list and handed out again by later calls to [`get()`][1], with the most
/// recently released element reused first. Only when the free list is empty is the constructor
/// called to produce a new element.
///
/// # Capacity
///
/// Two numbers govern the pool's memory use:
///
/// * The initial capacity is the number of free list entries reserved when the pool is created.
///   It avoids reallocating the free list in the common case but does not limit anything.
/// * The maximum capacity is the retention ceiling. A pool that already retains this many
///   elements destroys any further released element immediately. Without a ceiling the pool
///   retains everything it is given until it is destroyed.
///
/// # Ownership
///
/// Each element is owned either by the pool or by a caller, never by both: [`get()`][1] moves
/// the element out of the pool and [`release()`][2] moves it back in. Elements the caller still
/// holds when the pool is destroyed are not touched by the pool.
///
/// # Thread safety
///
/// The pool has no internal synchronization; every mutating operation requires `&mut self`.
/// To give each thread its own pool, declare a registry with
/// [`thread_local_pool!`][crate::thread_local_pool].
///
/// # Example
///
/// ```
/// use reuse_pool::{Pool, boxed_default};
///
/// let mut pool = Pool::new_limited(2, 2, boxed_default::<[u8; 32]>, drop)?;
///
/// let a = pool.get()?;
/// let a_address = &raw const *a;
/// pool.release(a);
///
/// // The released element is handed out again instead of allocating a new one.
/// let b = pool.get()?;
/// assert_eq!(&raw const *b, a_address);
/// # pool.release(b);
/// # Ok::<(), reuse_pool::Error>(())
/// ```
///
/// [1]: Self::get
/// [2]: Self::release
pub struct Pool<T> {
    /// Retained elements, used as a stack. The last element is the next one handed out.
    elements: Vec<T>,

    initial_capacity: usize,

    /// `None` means retention is unbounded.
    max_capacity: Option<NonZero<usize>>,

    constructor: Constructor<T>,
    destructor: Destructor<T>,

    stats: PoolStats,
}

impl<T> std::fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field(
                "element_type",
                &std::format_args!("{}", std::any::type_name::<T>()),
            )
            .field("len", &self.elements.len())
            .field("initial_capacity", &self.initial_capacity)
            .field("max_capacity", &self.max_capacity)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<T> Pool<T> {
    pub(crate) fn new_inner(
        initial_capacity: usize,
        max_capacity: Option<NonZero<usize>>,
        constructor: Constructor<T>,
        destructor: Destructor<T>,
    ) -> Result<Self> {
        let mut elements = Vec::new();
        elements
            .try_reserve_exact(initial_capacity)
            .map_err(|source| Error::Reserve {
                requested: initial_capacity,
                source,
            })?;

        if max_capacity.is_some_and(|max_capacity| max_capacity.get() < initial_capacity) {
            debug!(
                initial_capacity,
                ?max_capacity,
                element_type = std::any::type_name::<T>(),
                "pool reserves more storage than it will ever retain"
            );
        }

        Ok(Self {
            elements,
            initial_capacity,
            max_capacity,
            constructor,
            destructor,
            stats: PoolStats::default(),
        })
    }

    /// Creates a pool with unbounded retention that reserves free list storage for
    /// `initial_capacity` elements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Reserve`] if the free list storage cannot be reserved.
    ///
    /// # Example
    ///
    /// ```
    /// use reuse_pool::{Pool, fixed_buffer};
    ///
    /// let pool = Pool::new(8, fixed_buffer::<1024>, drop)?;
    ///
    /// assert!(pool.is_empty());
    /// assert_eq!(pool.max_capacity(), None);
    /// # Ok::<(), reuse_pool::Error>(())
    /// ```
    pub fn new(
        initial_capacity: usize,
        constructor: Constructor<T>,
        destructor: Destructor<T>,
    ) -> Result<Self> {
        Self::builder(constructor, destructor)
            .initial_capacity(initial_capacity)
            .build()
    }

    /// Creates a pool that reserves free list storage for `initial_capacity` elements and
    /// retains at most `max_capacity` released elements at a time.
    ///
    /// A `max_capacity` of zero means retention is unbounded, same as [`new()`][Self::new].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Reserve`] if the free list storage cannot be reserved.
    ///
    /// # Example
    ///
    /// ```
    /// use reuse_pool::{Pool, boxed_default};
    ///
    /// let mut pool = Pool::new_limited(1, 1, boxed_default::<u32>, drop)?;
    ///
    /// let a = pool.get()?;
    /// let b = pool.get()?;
    ///
    /// pool.release(a);
    /// pool.release(b); // The pool is full, so this one is destroyed immediately.
    ///
    /// assert_eq!(pool.len(), 1);
    /// assert_eq!(pool.stats().discarded, 1);
    /// # Ok::<(), reuse_pool::Error>(())
    /// ```
    pub fn new_limited(
        initial_capacity: usize,
        max_capacity: usize,
        constructor: Constructor<T>,
        destructor: Destructor<T>,
    ) -> Result<Self> {
        Self::builder(constructor, destructor)
            .initial_capacity(initial_capacity)
            .max_capacity(max_capacity)
            .build()
    }

    /// Starts building a new [`Pool`] that uses the given element constructor and destructor.
    ///
    /// # Example
    ///
    /// ```
    /// use reuse_pool::{Pool, boxed_default};
    ///
    /// let pool = Pool::builder(boxed_default::<String>, drop)
    ///     .initial_capacity(4)
    ///     .max_capacity(16)
    ///     .build()?;
    ///
    /// assert_eq!(pool.len(), 0);
    /// # Ok::<(), reuse_pool::Error>(())
    /// ```
    pub fn builder(constructor: Constructor<T>, destructor: Destructor<T>) -> PoolBuilder<T> {
        PoolBuilder::new(constructor, destructor)
    }

    /// Obtains an element from the pool.
    ///
    /// Returns the most recently released element if the pool retains any. Otherwise calls the
    /// constructor to produce a new one. Either way, the caller becomes the owner of the element
    /// and is expected to hand it back via [`release()`][Self::release] when done.
    ///
    /// # Errors
    ///
    /// Returns whatever error the constructor returns if a new element was needed and the
    /// constructor failed. The pool is unchanged in that case.
    ///
    /// # Example
    ///
    /// ```
    /// use reuse_pool::{Pool, boxed_default};
    ///
    /// let mut pool = Pool::new(2, boxed_default::<Vec<u8>>, drop)?;
    ///
    /// let mut buffer = pool.get()?;
    /// buffer.extend_from_slice(b"hello");
    /// pool.release(buffer);
    ///
    /// // Elements are not reset by the pool; that is up to the caller.
    /// let buffer = pool.get()?;
    /// assert_eq!(buffer.as_slice(), b"hello");
    /// # pool.release(buffer);
    /// # Ok::<(), reuse_pool::Error>(())
    /// ```
    pub fn get(&mut self) -> Result<T> {
        if let Some(element) = self.elements.pop() {
            self.stats.record_reused();
            return Ok(element);
        }

        let element = (self.constructor)()?;
        self.stats.record_constructed();

        Ok(element)
    }

    /// Hands an element back to the pool.
    ///
    /// If the pool is below its retention ceiling (or has none), the element is retained and
    /// will be handed out by a later [`get()`][Self::get]. Otherwise the destructor is called on
    /// the element immediately.
    ///
    /// The element should have been obtained from this pool. Any value of type `T` is accepted,
    /// though, and simply joins the free list.
    ///
    /// # Example
    ///
    /// ```
    /// use reuse_pool::{Pool, boxed_default};
    ///
    /// let mut pool = Pool::new(1, boxed_default::<u64>, drop)?;
    ///
    /// let value = pool.get()?;
    /// assert!(pool.is_empty());
    ///
    /// pool.release(value);
    /// assert_eq!(pool.len(), 1);
    /// # Ok::<(), reuse_pool::Error>(())
    /// ```
    pub fn release(&mut self, element: T) {
        if self.is_full() {
            self.discard(element, "retention ceiling reached");
            return;
        }

        // A free list that cannot grow cannot retain the element either.
        if self.elements.try_reserve(1).is_err() {
            self.discard(element, "free list storage could not grow");
            return;
        }

        self.elements.push(element);
        self.stats.record_recycled();
    }

    /// Destroys the pool, calling the destructor once for every retained element, most recently
    /// released first, and then freeing the free list storage.
    ///
    /// Elements obtained from the pool that have not been released are not affected; they
    /// remain owned by whoever holds them. Dropping the pool has the same effect as calling
    /// this method.
    ///
    /// # Example
    ///
    /// ```
    /// use reuse_pool::{Pool, boxed_default};
    ///
    /// let mut pool = Pool::new(2, boxed_default::<u64>, drop)?;
    ///
    /// let kept = pool.get()?;
    /// let returned = pool.get()?;
    /// pool.release(returned);
    ///
    /// pool.destroy();
    ///
    /// // Still ours to use.
    /// assert_eq!(*kept, 0);
    /// # Ok::<(), reuse_pool::Error>(())
    /// ```
    pub fn destroy(self) {
        drop(self);
    }

    /// The number of released elements the pool currently retains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the pool currently retains no elements, meaning the next
    /// [`get()`][Self::get] will call the constructor.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The number of elements the pool reserved free list storage for when it was created.
    #[must_use]
    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    /// The retention ceiling, or `None` if retention is unbounded.
    #[must_use]
    pub fn max_capacity(&self) -> Option<NonZero<usize>> {
        self.max_capacity
    }

    /// The number of elements the free list can hold without reallocating its storage.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Allocator may over-reserve, so only lower bounds are testable.
    pub fn reserved_capacity(&self) -> usize {
        self.elements.capacity()
    }

    /// Usage counters accumulated since the pool was created.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    fn is_full(&self) -> bool {
        self.max_capacity
            .is_some_and(|max_capacity| self.elements.len() >= max_capacity.get())
    }

    fn discard(&mut self, element: T, reason: &'static str) {
        trace!(
            retained = self.elements.len(),
            element_type = std::any::type_name::<T>(),
            reason,
            "destroying released element instead of retaining it"
        );

        (self.destructor)(element);
        self.stats.record_discarded();
    }
}

impl<T> Drop for Pool<T> {
    fn drop(&mut self) {
        let retained = self.elements.len();

        while let Some(element) = self.elements.pop() {
            (self.destructor)(element);
        }

        debug!(
            retained,
            constructed = self.stats.constructed,
            reused = self.stats.reused,
            discarded = self.stats.discarded,
            element_type = std::any::type_name::<T>(),
            "pool destroyed"
        );
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::fmt::Debug;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(Pool<Box<u64>>: Send, Sync, Debug);
    assert_not_impl_any!(Pool<std::rc::Rc<u64>>: Send, Sync);

    // Every test runs on its own thread, so thread-local counters keep tests isolated.
    thread_local! {
        static CONSTRUCTED: Cell<usize> = const { Cell::new(0) };
        static DESTROYED: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
        static FAIL_NEXT_CONSTRUCT: Cell<bool> = const { Cell::new(false) };
    }

    type Element = Box<u64>;

    fn construct() -> Result<Element> {
        if FAIL_NEXT_CONSTRUCT.replace(false) {
            return Err(Error::Construct {
                problem: "simulated failure".to_string(),
            });
        }

        CONSTRUCTED.set(CONSTRUCTED.get() + 1);
        Ok(Box::new(0))
    }

    fn destruct(element: Element) {
        DESTROYED.with_borrow_mut(|destroyed| destroyed.push(address_of(&element)));
    }

    fn address_of(element: &Element) -> usize {
        (&raw const **element).addr()
    }

    fn constructed() -> usize {
        CONSTRUCTED.get()
    }

    fn destroyed() -> Vec<usize> {
        DESTROYED.with_borrow(Clone::clone)
    }

    #[test]
    fn smoke_test() {
        let mut pool = Pool::new(4, construct, destruct).unwrap();

        assert!(pool.is_empty());
        assert_eq!(pool.len(), 0);

        let mut element = pool.get().unwrap();
        *element = 42;
        pool.release(element);

        assert_eq!(pool.len(), 1);

        let element = pool.get().unwrap();
        assert_eq!(*element, 42);
        assert_eq!(constructed(), 1);

        pool.release(element);
        pool.destroy();

        assert_eq!(destroyed().len(), 1);
    }

    #[test]
    fn constructor_called_only_on_misses() {
        let mut pool = Pool::new(0, construct, destruct).unwrap();

        let a = pool.get().unwrap();
        let b = pool.get().unwrap();
        pool.release(a);
        let c = pool.get().unwrap();
        let d = pool.get().unwrap();
        pool.release(b);
        pool.release(c);
        pool.release(d);
        let e = pool.get().unwrap();

        // Five gets, two of them served from the free list.
        let stats = pool.stats();
        assert_eq!(constructed(), 3);
        assert_eq!(stats.constructed, 3);
        assert_eq!(stats.reused, 2);
        assert_eq!(stats.recycled, 4);
        assert_eq!(stats.discarded, 0);
        assert_eq!(pool.len(), 2);

        pool.release(e);
    }

    #[test]
    fn reuse_is_last_in_first_out() {
        let mut pool = Pool::new(2, construct, destruct).unwrap();

        let a = pool.get().unwrap();
        let b = pool.get().unwrap();
        let a_address = address_of(&a);
        let b_address = address_of(&b);

        pool.release(b);
        pool.release(a);

        let first = pool.get().unwrap();
        let second = pool.get().unwrap();

        assert_eq!(address_of(&first), a_address);
        assert_eq!(address_of(&second), b_address);

        pool.release(first);
        pool.release(second);
    }

    #[test]
    fn reused_element_is_pointer_identical() {
        let mut pool = Pool::new(1, construct, destruct).unwrap();

        let element = pool.get().unwrap();
        let address = address_of(&element);
        pool.release(element);

        let element = pool.get().unwrap();
        assert_eq!(address_of(&element), address);
        assert_eq!(constructed(), 1);

        pool.release(element);
    }

    #[test]
    fn ceiling_destroys_overflowing_release() {
        const CEILING: usize = 3;

        let mut pool = Pool::new_limited(CEILING, CEILING, construct, destruct).unwrap();

        let elements = (0..=CEILING)
            .map(|_| pool.get().unwrap())
            .collect::<Vec<_>>();
        let last_address = address_of(elements.last().unwrap());

        for element in elements {
            pool.release(element);
        }

        assert_eq!(pool.len(), CEILING);
        assert_eq!(destroyed(), vec![last_address]);
        assert_eq!(pool.stats().discarded, 1);
        assert_eq!(pool.stats().recycled, CEILING as u64);
    }

    #[test]
    fn destroy_only_touches_retained_elements() {
        let mut pool = Pool::new(4, construct, destruct).unwrap();

        let held = pool.get().unwrap();
        let a = pool.get().unwrap();
        let b = pool.get().unwrap();
        let a_address = address_of(&a);
        let b_address = address_of(&b);

        pool.release(a);
        pool.release(b);
        pool.destroy();

        // Most recently released first.
        assert_eq!(destroyed(), vec![b_address, a_address]);
        assert_eq!(*held, 0);
    }

    #[test]
    fn dropping_pool_destroys_retained_elements() {
        {
            let mut pool = Pool::new(2, construct, destruct).unwrap();
            let element = pool.get().unwrap();
            pool.release(element);
        }

        assert_eq!(destroyed().len(), 1);
    }

    #[test]
    fn limited_pool_scenario() {
        let mut pool = Pool::new_limited(2, 2, construct, destruct).unwrap();

        let a = pool.get().unwrap();
        let b = pool.get().unwrap();
        let c = pool.get().unwrap();
        assert_eq!(constructed(), 3);

        let a_address = address_of(&a);
        let b_address = address_of(&b);
        let c_address = address_of(&c);

        pool.release(a);
        pool.release(b);
        assert_eq!(pool.len(), 2);
        assert!(destroyed().is_empty());

        pool.release(c);
        assert_eq!(pool.len(), 2);
        assert_eq!(destroyed(), vec![c_address]);

        pool.destroy();
        assert_eq!(destroyed(), vec![c_address, b_address, a_address]);
    }

    #[test]
    fn zero_max_capacity_is_unbounded() {
        let mut pool = Pool::new_limited(0, 0, construct, destruct).unwrap();

        let elements = (0..10).map(|_| pool.get().unwrap()).collect::<Vec<_>>();
        for element in elements {
            pool.release(element);
        }

        assert_eq!(pool.len(), 10);
        assert!(destroyed().is_empty());
    }

    #[test]
    fn ceiling_below_initial_capacity_is_accepted() {
        let mut pool = Pool::new_limited(8, 2, construct, destruct).unwrap();

        assert!(pool.reserved_capacity() >= 8);

        let elements = (0..4).map(|_| pool.get().unwrap()).collect::<Vec<_>>();
        for element in elements {
            pool.release(element);
        }

        assert_eq!(pool.len(), 2);
        assert_eq!(destroyed().len(), 2);
    }

    #[test]
    fn constructor_failure_propagates() {
        let mut pool = Pool::new(1, construct, destruct).unwrap();

        FAIL_NEXT_CONSTRUCT.set(true);
        let result = pool.get();
        assert!(matches!(result, Err(Error::Construct { .. })));
        assert_eq!(pool.stats().constructed, 0);

        // The failure is not sticky.
        let element = pool.get().unwrap();
        pool.release(element);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn constructor_failure_does_not_consume_retained_elements() {
        let mut pool = Pool::new(1, construct, destruct).unwrap();

        let element = pool.get().unwrap();
        pool.release(element);

        // The retained element is used, so the constructor is never asked.
        FAIL_NEXT_CONSTRUCT.set(true);
        let element = pool.get().unwrap();
        assert_eq!(constructed(), 1);

        pool.release(element);
        FAIL_NEXT_CONSTRUCT.set(false);
    }

    #[test]
    fn foreign_element_joins_free_list() {
        let mut pool = Pool::new(1, construct, destruct).unwrap();

        let foreign = Box::new(99);
        pool.release(foreign);

        assert_eq!(*pool.get().unwrap(), 99);
        assert_eq!(constructed(), 0);
    }

    #[test]
    fn inspection_reports_configuration() {
        let pool = Pool::new_limited(3, 5, construct, destruct).unwrap();

        assert_eq!(pool.initial_capacity(), 3);
        assert_eq!(pool.max_capacity(), NonZero::new(5));
        assert!(pool.reserved_capacity() >= 3);

        let output = format!("{pool:?}");
        assert!(output.contains("initial_capacity"));
        assert!(output.contains("u64"));
    }
}
