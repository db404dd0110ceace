//! This module contains logically private things that must be technically public
//! because they are accessed from macro-generated code.

use std::cell::RefCell;

use crate::Pool;

/// Re-export so we can use it via macros in projects that do not have a reference to `paste`.
pub use ::paste::paste;

/// The thread-local storage behind each [`thread_local_pool!`][crate::thread_local_pool]
/// declaration. Empty until the owning thread first accesses the pool.
pub type PoolSlot<T> = RefCell<Option<Pool<T>>>;

/// Creates an empty slot. Used in the `const` initializer of the generated thread-local.
#[must_use]
pub const fn empty_slot<T>() -> PoolSlot<T> {
    RefCell::new(None)
}
