//! Ready-made element constructors for common element shapes.
//!
//! Each function here is stateless and coerces to [`Constructor`][crate::Constructor], so it can
//! be passed straight to [`Pool::new()`][crate::Pool::new] or used in a
//! [`thread_local_pool!`][crate::thread_local_pool] declaration. Pair them with [`drop`] as the
//! destructor.

use crate::{Error, Result};

/// Allocates a zero-filled byte buffer of `SIZE` bytes.
///
/// # Errors
///
/// Returns [`Error::Reserve`] if the buffer cannot be allocated.
///
/// # Example
///
/// ```
/// use reuse_pool::{Pool, fixed_buffer};
///
/// let mut pool = Pool::new(4, fixed_buffer::<512>, drop)?;
///
/// let buffer = pool.get()?;
/// assert_eq!(buffer.len(), 512);
/// # pool.release(buffer);
/// # Ok::<(), reuse_pool::Error>(())
/// ```
pub fn fixed_buffer<const SIZE: usize>() -> Result<Box<[u8]>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(SIZE)
        .map_err(|source| Error::Reserve {
            requested: SIZE,
            source,
        })?;

    buffer.resize(SIZE, 0);

    Ok(buffer.into_boxed_slice())
}

/// Allocates the default value of `T` on the heap.
///
/// Boxing keeps each element at a stable address, so a recycled element is the very same
/// allocation that was released.
///
/// # Errors
///
/// This constructor does not fail; the `Result` exists to match [`Constructor`][crate::Constructor].
///
/// # Example
///
/// ```
/// use reuse_pool::{Pool, boxed_default};
///
/// let mut pool = Pool::new(4, boxed_default::<String>, drop)?;
///
/// let name = pool.get()?;
/// assert!(name.is_empty());
/// # pool.release(name);
/// # Ok::<(), reuse_pool::Error>(())
/// ```
#[allow(
    clippy::unnecessary_wraps,
    reason = "signature must match the Constructor function type"
)]
pub fn boxed_default<T: Default>() -> Result<Box<T>> {
    Ok(Box::default())
}
