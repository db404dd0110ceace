use std::collections::TryReserveError;

use thiserror::Error;

/// Errors that can occur when creating pools or obtaining elements from them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Storage for the requested number of elements could not be reserved.
    ///
    /// Returned when creating a pool whose initial reservation cannot be satisfied and by the
    /// stock constructors in this crate when their allocation fails.
    #[error("failed to reserve storage for {requested} elements")]
    Reserve {
        /// How many elements (or bytes, for byte buffers) the failed reservation was for.
        requested: usize,

        /// The allocator failure reported by the standard library.
        #[source]
        source: TryReserveError,
    },

    /// A user-supplied element constructor was unable to produce an element.
    #[error("element constructor failed: {problem}")]
    Construct {
        /// A human-readable description of the problem.
        problem: String,
    },

    /// The calling thread's private pool has already been torn down because the thread is
    /// terminating.
    #[error("thread-local pool is unavailable because the current thread is terminating")]
    ThreadTerminating,
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
