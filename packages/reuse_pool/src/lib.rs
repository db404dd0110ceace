#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! An object pool that recycles same-shaped values instead of destroying and recreating them,
//! plus a per-thread registry that gives every thread a private pool of its own.
//!
//! This crate provides [`Pool<T>`], a single-owner cache of reusable elements. Elements are
//! produced by a user-supplied constructor, handed to callers by [`Pool::get()`] and taken back
//! by [`Pool::release()`]. Released elements are retained and handed out again, most recently
//! released first, so hot call sites that keep creating and discarding buffers, request contexts
//! or similar objects stop paying for an allocation on every use.
//!
//! # Key Features
//!
//! - **Stateless callbacks**: Elements are created and destroyed by plain function pointers
//! - **Two-tier capacity**: An initial reservation for the free list plus an optional retention
//!   ceiling, above which released elements are destroyed immediately
//! - **Move-based ownership**: An element is owned by exactly one party at a time, so double
//!   release and use-after-destroy are rejected by the compiler
//! - **Fallible construction**: Allocation and constructor failures surface as [`Error`] values
//! - **Per-thread pools**: [`thread_local_pool!`] declares a registry whose pools are created
//!   lazily on each thread and destroyed when that thread exits
//! - **Usage statistics**: [`PoolStats`] counts constructions, reuse and discarded releases
//!
//! # Examples
//!
//! ## Single-owner pool
//!
//! ```rust
//! use reuse_pool::{Pool, fixed_buffer};
//!
//! // Reserve room for 4 buffers, never keep more than 8 of them around.
//! let mut pool = Pool::new_limited(4, 8, fixed_buffer::<4096>, drop)?;
//!
//! let mut buffer = pool.get()?;
//! buffer[0] = 0xFF;
//! pool.release(buffer);
//!
//! // The same allocation comes back, contents and all.
//! let buffer = pool.get()?;
//! assert_eq!(buffer[0], 0xFF);
//! assert_eq!(pool.stats().constructed, 1);
//!
//! pool.release(buffer);
//! pool.destroy();
//! # Ok::<(), reuse_pool::Error>(())
//! ```
//!
//! ## Custom constructor and destructor
//!
//! ```rust
//! use reuse_pool::{Error, Pool, Result};
//!
//! struct Connection {
//!     id: u32,
//! }
//!
//! fn open() -> Result<Connection> {
//!     Ok(Connection { id: 7 })
//! }
//!
//! fn close(connection: Connection) {
//!     println!("closing connection {}", connection.id);
//! }
//!
//! let mut pool = Pool::builder(open, close).max_capacity(2).build()?;
//!
//! let connection = pool.get()?;
//! assert_eq!(connection.id, 7);
//! pool.release(connection);
//!
//! // Dropping the pool closes every connection it still retains.
//! drop(pool);
//! # Ok::<(), Error>(())
//! ```
//!
//! ## One pool per thread
//!
//! ```rust
//! use reuse_pool::{Pool, boxed_default, thread_local_pool};
//!
//! #[derive(Default)]
//! struct RequestContext {
//!     headers: Vec<(String, String)>,
//! }
//!
//! thread_local_pool! {
//!     static CONTEXTS: Box<RequestContext> = Pool::builder(boxed_default, drop)
//!         .initial_capacity(16)
//!         .max_capacity(64);
//! }
//!
//! let handles = (0..4)
//!     .map(|_| {
//!         std::thread::spawn(|| {
//!             let mut context = CONTEXTS.get().unwrap();
//!             context.headers.clear();
//!             context.headers.push(("host".to_string(), "example.com".to_string()));
//!             CONTEXTS.release(context);
//!         })
//!     })
//!     .collect::<Vec<_>>();
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! ```

pub mod __private;

mod allocators;
mod builder;
mod error;
mod pool;
mod stats;
mod thread_local_pool;

pub use allocators::*;
pub use builder::*;
pub use error::*;
pub use pool::*;
pub use stats::*;
pub use thread_local_pool::*;
