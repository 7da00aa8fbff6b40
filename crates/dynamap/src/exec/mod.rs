//! Execution strategies.
//!
//! Both strategies run operations on the connection's worker pool. The
//! blocking one is the non-blocking one followed by [`DbFuture::wait`], so
//! the two never diverge in behavior.

mod blocking;
mod future;
mod nonblocking;

pub use blocking::Blocking;
pub use future::DbFuture;
pub use nonblocking::NonBlocking;
