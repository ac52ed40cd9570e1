//! Threading primitives shared by the build and query pipelines.
//!
//! - [`WorkQueue`]: fixed-size worker pool with an unbounded task queue
//! - [`MultiReaderLock`]: reader/writer lock that favours waiting writers
//! - [`CompletionBarrier`]: pending-work counter used to join a fan-out
//!
//! Both pipelines compose them the same way: every unit of work is counted on
//! the barrier *before* it is handed to the queue, and uncounted by a
//! [`PendingGuard`] when it finishes. Shared state is only touched through a
//! `MultiReaderLock`.
pub mod barrier;
pub mod lock;
pub mod work_queue;

pub use barrier::{CompletionBarrier, PendingGuard};
pub use lock::MultiReaderLock;
pub use work_queue::WorkQueue;
