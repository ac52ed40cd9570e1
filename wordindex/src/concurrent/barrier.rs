use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use tracing::{error, trace};

/// Pending-work counter that lets a caller wait for a whole fan-out to finish.
///
/// Work is counted when it is *created*, before it reaches a pool, and
/// uncounted when it finishes running. A task may create child tasks before
/// it finishes, so the counter only reaches zero once the entire task graph
/// is done.
///
/// ```rust,ignore
/// let guard = barrier.enter();          // counted before submission
/// pool.execute(move || {
///     let _guard = guard;               // uncounted when the task ends, even on panic
///     // ... may enter() and submit children ...
/// });
/// barrier.await_zero();
/// ```
#[derive(Debug, Default)]
pub struct CompletionBarrier {
    pending: Mutex<usize>,
    zero: Condvar,
}

impl CompletionBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one more unit of outstanding work.
    pub fn increment(&self) {
        let mut pending = self.pending.lock();
        *pending += 1;
        trace!("Pending work: {}", *pending);
    }

    /// Marks one unit of work finished, waking waiters when none is left.
    pub fn decrement(&self) {
        let mut pending = self.pending.lock();
        if *pending == 0 {
            error!("Completion barrier decremented with no pending work");
            return;
        }
        *pending -= 1;
        trace!("Pending work: {}", *pending);
        if *pending == 0 {
            self.zero.notify_all();
        }
    }

    /// Blocks until no work is pending. Returns at once if nothing was ever counted.
    pub fn await_zero(&self) {
        let mut pending = self.pending.lock();
        while *pending > 0 {
            trace!("Waiting on {} pending tasks", *pending);
            self.zero.wait(&mut pending);
        }
    }

    /// Current number of outstanding units of work
    pub fn pending(&self) -> usize {
        *self.pending.lock()
    }

    /// Increments and returns a guard that decrements when dropped.
    pub fn enter(self: &Arc<Self>) -> PendingGuard {
        self.increment();
        PendingGuard {
            barrier: Arc::clone(self),
        }
    }
}

/// One counted unit of work; dropping it marks the work finished.
#[must_use = "dropping the guard immediately marks the work finished"]
#[derive(Debug)]
pub struct PendingGuard {
    barrier: Arc<CompletionBarrier>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.barrier.decrement();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_await_zero_without_work() {
        let barrier = CompletionBarrier::new();
        barrier.await_zero();
        assert_eq!(barrier.pending(), 0);
    }

    #[test]
    fn test_counts_up_and_down() {
        let barrier = CompletionBarrier::new();
        barrier.increment();
        barrier.increment();
        assert_eq!(barrier.pending(), 2);
        barrier.decrement();
        assert_eq!(barrier.pending(), 1);
        barrier.decrement();
        barrier.await_zero();
    }

    #[test]
    fn test_extra_decrement_saturates() {
        let barrier = CompletionBarrier::new();
        barrier.decrement();
        assert_eq!(barrier.pending(), 0);
        barrier.increment();
        assert_eq!(barrier.pending(), 1);
    }

    #[test]
    fn test_guard_decrements_on_drop() {
        let barrier = Arc::new(CompletionBarrier::new());
        let guard = barrier.enter();
        assert_eq!(barrier.pending(), 1);
        drop(guard);
        assert_eq!(barrier.pending(), 0);
    }

    #[test]
    fn test_guard_decrements_on_panic() {
        let barrier = Arc::new(CompletionBarrier::new());
        let guard = barrier.enter();
        let handle = thread::spawn(move || {
            let _guard = guard;
            panic!("task failed");
        });
        assert!(handle.join().is_err());
        barrier.await_zero();
    }

    fn fan_out(barrier: Arc<CompletionBarrier>, done: Arc<AtomicUsize>, depth: usize) {
        let guard = barrier.enter();
        let child_barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            let _guard = guard;
            thread::sleep(Duration::from_millis(5));
            if depth > 0 {
                fan_out(Arc::clone(&child_barrier), Arc::clone(&done), depth - 1);
                fan_out(child_barrier, Arc::clone(&done), depth - 1);
            }
            done.fetch_add(1, Ordering::SeqCst);
        });
    }

    #[test]
    fn test_waits_for_recursive_fan_out() {
        let barrier = Arc::new(CompletionBarrier::new());
        let done = Arc::new(AtomicUsize::new(0));

        fan_out(Arc::clone(&barrier), Arc::clone(&done), 3);
        barrier.await_zero();

        // 1 + 2 + 4 + 8 tasks in a binary tree of depth 3
        assert_eq!(done.load(Ordering::SeqCst), 15);
        assert_eq!(barrier.pending(), 0);
    }
}
