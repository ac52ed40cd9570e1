use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, trace, warn};

use crate::config::ThreadCount;
use crate::errors::{IndexError, IndexResult};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of worker threads fed by an unbounded task queue.
///
/// [`execute`](Self::execute) never blocks the caller. Completion of the
/// submitted work is not tracked here; pair the queue with a
/// [`CompletionBarrier`](super::CompletionBarrier) to wait for it.
///
/// A task that panics is logged and its worker keeps serving the queue.
pub struct WorkQueue {
    sender: Mutex<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    size: usize,
}

impl WorkQueue {
    /// Starts `threads` workers waiting for tasks.
    pub fn new(threads: ThreadCount) -> IndexResult<Self> {
        let size = threads.get();
        let (sender, receiver) = unbounded::<Job>();

        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("wordindex-worker-{id}"))
                .spawn(move || worker_loop(id, receiver))
                .map_err(IndexError::WorkerSpawn)?;
            workers.push(handle);
        }

        debug!("Started work queue with {} workers", size);
        Ok(Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            size,
        })
    }

    /// Queues `task` for asynchronous execution. Ignored with a warning after shutdown.
    pub fn execute<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.lock();
        match sender.as_ref() {
            Some(sender) => {
                if sender.send(Box::new(task)).is_err() {
                    warn!("All workers have exited; dropping task");
                }
            }
            None => warn!("Work queue is shut down; ignoring new task"),
        }
    }

    /// Stops accepting work and waits for the workers to drain the queue and exit.
    ///
    /// Safe to call more than once.
    pub fn shutdown(&self) {
        // Dropping the only sender wakes every idle worker
        if self.sender.lock().take().is_none() {
            return;
        }

        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        let current = thread::current().id();
        for handle in workers {
            if handle.thread().id() == current {
                // Shutdown requested from a task; this worker exits on its own
                continue;
            }
            if handle.join().is_err() {
                error!("Worker thread terminated abnormally");
            }
        }
        debug!("Work queue shut down");
    }

    /// Number of worker threads
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_shutdown(&self) -> bool {
        self.sender.lock().is_none()
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(id: usize, receiver: Receiver<Job>) {
    trace!("Worker {} started", id);
    // recv fails once the sender is gone and the queue is empty
    while let Ok(job) = receiver.recv() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            error!("Task panicked on worker {}: {}", id, panic_message(&*payload));
        }
    }
    trace!("Worker {} exiting", id);
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrent::CompletionBarrier;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_runs_all_tasks() {
        let queue = WorkQueue::new(ThreadCount::new(4)).unwrap();
        let barrier = Arc::new(CompletionBarrier::new());
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..100 {
            let guard = barrier.enter();
            let counter = Arc::clone(&counter);
            queue.execute(move || {
                let _guard = guard;
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        barrier.await_zero();
        assert_eq!(counter.load(Ordering::SeqCst), 100);
        queue.shutdown();
    }

    #[test]
    fn test_size_is_clamped() {
        assert_eq!(WorkQueue::new(ThreadCount::new(3)).unwrap().size(), 3);
        assert_eq!(WorkQueue::new(ThreadCount::new(0)).unwrap().size(), 5);
        assert_eq!(WorkQueue::new(ThreadCount::new(64)).unwrap().size(), 5);
    }

    #[test]
    fn test_workers_are_named() {
        let queue = WorkQueue::new(ThreadCount::new(2)).unwrap();
        let barrier = Arc::new(CompletionBarrier::new());
        let names = Arc::new(Mutex::new(HashSet::new()));

        for _ in 0..2 {
            let guard = barrier.enter();
            let names = Arc::clone(&names);
            queue.execute(move || {
                let _guard = guard;
                thread::sleep(Duration::from_millis(50));
                let name = thread::current().name().map(str::to_string);
                names.lock().insert(name);
            });
        }

        barrier.await_zero();
        let names = names.lock();
        assert!(names
            .iter()
            .all(|n| n.as_deref().is_some_and(|n| n.starts_with("wordindex-worker-"))));
    }

    #[test]
    fn test_panicking_task_does_not_kill_worker() {
        let queue = WorkQueue::new(ThreadCount::new(1)).unwrap();
        let barrier = Arc::new(CompletionBarrier::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let guard = barrier.enter();
        queue.execute(move || {
            let _guard = guard;
            panic!("boom");
        });

        for _ in 0..3 {
            let guard = barrier.enter();
            let counter = Arc::clone(&counter);
            queue.execute(move || {
                let _guard = guard;
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        barrier.await_zero();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_tasks_can_submit_tasks() {
        let queue = Arc::new(WorkQueue::new(ThreadCount::new(2)).unwrap());
        let barrier = Arc::new(CompletionBarrier::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let parent_guard = barrier.enter();
        {
            let queue_handle = Arc::clone(&queue);
            let barrier = Arc::clone(&barrier);
            let counter = Arc::clone(&counter);
            queue.execute(move || {
                let _guard = parent_guard;
                for _ in 0..10 {
                    let guard = barrier.enter();
                    let counter = Arc::clone(&counter);
                    queue_handle.execute(move || {
                        let _guard = guard;
                        counter.fetch_add(1, Ordering::SeqCst);
                    });
                }
            });
        }

        barrier.await_zero();
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        queue.shutdown();
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let queue = WorkQueue::new(ThreadCount::new(1)).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            let counter = Arc::clone(&counter);
            queue.execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        queue.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn test_execute_after_shutdown_is_ignored() {
        let queue = WorkQueue::new(ThreadCount::new(2)).unwrap();
        queue.shutdown();
        assert!(queue.is_shutdown());

        let counter = Arc::new(AtomicUsize::new(0));
        let task_counter = Arc::clone(&counter);
        queue.execute(move || {
            task_counter.fetch_add(1, Ordering::SeqCst);
        });
        queue.shutdown();

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
