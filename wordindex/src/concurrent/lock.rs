use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;

/// Multiple-reader/single-writer lock with writer preference.
///
/// Any number of readers may hold the lock while no writer holds it or waits
/// for it. A writer gets in once the readers present have left; readers that
/// arrive while a writer is queued wait behind it, so a steady stream of
/// searches cannot starve a merge.
///
/// Access is scoped: [`read`](Self::read) and [`write`](Self::write) return
/// guards and the lock is released when the guard drops, including during
/// unwinding. The lock is not reentrant. Requesting a write guard while the
/// same thread holds a read guard (or the other way round) deadlocks.
pub struct MultiReaderLock<T> {
    inner: RwLock<T>,
}

impl<T> MultiReaderLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(value),
        }
    }

    /// Blocks until shared access is available.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read()
    }

    /// Blocks until exclusive access is available.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write()
    }

    /// Shared access without blocking; `None` while a writer holds or awaits the lock.
    pub fn try_read(&self) -> Option<RwLockReadGuard<'_, T>> {
        self.inner.try_read()
    }

    /// Exclusive access without blocking.
    pub fn try_write(&self) -> Option<RwLockWriteGuard<'_, T>> {
        self.inner.try_write()
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T: Default> Default for MultiReaderLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for MultiReaderLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiReaderLock")
            .field("write_locked", &self.inner.is_locked_exclusive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_many_readers() {
        let lock = MultiReaderLock::new(7);
        let first = lock.read();
        let second = lock.read();
        assert_eq!(*first + *second, 14);
        assert!(lock.try_write().is_none());
        drop(first);
        drop(second);
        assert!(lock.try_write().is_some());
    }

    #[test]
    fn test_writer_excludes_readers() {
        let lock = MultiReaderLock::new(Vec::<u32>::new());
        {
            let mut guard = lock.write();
            guard.push(1);
            assert!(lock.try_read().is_none());
            assert!(lock.try_write().is_none());
        }
        assert_eq!(*lock.read(), vec![1]);
    }

    #[test]
    fn test_waiting_writer_blocks_new_readers() {
        let lock = Arc::new(MultiReaderLock::new(0u32));
        let reader = lock.read();

        let acquired = Arc::new(AtomicBool::new(false));
        let writer = {
            let lock = Arc::clone(&lock);
            let acquired = Arc::clone(&acquired);
            thread::spawn(move || {
                let mut guard = lock.write();
                acquired.store(true, Ordering::SeqCst);
                *guard += 1;
            })
        };

        // Readers keep getting in until the writer has queued
        let deadline = Instant::now() + Duration::from_secs(10);
        while lock.try_read().is_some() {
            assert!(Instant::now() < deadline, "writer never queued");
            thread::yield_now();
        }

        // The writer is queued behind the held read guard
        assert!(!acquired.load(Ordering::SeqCst));
        assert!(lock.try_read().is_none());

        drop(reader);
        writer.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
        assert_eq!(*lock.read(), 1);
    }

    #[test]
    fn test_guard_released_on_panic() {
        let lock = Arc::new(MultiReaderLock::new(0u32));
        let result = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                let _guard = lock.write();
                panic!("task failed while holding the lock");
            })
            .join()
        };
        assert!(result.is_err());
        assert!(lock.try_write().is_some());
    }
}
