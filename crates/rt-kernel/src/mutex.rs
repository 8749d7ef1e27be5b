//! Timed Mutual Exclusion
//!
//! Mutexes are kernel objects drawn from a fixed budget. Acquisition is always
//! bounded; the returned guard releases the lock on every exit path.

use crate::clock::{TickClock, Ticks};
use crate::error::KernelError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Fixed pool of kernel object slots
#[derive(Debug)]
pub struct KernelObjects {
    max_mutexes: usize,
    mutexes: AtomicUsize,
}

impl KernelObjects {
    /// Create a pool allowing at most `max_mutexes` live mutexes
    pub fn new(max_mutexes: usize) -> Self {
        Self {
            max_mutexes,
            mutexes: AtomicUsize::new(0),
        }
    }

    /// Claim one mutex slot
    pub(crate) fn reserve_mutex(&self) -> Result<(), KernelError> {
        self.mutexes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                (used < self.max_mutexes).then_some(used + 1)
            })
            .map(|_| ())
            .map_err(|_| KernelError::OutOfResources {
                kind: "mutex",
                capacity: self.max_mutexes,
            })
    }

    fn release_mutex(&self) {
        self.mutexes.fetch_sub(1, Ordering::AcqRel);
    }

    /// Number of live mutexes
    pub fn mutexes_in_use(&self) -> usize {
        self.mutexes.load(Ordering::Acquire)
    }
}

/// Mutex whose acquisition waits at most a given number of ticks
#[derive(Debug)]
pub struct TimedMutex<T> {
    inner: Mutex<T>,
    clock: TickClock,
    objects: Arc<KernelObjects>,
}

impl<T> TimedMutex<T> {
    /// Wrap `value`; the caller must already hold a reserved slot in `objects`
    pub(crate) fn new(value: T, clock: TickClock, objects: Arc<KernelObjects>) -> Self {
        Self {
            inner: Mutex::new(value),
            clock,
            objects,
        }
    }

    /// Acquire the lock, giving up after `timeout` ticks
    pub async fn acquire(&self, timeout: Ticks) -> Result<MutexGuard<'_, T>, KernelError> {
        if let Ok(guard) = self.inner.try_lock() {
            return Ok(guard);
        }
        let wait = self.clock.ticks_to_duration(timeout);
        match tokio::time::timeout(wait, self.inner.lock()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                debug!("Mutex acquisition timed out after {} ticks", timeout);
                Err(KernelError::LockTimeout(timeout))
            }
        }
    }
}

impl<T> Drop for TimedMutex<T> {
    fn drop(&mut self) {
        self.objects.release_mutex();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(max: usize) -> (TickClock, Arc<KernelObjects>) {
        (TickClock::new(100).unwrap(), Arc::new(KernelObjects::new(max)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_uncontended_acquire() {
        let (clock, objects) = fixture(1);
        objects.reserve_mutex().unwrap();
        let mutex = TimedMutex::new(5u16, clock, objects);

        let mut guard = mutex.acquire(5).await.unwrap();
        *guard += 1;
        drop(guard);
        assert_eq!(*mutex.acquire(0).await.unwrap(), 6);
        assert_eq!(clock.now(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_contended_acquire_times_out() {
        let (clock, objects) = fixture(1);
        objects.reserve_mutex().unwrap();
        let mutex = TimedMutex::new(0u16, clock, objects);

        let _held = mutex.acquire(5).await.unwrap();
        let err = mutex.acquire(5).await.unwrap_err();
        assert_eq!(err, KernelError::LockTimeout(5));
        assert_eq!(clock.now(), 5);
    }

    #[test]
    fn test_budget_exhaustion_and_release() {
        let (clock, objects) = fixture(1);
        objects.reserve_mutex().unwrap();
        assert!(matches!(
            objects.reserve_mutex(),
            Err(KernelError::OutOfResources { kind: "mutex", capacity: 1 })
        ));

        drop(TimedMutex::new((), clock, objects.clone()));
        assert_eq!(objects.mutexes_in_use(), 0);
        assert!(objects.reserve_mutex().is_ok());
    }
}
