//! Readers-preferred read/write gate around the shared cache.
//!
//! Built the way a textbook readers/writers solution is built from raw
//! primitives: one semaphore acting as the writer's exclusion gate and a
//! plain counter tracking how many readers currently hold it open. The
//! first reader in acquires the gate on the writers' behalf; the last
//! reader out releases it. Writers never have to poll — they just wait on
//! the same gate readers hold.
//!
//! This favors readers over writers, matching a cache workload: lookups
//! vastly outnumber inserts and an occasional delayed writer is an
//! acceptable cost for never blocking a reader behind another reader.

use std::cell::UnsafeCell;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Semaphore, SemaphorePermit};

struct Inner<T> {
    data: UnsafeCell<T>,
    gate: Semaphore,
    readers: Mutex<usize>,
}

// SAFETY: every access to `data` happens behind either a held read permit
// (shared access, never concurrent with a writer) or the write permit
// (exclusive access). The `Mutex<usize>` and `Semaphore` together make
// entering and leaving the reader set atomic with respect to the gate.
unsafe impl<T: Send> Sync for Inner<T> {}

/// A readers-preferred lock around `T`.
pub struct RwGate<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for RwGate<T> {
    fn clone(&self) -> Self {
        RwGate {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> RwGate<T> {
    pub fn new(data: T) -> Self {
        RwGate {
            inner: Arc::new(Inner {
                data: UnsafeCell::new(data),
                gate: Semaphore::new(1),
                readers: Mutex::new(0),
            }),
        }
    }

    /// Acquire shared read access. Blocks only behind an active writer.
    pub async fn read(&self) -> ReadGuard<'_, T> {
        let is_first = {
            let mut count = self.inner.readers.lock();
            *count += 1;
            *count == 1
        };
        if is_first {
            // first reader in: close the gate against writers on our behalf
            std::mem::forget(
                self.inner
                    .gate
                    .acquire()
                    .await
                    .expect("gate semaphore never closed"),
            );
        }
        ReadGuard { gate: self }
    }

    /// Acquire exclusive write access. Blocks behind every reader and
    /// writer currently holding the gate.
    pub async fn write(&self) -> WriteGuard<'_, T> {
        let permit = self
            .inner
            .gate
            .acquire()
            .await
            .expect("gate semaphore never closed");
        WriteGuard {
            gate: self,
            _permit: permit,
        }
    }
}

pub struct ReadGuard<'a, T> {
    gate: &'a RwGate<T>,
}

impl<T> std::ops::Deref for ReadGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        // SAFETY: held readers exclude writers via the gate semaphore.
        unsafe { &*self.gate.inner.data.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        let mut count = self.gate.inner.readers.lock();
        *count -= 1;
        if *count == 0 {
            // last reader out: reopen the gate for waiting writers
            self.gate.inner.gate.add_permits(1);
        }
    }
}

pub struct WriteGuard<'a, T> {
    gate: &'a RwGate<T>,
    _permit: SemaphorePermit<'a>,
}

impl<T> std::ops::Deref for WriteGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.gate.inner.data.get() }
    }
}

impl<T> std::ops::DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the held permit excludes every reader and every other
        // writer from touching `data`.
        unsafe { &mut *self.gate.inner.data.get() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_sees_update() {
        let gate = RwGate::new(0u32);
        {
            let mut w = gate.write().await;
            *w = 42;
        }
        let r = gate.read().await;
        assert_eq!(*r, 42);
    }

    #[tokio::test]
    async fn concurrent_readers_do_not_block_each_other() {
        let gate = RwGate::new(vec![1, 2, 3]);
        let r1 = gate.read().await;
        let r2 = gate.read().await;
        assert_eq!(r1.len(), 3);
        assert_eq!(r2.len(), 3);
    }

    #[tokio::test]
    async fn writer_waits_for_readers_to_drain() {
        let gate = RwGate::new(0u32);
        let r = gate.read().await;
        drop(r);
        let mut w = gate.write().await;
        *w += 1;
        assert_eq!(*w, 1);
    }
}
