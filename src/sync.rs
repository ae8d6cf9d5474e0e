//! Reader/writer locking for shared stores
//!
//! [`GraphLock`] owns the protected value and hands out RAII tokens:
//! any number of concurrent read tokens, or one write token. The classic
//! lock-upgrade deadlock (acquiring the write lock while the same thread
//! holds a read token) is detected structurally and fails fast with
//! [`GraphError::WriteWhileReading`] instead of blocking forever. Reentrant
//! reads on one thread are allowed and accumulate; each token releases its
//! own hold on drop, so escaping an iteration early is just dropping the
//! token.
//!
//! Embedded single-threaded callers use
//! [`GraphStore`](crate::graph::GraphStore) directly and pay no locking
//! overhead at all: the borrow checker enforces the same discipline at
//! compile time.

use crate::error::{GraphError, GraphResult};
use crate::graph::GraphStore;
use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

thread_local! {
    /// Per-thread hold bookkeeping: (lock address, read depth, write held)
    static HOLDS: RefCell<Vec<(usize, usize, bool)>> = RefCell::new(Vec::new());
}

fn with_entry<R>(addr: usize, f: impl FnOnce(&mut (usize, usize, bool)) -> R) -> R {
    HOLDS.with(|holds| {
        let mut holds = holds.borrow_mut();
        if let Some(index) = holds.iter().position(|entry| entry.0 == addr) {
            let result = f(&mut holds[index]);
            if holds[index].1 == 0 && !holds[index].2 {
                holds.swap_remove(index);
            }
            result
        } else {
            let mut entry = (addr, 0, false);
            let result = f(&mut entry);
            if entry.1 > 0 || entry.2 {
                holds.push(entry);
            }
            result
        }
    })
}

fn read_depth(addr: usize) -> usize {
    HOLDS.with(|holds| {
        holds
            .borrow()
            .iter()
            .find(|entry| entry.0 == addr)
            .map_or(0, |entry| entry.1)
    })
}

fn write_held(addr: usize) -> bool {
    HOLDS.with(|holds| {
        holds
            .borrow()
            .iter()
            .find(|entry| entry.0 == addr)
            .is_some_and(|entry| entry.2)
    })
}

/// A reader/writer lock owning the value it protects
#[derive(Debug, Default)]
pub struct GraphLock<T> {
    data: RwLock<T>,
}

impl<T> GraphLock<T> {
    pub fn new(value: T) -> Self {
        GraphLock {
            data: RwLock::new(value),
        }
    }

    fn addr(&self) -> usize {
        self as *const Self as *const u8 as usize
    }

    /// Acquire a shared read token; blocks while a writer is active
    ///
    /// Reentrant reads on the same thread are fine. Fails fast with
    /// [`GraphError::LockReentry`] if this thread already holds the write
    /// token (which already grants read access).
    pub fn read(&self) -> GraphResult<ReadToken<'_, T>> {
        let addr = self.addr();
        if write_held(addr) {
            return Err(GraphError::LockReentry);
        }
        with_entry(addr, |entry| entry.1 += 1);
        match self.data.read() {
            Ok(guard) => Ok(ReadToken { guard, addr }),
            Err(_) => {
                with_entry(addr, |entry| entry.1 -= 1);
                Err(GraphError::LockPoisoned)
            }
        }
    }

    /// Acquire the exclusive write token; blocks until all readers on
    /// other threads are gone
    ///
    /// Fails fast with [`GraphError::WriteWhileReading`] if this thread
    /// holds a read token, and with [`GraphError::LockReentry`] if it
    /// already holds the write token.
    pub fn write(&self) -> GraphResult<WriteToken<'_, T>> {
        let addr = self.addr();
        if read_depth(addr) > 0 {
            return Err(GraphError::WriteWhileReading);
        }
        if write_held(addr) {
            return Err(GraphError::LockReentry);
        }
        with_entry(addr, |entry| entry.2 = true);
        match self.data.write() {
            Ok(guard) => Ok(WriteToken { guard, addr }),
            Err(_) => {
                with_entry(addr, |entry| entry.2 = false);
                Err(GraphError::LockPoisoned)
            }
        }
    }

    /// Exclusive access without locking, for sole owners
    pub fn get_mut(&mut self) -> GraphResult<&mut T> {
        self.data.get_mut().map_err(|_| GraphError::LockPoisoned)
    }

    pub fn into_inner(self) -> GraphResult<T> {
        self.data.into_inner().map_err(|_| GraphError::LockPoisoned)
    }
}

/// Shared read hold; dropping it releases the hold
pub struct ReadToken<'a, T> {
    guard: RwLockReadGuard<'a, T>,
    addr: usize,
}

impl<T> Deref for ReadToken<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> Drop for ReadToken<'_, T> {
    fn drop(&mut self) {
        with_entry(self.addr, |entry| entry.1 -= 1);
    }
}

/// Exclusive write hold; dropping it releases the lock
pub struct WriteToken<'a, T> {
    guard: RwLockWriteGuard<'a, T>,
    addr: usize,
}

impl<T> Deref for WriteToken<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for WriteToken<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for WriteToken<'_, T> {
    fn drop(&mut self) {
        with_entry(self.addr, |entry| entry.2 = false);
    }
}

/// A graph store shared across threads behind a [`GraphLock`]
///
/// Every operation goes through a token: `read()` for queries and
/// iteration (the token is held for the whole lifetime of any iterator
/// borrowed from it), `write()` for structural mutation. Clones share the
/// same underlying store.
#[derive(Clone, Default)]
pub struct SharedGraph {
    inner: Arc<GraphLock<GraphStore>>,
}

impl SharedGraph {
    pub fn new(store: GraphStore) -> Self {
        SharedGraph {
            inner: Arc::new(GraphLock::new(store)),
        }
    }

    /// Shared read access; hold the token for the duration of any
    /// iteration and drop it before writing from the same thread
    pub fn read(&self) -> GraphResult<ReadToken<'_, GraphStore>> {
        self.inner.read()
    }

    /// Exclusive write access
    pub fn write(&self) -> GraphResult<WriteToken<'_, GraphStore>> {
        self.inner.write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_read_then_write_same_thread_fails_fast() {
        let lock = GraphLock::new(1);
        let token = lock.read().unwrap();
        assert_eq!(*token, 1);
        assert!(matches!(lock.write(), Err(GraphError::WriteWhileReading)));
        drop(token);
        let mut token = lock.write().unwrap();
        *token = 2;
        drop(token);
        assert_eq!(*lock.read().unwrap(), 2);
    }

    #[test]
    fn test_reentrant_reads_accumulate_and_release() {
        let lock = GraphLock::new(7);
        let outer = lock.read().unwrap();
        let inner = lock.read().unwrap();
        assert!(matches!(lock.write(), Err(GraphError::WriteWhileReading)));
        drop(inner);
        // One hold remains.
        assert!(matches!(lock.write(), Err(GraphError::WriteWhileReading)));
        drop(outer);
        assert!(lock.write().is_ok());
    }

    #[test]
    fn test_write_reentry_fails_fast() {
        let lock = GraphLock::new(0);
        let token = lock.write().unwrap();
        assert!(matches!(lock.write(), Err(GraphError::LockReentry)));
        assert!(matches!(lock.read(), Err(GraphError::LockReentry)));
        drop(token);
        assert!(lock.read().is_ok());
    }

    #[test]
    fn test_concurrent_readers() {
        let lock = Arc::new(GraphLock::new(5));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let lock = Arc::clone(&lock);
            handles.push(thread::spawn(move || *lock.read().unwrap()));
        }
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 5);
        }
    }

    #[test]
    fn test_writer_excludes_other_threads() {
        let lock = Arc::new(GraphLock::new(0));
        let token = lock.write().unwrap();

        let contender = Arc::clone(&lock);
        let handle = thread::spawn(move || {
            let mut token = contender.write().unwrap();
            *token += 1;
        });
        // Give the contender a moment to block, then release.
        thread::sleep(std::time::Duration::from_millis(20));
        drop(token);
        handle.join().unwrap();
        assert_eq!(*lock.read().unwrap(), 1);
    }

    #[test]
    fn test_distinct_locks_do_not_interfere() {
        let a = GraphLock::new(1);
        let b = GraphLock::new(2);
        let token = a.read().unwrap();
        // Holding a read on `a` does not poison writes on `b`.
        assert!(b.write().is_ok());
        drop(token);
    }
}
