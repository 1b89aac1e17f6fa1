//! # Reader-preference read-write lock
//!
//! Two mutexes and a counter:
//! - `count_mutex` - serializes every change of `readers`
//! - `resource_gate` - the exclusivity token. A writer holds it alone,
//!   the reader pool holds it together: the first reader locks it, the last one unlocks it.
//!
//! ```text
//! acquire_read:  lock count_mutex -> readers += 1 -> if readers == 1 { lock gate } -> unlock count_mutex
//! release_read:  lock count_mutex -> readers -= 1 -> if readers == 0 { unlock gate } -> unlock count_mutex
//! acquire_write: lock gate
//! release_write: unlock gate
//! ```
//!
//! Note that the first reader waits for the gate while still holding `count_mutex`,
//! so the readers coming after it queue up on `count_mutex` behind it.
//!
//! ## Fairness
//! None, on purpose. Readers are preferred: as long as a new reader shows up before the last one leaves,
//! the gate stays with the reader pool and a waiting writer can starve forever.
//!
//! ## Failure
//! Whoever stops between an acquire and its release (a panic, a forgotten release) leaves the gate locked.
//! Every later writer, and every later "first reader", blocks forever. Nothing detects or recovers that.
//!
//! [ReaderPreferenceGate] is the bare protocol, [PriorityRwLock] glues it to a value with guards.

use std::{
    cell::UnsafeCell,
    mem,
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering::Relaxed},
};

use tracing::trace;

use crate::primitives::{Mutex, RawMutex};

pub struct ReaderPreferenceGate {
    count_mutex: Mutex<()>,
    readers: AtomicUsize, // only modified under count_mutex, atomic to peek at it without locking
    resource_gate: RawMutex,
    writer: AtomicBool, // set only while a writer holds resource_gate
}

impl ReaderPreferenceGate {
    pub const fn new() -> Self {
        Self {
            count_mutex: Mutex::new(()),
            readers: AtomicUsize::new(0),
            resource_gate: RawMutex::new(),
            writer: AtomicBool::new(false),
        }
    }

    /// Enters the reader pool, blocks while a writer holds the gate.
    /// Returns the number of readers including this one, 1 means this call locked the gate.
    pub fn acquire_read(&self) -> usize {
        let _count = self.count_mutex.lock();
        let readers = self.readers.load(Relaxed) + 1;
        self.readers.store(readers, Relaxed);
        if readers == 1 {
            trace!("first reader, locking the resource gate");
            self.resource_gate.lock();
        }
        readers
    }

    /// Leaves the reader pool. Returns the number of readers left, 0 means this call unlocked the gate.
    ///
    /// # Panics
    /// - if there're no readers to release
    pub fn release_read(&self) -> usize {
        let _count = self.count_mutex.lock();
        let readers = self.readers.load(Relaxed);
        assert!(readers > 0, "release_read without a matching acquire_read");
        self.readers.store(readers - 1, Relaxed);
        if readers == 1 {
            trace!("last reader, unlocking the resource gate");
            self.resource_gate.unlock();
        }
        readers - 1
    }

    /// Blocks until there's no reader and no other writer
    pub fn acquire_write(&self) {
        self.resource_gate.lock();
        self.writer.store(true, Relaxed);
        trace!("writer holds the resource gate");
    }

    /// # Panics
    /// - if the gate isn't locked
    pub fn release_write(&self) {
        trace!("writer releases the resource gate");
        self.writer.store(false, Relaxed);
        self.resource_gate.unlock();
    }

    /// A snapshot: readers counted in, including a first reader still waiting for the gate
    pub fn reader_count(&self) -> usize {
        self.readers.load(Relaxed)
    }

    /// A snapshot: a writer holds the gate. Readers waiting behind it don't change the answer.
    pub fn is_write_locked(&self) -> bool {
        self.writer.load(Relaxed)
    }
}

impl Default for ReaderPreferenceGate {
    fn default() -> Self {
        Self::new()
    }
}

/// [ReaderPreferenceGate] + the value it protects
pub struct PriorityRwLock<Y> {
    gate: ReaderPreferenceGate,
    value: UnsafeCell<Y>,
}

/// Many readers may see &Y from different threads at once => Y: Sync on top of Send
unsafe impl<Y> Sync for PriorityRwLock<Y> where Y: Send + Sync {}

impl<Y> PriorityRwLock<Y> {
    pub const fn new(value: Y) -> Self {
        Self {
            gate: ReaderPreferenceGate::new(),
            value: UnsafeCell::new(value),
        }
    }

    pub fn read(&self) -> ReadGuard<'_, Y> {
        let readers = self.gate.acquire_read();
        ReadGuard {
            lock: self,
            first: readers == 1,
        }
    }

    pub fn write(&self) -> WriteGuard<'_, Y> {
        self.gate.acquire_write();
        WriteGuard { lock: self }
    }

    pub fn reader_count(&self) -> usize {
        self.gate.reader_count()
    }

    pub fn is_write_locked(&self) -> bool {
        self.gate.is_write_locked()
    }

    /// &mut self proves there're no guards around
    pub fn get_mut(&mut self) -> &mut Y {
        self.value.get_mut()
    }

    pub fn into_inner(self) -> Y {
        self.value.into_inner()
    }
}

impl<Y: Default> Default for PriorityRwLock<Y> {
    fn default() -> Self {
        Self::new(Y::default())
    }
}

pub struct ReadGuard<'a, Y> {
    lock: &'a PriorityRwLock<Y>,
    first: bool,
}

impl<Y> ReadGuard<'_, Y> {
    /// This reader locked the gate for the pool
    pub fn is_first(&self) -> bool {
        self.first
    }

    /// Same as dropping the guard, but tells how many readers are left.
    /// 0 means this reader was the last one and unlocked the gate.
    pub fn release(self) -> usize {
        let gate = &self.lock.gate;
        mem::forget(self);
        gate.release_read()
    }
}

impl<Y> Deref for ReadGuard<'_, Y> {
    type Target = Y;
    fn deref(&self) -> &Self::Target {
        // SAFETY: the reader pool holds the gate => no writer around
        unsafe { &*self.lock.value.get() }
    }
}

impl<Y> Drop for ReadGuard<'_, Y> {
    fn drop(&mut self) {
        self.lock.gate.release_read();
    }
}

pub struct WriteGuard<'a, Y> {
    lock: &'a PriorityRwLock<Y>,
}

impl<Y> Deref for WriteGuard<'_, Y> {
    type Target = Y;
    fn deref(&self) -> &Self::Target {
        // SAFETY: we hold the gate alone
        unsafe { &*self.lock.value.get() }
    }
}

impl<Y> DerefMut for WriteGuard<'_, Y> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: we hold the gate alone
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<Y> Drop for WriteGuard<'_, Y> {
    fn drop(&mut self) {
        self.lock.gate.release_write();
    }
}
