//! # Mutex
//!
//! The state is a u32 so it works with wait & wake:
//! - 0 - unlocked
//! - 1 - locked, no other threads
//! - 2 - locked, other threads may be waiting
//!
//! Both lock and unlock avoid syscalls when there's no contention:
//! `wait` only happens after a short spin, `wake_one` only if someone announced itself with 2.
//!
//! The lock isn't bound to a thread. [RawMutex::unlock] may come from a thread other than the
//! one that locked it, which is what the reader pool needs: the first reader locks the resource gate,
//! the last one (whoever it is) unlocks it.

use std::{
    cell::UnsafeCell,
    ops::{Deref, DerefMut},
    sync::atomic::{
        AtomicU32,
        Ordering::{Acquire, Relaxed, Release},
    },
};

use atomic_wait::{wait, wake_one};

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;
const CONTENDED: u32 = 2;

/// The channel's cursor lock and the reader count lock are held for an index bump or a counter update,
/// a few dozen cycles. 100 spins outlast that. The resource gate is held for a whole read or write,
/// there the spin is just a short delay before the futex wait.
const SPIN_LIMIT: u32 = 100;

/// A bare lock, nothing to protect but itself
#[derive(Debug)]
pub struct RawMutex {
    state: AtomicU32,
}

impl RawMutex {
    pub const fn new() -> Self {
        Self {
            state: AtomicU32::new(UNLOCKED),
        }
    }

    /// Blocks until the lock is ours
    pub fn lock(&self) {
        if self
            .state
            .compare_exchange(UNLOCKED, LOCKED, Acquire, Relaxed)
            .is_err()
        {
            Self::lock_contended(&self.state);
        }
    }

    pub fn try_lock(&self) -> bool {
        self.state
            .compare_exchange(UNLOCKED, LOCKED, Acquire, Relaxed)
            .is_ok()
    }

    /// - spin up to [SPIN_LIMIT] while the holder finishes its short critical section
    /// - then go to sleep with state 2 so the unlocker knows to wake us up
    #[cold]
    fn lock_contended(state: &AtomicU32) {
        // a sleeper already marked the lock as 2 => the holder is a long one, don't bother spinning
        for _ in 0..SPIN_LIMIT {
            if state.load(Relaxed) != LOCKED {
                break;
            }
            std::hint::spin_loop();
        }

        if state
            .compare_exchange(UNLOCKED, LOCKED, Acquire, Relaxed)
            .is_ok()
        {
            return;
        }

        // leaves 2 behind even if we're the only waiter: we can't tell
        while state.swap(CONTENDED, Acquire) != UNLOCKED {
            wait(state, CONTENDED);
        }
    }

    /// Releases the lock, any thread may call it.
    ///
    /// # Panics
    /// - if the mutex isn't locked
    pub fn unlock(&self) {
        let previous = self.state.swap(UNLOCKED, Release);
        assert_ne!(previous, UNLOCKED, "unlock of an unlocked mutex");
        if previous == CONTENDED {
            wake_one(&self.state);
        }
    }

    /// A snapshot, may be stale by the time it's returned
    pub fn is_locked(&self) -> bool {
        self.state.load(Relaxed) != UNLOCKED
    }
}

impl Default for RawMutex {
    fn default() -> Self {
        Self::new()
    }
}

/// [RawMutex] + a value it guards
pub struct Mutex<Y> {
    raw: RawMutex,
    value: UnsafeCell<Y>,
}

/// promise to the compiler that it's safe to share if the underlying value is safe to send
unsafe impl<Y> Sync for Mutex<Y> where Y: Send {}

impl<Y> Mutex<Y> {
    pub const fn new(value: Y) -> Self {
        Self {
            raw: RawMutex::new(),
            value: UnsafeCell::new(value),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Y> {
        self.raw.lock();
        MutexGuard { mutex: self }
    }

    /// &mut self proves nobody else holds the lock
    pub fn get_mut(&mut self) -> &mut Y {
        self.value.get_mut()
    }

    pub fn into_inner(self) -> Y {
        self.value.into_inner()
    }
}

impl<Y: Default> Default for Mutex<Y> {
    fn default() -> Self {
        Self::new(Y::default())
    }
}

/// Guard is the only way to reach the value and to unlock the mutex
pub struct MutexGuard<'a, Y> {
    mutex: &'a Mutex<Y>,
}

unsafe impl<Y> Sync for MutexGuard<'_, Y> where Y: Sync {}

impl<Y> Deref for MutexGuard<'_, Y> {
    type Target = Y;
    fn deref(&self) -> &Self::Target {
        // SAFETY: existence of the guard means the mutex is locked by us
        unsafe { &*self.mutex.value.get() }
    }
}

impl<Y> DerefMut for MutexGuard<'_, Y> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: existence of the guard means the mutex is locked by us
        unsafe { &mut *self.mutex.value.get() }
    }
}

impl<Y> Drop for MutexGuard<'_, Y> {
    fn drop(&mut self) {
        self.mutex.raw.unlock();
    }
}

#[cfg(test)]
mod test {
    use std::{
        sync::atomic::{AtomicBool, AtomicUsize},
        thread::{scope, sleep},
        time::{Duration, Instant},
    };

    use super::*;

    #[test]
    fn test_mutex_counts_without_losing_updates() {
        let m = Mutex::new(0usize);
        scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..5_000 {
                        *m.lock() += 1;
                    }
                });
            }
        });
        assert_eq!(m.into_inner(), 20_000);
    }

    #[test]
    fn test_mutex_is_exclusive() {
        let m = Mutex::new(());
        let inside = AtomicUsize::new(0);
        scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..500 {
                        let _g = m.lock();
                        assert_eq!(inside.fetch_add(1, Relaxed), 0, "two holders at once");
                        std::hint::spin_loop();
                        inside.fetch_sub(1, Relaxed);
                    }
                });
            }
        });
    }

    #[test]
    fn test_raw_mutex_unlocked_by_another_thread() {
        let m = RawMutex::new();
        m.lock();
        assert!(m.is_locked());
        assert!(!m.try_lock());

        let acquired = AtomicBool::new(false);
        scope(|s| {
            // blocks until the other thread unlocks
            s.spawn(|| {
                m.lock();
                acquired.store(true, Release);
            });
            sleep(Duration::from_millis(100));
            assert!(!acquired.load(Acquire));
            s.spawn(|| m.unlock());
        });
        assert!(acquired.load(Acquire));
        assert!(m.is_locked());
        m.unlock();
        assert!(!m.is_locked());
    }

    #[test]
    fn test_contended_lock_wakes_up() {
        let m = Mutex::new(Vec::new());
        let start = Instant::now();
        scope(|s| {
            let g = m.lock();
            for i in 0..3 {
                let m = &m;
                s.spawn(move || m.lock().push(i));
            }
            // long enough for every waiter to run out of spins and sleep
            sleep(Duration::from_millis(50));
            drop(g);
        });
        // the last sleeper left 2 behind, its unlock still brings the state back to 0
        assert!(!m.raw.is_locked());
        let mut v = m.into_inner();
        v.sort();
        assert_eq!(v, [0, 1, 2]);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    #[should_panic(expected = "unlock of an unlocked mutex")]
    fn test_unlock_unlocked_panics() {
        RawMutex::new().unlock();
    }
}
