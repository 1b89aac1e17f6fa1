//! # Counting semaphore
//!
//! A non-negative counter of permits:
//! - [Semaphore::acquire] blocks until the counter is above 0, then takes one
//! - [Semaphore::release] puts one back and wakes one waiter
//!
//! The counter itself is the futex word, so a waiter sleeps on "the counter is still 0".
//! A release between our load and `wait` changes the value and `wait` returns right away => no lost wake-ups.
//!
//! Memory ordering: release is Release, successful acquire is Acquire.
//! That's the happens-before the bounded channel relies on: whatever was written before `release`
//! is visible after the matching `acquire`.

use std::sync::atomic::{
    AtomicU32,
    Ordering::{Acquire, Relaxed, Release},
};

use atomic_wait::{wait, wake_one};
use tracing::trace;

use crate::error::{Error, Result};

/// The largest count a semaphore can hold, same as SEM_VALUE_MAX on Linux
pub const MAX_PERMITS: usize = i32::MAX as usize;

#[derive(Debug)]
pub struct Semaphore {
    permits: AtomicU32,
}

impl Semaphore {
    /// # Errors
    /// - [Error::Initialization] if `permits` is above [MAX_PERMITS]
    pub fn new(permits: usize) -> Result<Self> {
        if permits > MAX_PERMITS {
            return Err(Error::Initialization {
                primitive: "semaphore",
                reason: format!("{permits} permits requested, at most {MAX_PERMITS} allowed"),
            });
        }
        Ok(Self {
            permits: AtomicU32::new(permits as u32),
        })
    }

    /// Takes a permit, sleeps while there're none
    pub fn acquire(&self) {
        let mut n = self.permits.load(Relaxed);
        loop {
            if n == 0 {
                trace!("no permits left, waiting");
                wait(&self.permits, 0);
                n = self.permits.load(Relaxed);
                continue;
            }
            match self
                .permits
                .compare_exchange_weak(n, n - 1, Acquire, Relaxed)
            {
                Ok(_) => return,
                Err(e) => n = e, // somebody was faster, try with the fresh value
            }
        }
    }

    /// Takes a permit if there's one, never blocks
    pub fn try_acquire(&self) -> bool {
        let mut n = self.permits.load(Relaxed);
        while n > 0 {
            match self
                .permits
                .compare_exchange_weak(n, n - 1, Acquire, Relaxed)
            {
                Ok(_) => return true,
                Err(e) => n = e,
            }
        }
        false
    }

    /// Gives a permit back. We can't tell whether anyone sleeps on the counter, so always wake one.
    ///
    /// # Panics
    /// - if the count would go above [MAX_PERMITS]
    pub fn release(&self) {
        let previous = self.permits.fetch_add(1, Release);
        assert!((previous as usize) < MAX_PERMITS, "too many permits!");
        wake_one(&self.permits);
    }

    /// A snapshot of the count, may be stale by the time it's returned
    pub fn available(&self) -> usize {
        self.permits.load(Relaxed) as usize
    }
}
